use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::QuestionConfigError;
use crate::model::ids::{SlideId, WineId};

/// Section of a wine's slide run.
///
/// The source data also uses `tasting` for the middle section and
/// `conclusion` for the last one; those collapse onto `DeepDive` and
/// `Ending` at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Intro,
    #[serde(alias = "tasting")]
    DeepDive,
    #[serde(alias = "conclusion")]
    Ending,
}

impl SectionTag {
    /// Display name used by progress indicators.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionTag::Intro => "Introduction",
            SectionTag::DeepDive => "Deep Dive",
            SectionTag::Ending => "Final Thoughts",
        }
    }

    /// All sections in presentation order.
    #[must_use]
    pub fn ordered() -> [SectionTag; 3] {
        [SectionTag::Intro, SectionTag::DeepDive, SectionTag::Ending]
    }
}

/// Content category of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Interlude,
    VideoMessage,
    AudioMessage,
    Question,
    Transition,
}

/// Answer format of a question slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    MultipleChoice,
    Scale,
    Text,
    Boolean,
}

/// Configuration carried by `SlideKind::Question` slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionConfig {
    format: QuestionFormat,
    options: Vec<String>,
    scale_min: i32,
    scale_max: i32,
}

impl QuestionConfig {
    /// Create a question configuration.
    ///
    /// `options` only applies to `MultipleChoice`; the scale range only to
    /// `Scale`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionConfigError::InvalidScaleRange` when `scale_min` is
    /// not strictly below `scale_max`.
    pub fn new(
        format: QuestionFormat,
        options: Vec<String>,
        scale_min: i32,
        scale_max: i32,
    ) -> Result<Self, QuestionConfigError> {
        if scale_min >= scale_max {
            return Err(QuestionConfigError::InvalidScaleRange {
                min: scale_min,
                max: scale_max,
            });
        }
        Ok(Self {
            format,
            options,
            scale_min,
            scale_max,
        })
    }

    /// Conventional 1..=10 scale question.
    #[must_use]
    pub fn scale() -> Self {
        Self {
            format: QuestionFormat::Scale,
            options: Vec::new(),
            scale_min: 1,
            scale_max: 10,
        }
    }

    /// Free-text question.
    #[must_use]
    pub fn text() -> Self {
        Self {
            format: QuestionFormat::Text,
            options: Vec::new(),
            scale_min: 1,
            scale_max: 10,
        }
    }

    #[must_use]
    pub fn format(&self) -> QuestionFormat {
        self.format
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn scale_min(&self) -> i32 {
        self.scale_min
    }

    #[must_use]
    pub fn scale_max(&self) -> i32 {
        self.scale_max
    }
}

/// Where a slide lives in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideOwner {
    /// Package-level slide shown before any wine, ordered globally.
    Package { global_position: u32 },
    /// Slide belonging to one wine, ordered within that wine.
    Wine { wine_id: WineId, position: u32 },
}

impl SlideOwner {
    #[must_use]
    pub fn wine_id(&self) -> Option<WineId> {
        match self {
            SlideOwner::Package { .. } => None,
            SlideOwner::Wine { wine_id, .. } => Some(*wine_id),
        }
    }
}

/// Display payload of a slide; the rendering layer interprets it per kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub media_url: Option<Url>,
    pub question: Option<QuestionConfig>,
}

impl SlideContent {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// One unit of tasting-session content. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    id: SlideId,
    owner: SlideOwner,
    section: Option<SectionTag>,
    kind: SlideKind,
    content: SlideContent,
}

impl Slide {
    #[must_use]
    pub fn new(
        id: SlideId,
        owner: SlideOwner,
        section: Option<SectionTag>,
        kind: SlideKind,
        content: SlideContent,
    ) -> Self {
        Self {
            id,
            owner,
            section,
            kind,
            content,
        }
    }

    #[must_use]
    pub fn id(&self) -> SlideId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> SlideOwner {
        self.owner
    }

    /// The owning wine, if this is not a package-level slide.
    #[must_use]
    pub fn wine_id(&self) -> Option<WineId> {
        self.owner.wine_id()
    }

    /// Explicit section tag, if the source data carries one.
    ///
    /// Most callers want `SlideSequence::section_of`, which applies the
    /// intro default.
    #[must_use]
    pub fn section(&self) -> Option<SectionTag> {
        self.section
    }

    #[must_use]
    pub fn kind(&self) -> SlideKind {
        self.kind
    }

    #[must_use]
    pub fn content(&self) -> &SlideContent {
        &self.content
    }

    #[must_use]
    pub fn is_question(&self) -> bool {
        self.kind == SlideKind::Question
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_range_must_be_increasing() {
        let err = QuestionConfig::new(QuestionFormat::Scale, Vec::new(), 5, 5).unwrap_err();
        assert!(matches!(
            err,
            QuestionConfigError::InvalidScaleRange { min: 5, max: 5 }
        ));
    }

    #[test]
    fn section_aliases_collapse() {
        let tag: SectionTag = serde_json::from_str("\"tasting\"").unwrap();
        assert_eq!(tag, SectionTag::DeepDive);
        let tag: SectionTag = serde_json::from_str("\"conclusion\"").unwrap();
        assert_eq!(tag, SectionTag::Ending);
    }

    #[test]
    fn package_slides_have_no_wine() {
        let slide = Slide::new(
            SlideId::random(),
            SlideOwner::Package { global_position: 0 },
            None,
            SlideKind::Interlude,
            SlideContent::titled("Welcome"),
        );
        assert_eq!(slide.wine_id(), None);
    }
}
