use std::ops::Range;

use crate::error::SequenceError;
use crate::model::{SectionTag, Slide, SlideOwner, Wine, WineId};

/// Contiguous run of a wine's slides belonging to one section, expressed as
/// indices into that wine's slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub start: usize,
    pub end: usize,
    /// True when the section had no tagged slides and the span comes from
    /// the position-based equal split.
    pub fallback: bool,
}

impl SectionSpan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub fn contains(&self, index_in_wine: usize) -> bool {
        index_in_wine >= self.start && index_in_wine < self.end
    }
}

/// The ordered slide list for a session, with wine and section lookups.
///
/// Pure function of the raw wine and slide collections; build it once per
/// data change, never per render.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideSequence {
    slides: Vec<Slide>,
    wines: Vec<Wine>,
    package_len: usize,
    wine_ranges: Vec<(WineId, Range<usize>)>,
}

impl SlideSequence {
    /// Assemble the flat sequence: package-level slides sorted by global
    /// position, then each wine's slides in wine-position order, with each
    /// wine internally ordered intro → deep dive → ending and by intra-wine
    /// position inside each section. Slides referencing a wine that is not
    /// in `wines` are dropped; a wine with zero slides contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Empty` when the assembled sequence has no
    /// slides.
    pub fn build(mut wines: Vec<Wine>, slides: Vec<Slide>) -> Result<Self, SequenceError> {
        wines.sort_by_key(|w| (w.position(), w.id().value()));

        let mut package: Vec<Slide> = Vec::new();
        let mut per_wine: Vec<Vec<Slide>> = vec![Vec::new(); wines.len()];
        for slide in slides {
            match slide.owner() {
                SlideOwner::Package { .. } => package.push(slide),
                SlideOwner::Wine { wine_id, .. } => {
                    if let Some(pos) = wines.iter().position(|w| w.id() == wine_id) {
                        per_wine[pos].push(slide);
                    }
                }
            }
        }
        package.sort_by_key(|s| match s.owner() {
            SlideOwner::Package { global_position } => global_position,
            SlideOwner::Wine { .. } => u32::MAX,
        });

        let mut ordered = package;
        let package_len = ordered.len();
        let mut wine_ranges = Vec::new();
        for (wine, mut wine_slides) in wines.iter().zip(per_wine) {
            if wine_slides.is_empty() {
                continue;
            }
            sort_wine_slides(&mut wine_slides);
            let start = ordered.len();
            ordered.extend(wine_slides);
            wine_ranges.push((wine.id(), start..ordered.len()));
        }

        if ordered.is_empty() {
            return Err(SequenceError::Empty);
        }

        Ok(Self {
            slides: ordered,
            wines,
            package_len,
            wine_ranges,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[must_use]
    pub fn wines(&self) -> &[Wine] {
        &self.wines
    }

    #[must_use]
    pub fn wine(&self, wine_id: WineId) -> Option<&Wine> {
        self.wines.iter().find(|w| w.id() == wine_id)
    }

    /// The wine owning the slide at `index`, if any.
    #[must_use]
    pub fn wine_of(&self, index: usize) -> Option<&Wine> {
        self.get(index)
            .and_then(Slide::wine_id)
            .and_then(|id| self.wine(id))
    }

    /// Section of a slide, defaulting to intro when no tag is present.
    #[must_use]
    pub fn section_of(&self, slide: &Slide) -> SectionTag {
        slide.section().unwrap_or(SectionTag::Intro)
    }

    /// All slides of one wine, in presentation order.
    #[must_use]
    pub fn wine_slides(&self, wine_id: WineId) -> &[Slide] {
        self.wine_ranges
            .iter()
            .find(|(id, _)| *id == wine_id)
            .map_or(&[], |(_, range)| &self.slides[range.clone()])
    }

    /// The run of slides the slide at `index` is measured against: its
    /// wine's slides, or the package-level run for package slides.
    #[must_use]
    pub fn context_slides(&self, index: usize) -> &[Slide] {
        match self.get(index).map(Slide::wine_id) {
            Some(Some(wine_id)) => self.wine_slides(wine_id),
            Some(None) => &self.slides[..self.package_len],
            None => &[],
        }
    }

    /// Absolute index where the context run of `index` starts.
    #[must_use]
    pub fn context_start(&self, index: usize) -> usize {
        match self.get(index).map(Slide::wine_id) {
            Some(Some(wine_id)) => self
                .wine_ranges
                .iter()
                .find(|(id, _)| *id == wine_id)
                .map_or(0, |(_, range)| range.start),
            _ => 0,
        }
    }

    /// True when the slide at `index` is its wine's final slide.
    #[must_use]
    pub fn is_last_slide_of_wine(&self, index: usize) -> bool {
        let Some(wine_id) = self.get(index).and_then(Slide::wine_id) else {
            return false;
        };
        self.wine_ranges
            .iter()
            .any(|(id, range)| *id == wine_id && index + 1 == range.end)
    }

    /// True when the next slide exists and belongs to a different wine than
    /// the current one (both wine-owned).
    #[must_use]
    pub fn next_wine_differs(&self, index: usize) -> bool {
        let current = self.get(index).and_then(Slide::wine_id);
        let next = self.get(index + 1).and_then(Slide::wine_id);
        matches!((current, next), (Some(a), Some(b)) if a != b)
    }

    /// True when the current slide is package-level and the next one enters
    /// a wine.
    #[must_use]
    pub fn leaving_package_intro(&self, index: usize) -> bool {
        let current = self.get(index).map(Slide::wine_id);
        let next = self.get(index + 1).and_then(Slide::wine_id);
        matches!(current, Some(None)) && next.is_some()
    }

    /// True when the slide at `index` is the last slide of its section
    /// within its context run.
    #[must_use]
    pub fn is_last_of_section(&self, index: usize) -> bool {
        let Some(slide) = self.get(index) else {
            return false;
        };
        let section = self.section_of(slide);
        let last = self
            .context_slides(index)
            .iter()
            .filter(|s| self.section_of(s) == section)
            .next_back();
        last.is_some_and(|s| s.id() == slide.id())
    }

    /// Number of question slides belonging to one wine.
    #[must_use]
    pub fn question_count(&self, wine_id: WineId) -> usize {
        self.wine_slides(wine_id)
            .iter()
            .filter(|s| s.is_question())
            .count()
    }

    /// The span of one section within a wine's slice. A section with zero
    /// tagged slides falls back to an equal position-based three-way split
    /// so progress indicators stay meaningful.
    #[must_use]
    pub fn section_span(&self, wine_id: WineId, section: SectionTag) -> SectionSpan {
        self.section_span_in(self.wine_slides(wine_id), section)
    }

    /// Same as `section_span`, over an arbitrary contiguous run (used for
    /// the package-level intro run as well as wine slices).
    #[must_use]
    pub fn section_span_in(&self, slides: &[Slide], section: SectionTag) -> SectionSpan {
        let tagged: Vec<usize> = slides
            .iter()
            .enumerate()
            .filter(|(_, s)| self.section_of(s) == section)
            .map(|(i, _)| i)
            .collect();

        if let (Some(&first), Some(&last)) = (tagged.first(), tagged.last()) {
            return SectionSpan {
                start: first,
                end: last + 1,
                fallback: false,
            };
        }

        let per_section = slides.len().div_ceil(3).max(1);
        let section_index = SectionTag::ordered()
            .iter()
            .position(|s| *s == section)
            .unwrap_or(0);
        let start = (section_index * per_section).min(slides.len());
        let end = (start + per_section).min(slides.len());
        SectionSpan {
            start,
            end,
            fallback: true,
        }
    }
}

fn sort_wine_slides(slides: &mut Vec<Slide>) {
    let mut ordered = Vec::with_capacity(slides.len());
    for section in SectionTag::ordered() {
        let mut group: Vec<Slide> = slides
            .iter()
            .filter(|s| s.section().unwrap_or(SectionTag::Intro) == section)
            .cloned()
            .collect();
        group.sort_by_key(|s| match s.owner() {
            SlideOwner::Wine { position, .. } => position,
            SlideOwner::Package { .. } => u32::MAX,
        });
        ordered.extend(group);
    }
    *slides = ordered;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SlideContent, SlideId, SlideKind};

    fn wine(position: u32) -> Wine {
        Wine::new(WineId::random(), format!("Wine {position}"), None, None, position)
    }

    fn wine_slide(wine_id: WineId, position: u32, section: Option<SectionTag>) -> Slide {
        Slide::new(
            SlideId::random(),
            SlideOwner::Wine { wine_id, position },
            section,
            SlideKind::Interlude,
            SlideContent::default(),
        )
    }

    fn package_slide(global_position: u32) -> Slide {
        Slide::new(
            SlideId::random(),
            SlideOwner::Package { global_position },
            None,
            SlideKind::Interlude,
            SlideContent::titled("Welcome"),
        )
    }

    fn question(wine_id: WineId, position: u32, section: SectionTag) -> Slide {
        Slide::new(
            SlideId::random(),
            SlideOwner::Wine { wine_id, position },
            Some(section),
            SlideKind::Question,
            SlideContent::default(),
        )
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = SlideSequence::build(vec![wine(1)], Vec::new()).unwrap_err();
        assert_eq!(err, SequenceError::Empty);
    }

    #[test]
    fn package_slides_come_first_in_global_order() {
        let w = wine(1);
        let slides = vec![
            wine_slide(w.id(), 1, Some(SectionTag::Intro)),
            package_slide(2),
            package_slide(1),
        ];
        let seq = SlideSequence::build(vec![w], slides).unwrap();

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(0).unwrap().wine_id(), None);
        assert_eq!(seq.get(1).unwrap().wine_id(), None);
        assert!(seq.get(2).unwrap().wine_id().is_some());
        let (first, second) = (seq.get(0).unwrap().owner(), seq.get(1).unwrap().owner());
        assert_eq!(first, SlideOwner::Package { global_position: 1 });
        assert_eq!(second, SlideOwner::Package { global_position: 2 });
    }

    #[test]
    fn wines_are_ordered_by_position_and_sections_within() {
        let w1 = wine(1);
        let w2 = wine(2);
        let slides = vec![
            wine_slide(w2.id(), 1, Some(SectionTag::Intro)),
            wine_slide(w1.id(), 2, Some(SectionTag::Ending)),
            wine_slide(w1.id(), 1, Some(SectionTag::DeepDive)),
            wine_slide(w1.id(), 3, Some(SectionTag::Intro)),
        ];
        let seq = SlideSequence::build(vec![w2.clone(), w1.clone()], slides).unwrap();

        let order: Vec<(Option<WineId>, SectionTag)> = seq
            .slides()
            .iter()
            .map(|s| (s.wine_id(), seq.section_of(s)))
            .collect();
        assert_eq!(
            order,
            vec![
                (Some(w1.id()), SectionTag::Intro),
                (Some(w1.id()), SectionTag::DeepDive),
                (Some(w1.id()), SectionTag::Ending),
                (Some(w2.id()), SectionTag::Intro),
            ]
        );
    }

    #[test]
    fn untagged_slides_default_to_intro() {
        let w = wine(1);
        let slides = vec![
            wine_slide(w.id(), 2, None),
            wine_slide(w.id(), 1, Some(SectionTag::DeepDive)),
        ];
        let seq = SlideSequence::build(vec![w], slides).unwrap();

        assert_eq!(seq.section_of(seq.get(0).unwrap()), SectionTag::Intro);
        assert_eq!(seq.section_of(seq.get(1).unwrap()), SectionTag::DeepDive);
    }

    #[test]
    fn zero_slide_wine_contributes_nothing() {
        let w1 = wine(1);
        let w2 = wine(2);
        let slides = vec![wine_slide(w2.id(), 1, None)];
        let seq = SlideSequence::build(vec![w1.clone(), w2.clone()], slides).unwrap();

        assert_eq!(seq.len(), 1);
        assert!(seq.wine_slides(w1.id()).is_empty());
        assert_eq!(seq.wine_slides(w2.id()).len(), 1);
    }

    #[test]
    fn unknown_wine_slides_are_dropped() {
        let w = wine(1);
        let stray = wine_slide(WineId::random(), 1, None);
        let slides = vec![wine_slide(w.id(), 1, None), stray];
        let seq = SlideSequence::build(vec![w], slides).unwrap();
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn wine_boundary_helpers() {
        let w1 = wine(1);
        let w2 = wine(2);
        let slides = vec![
            package_slide(1),
            wine_slide(w1.id(), 1, Some(SectionTag::Intro)),
            wine_slide(w1.id(), 2, Some(SectionTag::Ending)),
            wine_slide(w2.id(), 1, Some(SectionTag::Intro)),
        ];
        let seq = SlideSequence::build(vec![w1.clone(), w2], slides).unwrap();

        assert!(seq.leaving_package_intro(0));
        assert!(!seq.is_last_slide_of_wine(1));
        assert!(seq.is_last_slide_of_wine(2));
        assert!(seq.next_wine_differs(2));
        assert!(!seq.next_wine_differs(1));
        assert_eq!(seq.wine_of(1).unwrap().id(), w1.id());
        assert_eq!(seq.context_start(1), 1);
    }

    #[test]
    fn last_of_section_detects_boundary() {
        let w = wine(1);
        let slides = vec![
            wine_slide(w.id(), 1, Some(SectionTag::Intro)),
            wine_slide(w.id(), 2, Some(SectionTag::Intro)),
            wine_slide(w.id(), 3, Some(SectionTag::DeepDive)),
        ];
        let seq = SlideSequence::build(vec![w], slides).unwrap();

        assert!(!seq.is_last_of_section(0));
        assert!(seq.is_last_of_section(1));
        assert!(seq.is_last_of_section(2));
    }

    #[test]
    fn question_count_counts_only_questions() {
        let w = wine(1);
        let slides = vec![
            wine_slide(w.id(), 1, Some(SectionTag::Intro)),
            question(w.id(), 2, SectionTag::DeepDive),
            question(w.id(), 3, SectionTag::Ending),
        ];
        let seq = SlideSequence::build(vec![w.clone()], slides).unwrap();
        assert_eq!(seq.question_count(w.id()), 2);
    }

    #[test]
    fn tagged_section_span_covers_its_slides() {
        let w = wine(1);
        let slides = vec![
            wine_slide(w.id(), 1, Some(SectionTag::Intro)),
            wine_slide(w.id(), 2, Some(SectionTag::DeepDive)),
            wine_slide(w.id(), 3, Some(SectionTag::DeepDive)),
            wine_slide(w.id(), 4, Some(SectionTag::Ending)),
        ];
        let seq = SlideSequence::build(vec![w.clone()], slides).unwrap();

        let span = seq.section_span(w.id(), SectionTag::DeepDive);
        assert_eq!((span.start, span.end, span.fallback), (1, 3, false));
    }

    #[test]
    fn missing_section_falls_back_to_equal_split() {
        let w = wine(1);
        // Six untagged slides: all default to intro, so deep dive and
        // ending use the equal split.
        let slides: Vec<Slide> = (1..=6).map(|p| wine_slide(w.id(), p, None)).collect();
        let seq = SlideSequence::build(vec![w.clone()], slides).unwrap();

        let deep = seq.section_span(w.id(), SectionTag::DeepDive);
        assert_eq!((deep.start, deep.end, deep.fallback), (2, 4, true));
        let ending = seq.section_span(w.id(), SectionTag::Ending);
        assert_eq!((ending.start, ending.end, ending.fallback), (4, 6, true));
    }
}
