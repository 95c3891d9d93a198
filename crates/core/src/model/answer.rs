use serde::{Deserialize, Serialize};

/// A participant's answer to one question slide.
///
/// Last-write-wins per slide id; the variant must match the owning
/// question's format, which the engine does not re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Scale(i32),
    Text(String),
    Choice(Vec<String>),
}

impl AnswerValue {
    /// Numeric value for scale answers, clamped into the question's range.
    ///
    /// Persisted data has been observed outside the configured range; the
    /// clamp keeps aggregates and progress indicators sane.
    #[must_use]
    pub fn clamped_scale(&self, min: i32, max: i32) -> Option<i32> {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        match self {
            AnswerValue::Scale(v) => Some((*v).clamp(min, max)),
            _ => None,
        }
    }

    /// True for answers that carry no usable content.
    ///
    /// An empty text or empty choice set does not count as answering the
    /// question.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(t) => t.trim().is_empty(),
            AnswerValue::Choice(c) => c.is_empty(),
            AnswerValue::Scale(_) | AnswerValue::Bool(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped_into_range() {
        assert_eq!(AnswerValue::Scale(42).clamped_scale(1, 10), Some(10));
        assert_eq!(AnswerValue::Scale(-3).clamped_scale(1, 10), Some(1));
        assert_eq!(AnswerValue::Scale(7).clamped_scale(1, 10), Some(7));
    }

    #[test]
    fn inverted_range_is_repaired() {
        assert_eq!(AnswerValue::Scale(7).clamped_scale(10, 1), Some(7));
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(!AnswerValue::Text("cherries".into()).is_empty());
        assert!(!AnswerValue::Bool(false).is_empty());
    }

    #[test]
    fn wire_format_is_untagged() {
        let json = serde_json::to_string(&AnswerValue::Scale(8)).unwrap();
        assert_eq!(json, "8");
        let back: AnswerValue = serde_json::from_str("8").unwrap();
        assert_eq!(back, AnswerValue::Scale(8));
    }
}
