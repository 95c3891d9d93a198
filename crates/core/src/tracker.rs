use std::collections::HashMap;

use crate::model::{AnswerValue, SlideId, WineId};
use crate::sequence::SlideSequence;

/// In-memory map of the participant's current answers.
///
/// This is the source of truth for completion checks; durable persistence
/// happens elsewhere and a failed save never blocks progression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerTracker {
    answers: HashMap<SlideId, AnswerValue>,
}

impl AnswerTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the answer for a slide. Last write wins; the new value is
    /// immediately visible to completion checks.
    pub fn set(&mut self, slide_id: SlideId, value: AnswerValue) {
        self.answers.insert(slide_id, value);
    }

    #[must_use]
    pub fn get(&self, slide_id: SlideId) -> Option<&AnswerValue> {
        self.answers.get(&slide_id)
    }

    /// True when the slide has a usable answer. Blank text and empty
    /// choice sets do not count.
    #[must_use]
    pub fn answered(&self, slide_id: SlideId) -> bool {
        self.answers.get(&slide_id).is_some_and(|v| !v.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// True iff every question slide of the wine has a tracked answer.
    ///
    /// A wine with zero question slides is vacuously complete: there is
    /// nothing left for the participant to do there.
    #[must_use]
    pub fn is_wine_complete(&self, sequence: &SlideSequence, wine_id: WineId) -> bool {
        sequence
            .wine_slides(wine_id)
            .iter()
            .filter(|s| s.is_question())
            .all(|s| self.answered(s.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        SectionTag, Slide, SlideContent, SlideKind, SlideOwner, Wine,
    };

    fn build_wine(position: u32) -> Wine {
        Wine::new(WineId::random(), format!("Wine {position}"), None, None, position)
    }

    fn question(wine_id: WineId, position: u32) -> Slide {
        Slide::new(
            SlideId::random(),
            SlideOwner::Wine { wine_id, position },
            Some(SectionTag::DeepDive),
            SlideKind::Question,
            SlideContent::default(),
        )
    }

    fn interlude(wine_id: WineId, position: u32) -> Slide {
        Slide::new(
            SlideId::random(),
            SlideOwner::Wine { wine_id, position },
            Some(SectionTag::Intro),
            SlideKind::Interlude,
            SlideContent::default(),
        )
    }

    #[test]
    fn set_is_immediately_visible() {
        let wine = build_wine(1);
        let q = question(wine.id(), 1);
        let seq = SlideSequence::build(vec![wine.clone()], vec![q.clone()]).unwrap();

        let mut tracker = AnswerTracker::new();
        assert!(!tracker.is_wine_complete(&seq, wine.id()));

        tracker.set(q.id(), AnswerValue::Scale(7));
        assert!(tracker.is_wine_complete(&seq, wine.id()));
        assert_eq!(tracker.get(q.id()), Some(&AnswerValue::Scale(7)));
    }

    #[test]
    fn last_write_wins() {
        let slide_id = SlideId::random();
        let mut tracker = AnswerTracker::new();
        tracker.set(slide_id, AnswerValue::Scale(3));
        tracker.set(slide_id, AnswerValue::Scale(9));
        assert_eq!(tracker.get(slide_id), Some(&AnswerValue::Scale(9)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn non_question_slides_do_not_gate_completion() {
        let wine = build_wine(1);
        let q = question(wine.id(), 2);
        let seq = SlideSequence::build(
            vec![wine.clone()],
            vec![interlude(wine.id(), 1), q.clone()],
        )
        .unwrap();

        let mut tracker = AnswerTracker::new();
        tracker.set(q.id(), AnswerValue::Text("plum and leather".into()));
        assert!(tracker.is_wine_complete(&seq, wine.id()));
    }

    #[test]
    fn blank_answers_do_not_complete_the_wine() {
        let wine = build_wine(1);
        let q = question(wine.id(), 1);
        let seq = SlideSequence::build(vec![wine.clone()], vec![q.clone()]).unwrap();

        let mut tracker = AnswerTracker::new();
        tracker.set(q.id(), AnswerValue::Text("   ".into()));
        assert!(!tracker.answered(q.id()));
        assert!(!tracker.is_wine_complete(&seq, wine.id()));

        tracker.set(q.id(), AnswerValue::Text("leather and plum".into()));
        assert!(tracker.is_wine_complete(&seq, wine.id()));
    }

    #[test]
    fn wine_without_questions_is_vacuously_complete() {
        let wine = build_wine(1);
        let seq =
            SlideSequence::build(vec![wine.clone()], vec![interlude(wine.id(), 1)]).unwrap();

        let tracker = AnswerTracker::new();
        assert!(tracker.is_wine_complete(&seq, wine.id()));
    }
}
