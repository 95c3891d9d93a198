use tasting_core::model::{SectionTag, SlideKind, WineId};
use tasting_core::sequence::SlideSequence;
use tasting_core::tracker::AnswerTracker;

use super::completion::WineCompletion;

/// Visual weight of a forward move, which determines the settle delay the
/// driver applies before the index actually changes.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionKind {
    /// Ordinary advance to the adjacent slide.
    Slide,
    /// Direct jump to an arbitrary index.
    Jump,
    /// Crossing a section boundary within the same wine.
    Section { from: SectionTag, to: SectionTag },
    /// Entering a different wine (or the first wine from the package run).
    Wine { wine_id: WineId, name: String },
}

/// What a forward request should do, decided before any delay or I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum NavDecision {
    /// Navigation is gated; drop the request.
    Ignore,
    /// Move to the next index with the given visual weight.
    Advance(TransitionKind),
    /// The wine just finished; run the completion flow before moving on.
    CompletionCheck { wine_id: WineId },
    /// Past the final slide; wind the session down.
    Finalize,
}

/// Decide what pressing "next" at `index` should do.
///
/// Completion checks fire only at a wine boundary, and only when every
/// question of that wine is answered, the wine actually has questions, and
/// no check has already been dispatched for it. A repeated request while a
/// boundary query is still in flight is dropped. Everything else is a
/// plain advance; an unanswered wine is never a hard gate here.
#[must_use]
pub fn decide_next(
    sequence: &SlideSequence,
    tracker: &AnswerTracker,
    index: usize,
    completion: &WineCompletion,
) -> NavDecision {
    if completion.is_checking()
        || completion.is_blocking()
        || completion.is_loading_averages()
        || completion.is_showing_averages()
    {
        return NavDecision::Ignore;
    }

    let wine_boundary = sequence.is_last_slide_of_wine(index)
        || sequence.next_wine_differs(index)
        || (index + 1 >= sequence.len() && sequence.wine_of(index).is_some());
    if wine_boundary {
        if let Some(wine) = sequence.wine_of(index) {
            let has_questions = sequence.question_count(wine.id()) > 0;
            let all_answered = tracker.is_wine_complete(sequence, wine.id());
            if has_questions && all_answered && !completion.has_triggered() {
                return NavDecision::CompletionCheck { wine_id: wine.id() };
            }
        }
    }

    if index + 1 >= sequence.len() {
        return NavDecision::Finalize;
    }

    NavDecision::Advance(transition_into(sequence, index))
}

/// Visual weight of the move from `index` to `index + 1`.
fn transition_into(sequence: &SlideSequence, index: usize) -> TransitionKind {
    let entering_new_wine =
        sequence.next_wine_differs(index) || sequence.leaving_package_intro(index);
    if entering_new_wine {
        // An authored transition slide supplies its own visuals; the heavy
        // wine transition is only synthesized when there is none.
        let next_is_transition = sequence
            .get(index + 1)
            .is_some_and(|s| s.kind() == SlideKind::Transition);
        if !next_is_transition {
            if let Some(wine) = sequence.wine_of(index + 1) {
                return TransitionKind::Wine {
                    wine_id: wine.id(),
                    name: wine.name().to_string(),
                };
            }
        }
        return TransitionKind::Slide;
    }

    if sequence.is_last_of_section(index) {
        let from = sequence.get(index).map(|s| sequence.section_of(s));
        let to = sequence.get(index + 1).map(|s| sequence.section_of(s));
        if let (Some(from), Some(to)) = (from, to) {
            if from != to {
                return TransitionKind::Section { from, to };
            }
        }
    }

    TransitionKind::Slide
}
