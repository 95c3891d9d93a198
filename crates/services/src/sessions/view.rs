use tasting_core::model::{ParticipantId, SessionId, Slide, Wine, WineId};

use super::averages::AveragesOutcome;
use super::completion::WineCompletion;
use super::navigation::TransitionKind;
use super::progress::SectionProgress;

/// Read-only projection of the completion state machine, shaped for the
/// presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionView {
    pub wine_id: Option<WineId>,
    pub participant_finished: bool,
    pub has_triggered_processing: bool,
    pub is_checking: bool,
    pub is_blocking: bool,
    pub is_loading_averages: bool,
    pub is_showing_averages: bool,
    pub countdown_seconds: Option<u32>,
    pub skip_available: bool,
    pub averages: Option<AveragesOutcome>,
}

impl From<&WineCompletion> for CompletionView {
    fn from(state: &WineCompletion) -> Self {
        Self {
            wine_id: state.wine_id(),
            participant_finished: state.participant_finished(),
            has_triggered_processing: state.has_triggered(),
            is_checking: state.is_checking(),
            is_blocking: state.is_blocking(),
            is_loading_averages: state.is_loading_averages(),
            is_showing_averages: state.is_showing_averages(),
            countdown_seconds: state.countdown_seconds(),
            skip_available: state.skip_available(),
            averages: state.averages().cloned(),
        }
    }
}

/// Where the participant lands once the session is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Farewell {
    /// Normal end of a real session.
    Completion {
        session_id: SessionId,
        participant_id: ParticipantId,
    },
    /// Preview or otherwise detached run.
    Landing,
}

/// One consistent observation of the engine, taken under its lock.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub index: usize,
    pub total: usize,
    pub slide: Slide,
    /// The wine owning the current slide; `None` on package-level slides.
    pub wine: Option<Wine>,
    /// Present while a settle delay is running; navigation is gated.
    pub transitioning: Option<TransitionKind>,
    pub completion: CompletionView,
    pub sections: Vec<SectionProgress>,
    /// Saves still in flight; informational only, never a gate.
    pub pending_saves: usize,
    pub finished: Option<Farewell>,
}

impl EngineSnapshot {
    #[must_use]
    pub fn is_navigating(&self) -> bool {
        self.transitioning.is_some()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}
