#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use error::EngineError;
pub use sessions::{
    AveragesOutcome, CompletionPhase, CompletionView, EngineSnapshot, EngineTimings, Farewell,
    NavDecision, QuestionAverage, SectionProgress, SessionEngine, TransitionKind, WineAverages,
    WineCompletion,
};
