use thiserror::Error;

use tasting_core::error::SequenceError;

/// Errors surfaced when assembling or driving a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The wines and slides produced no presentable sequence.
    #[error(transparent)]
    EmptySequence(#[from] SequenceError),
}
