use thiserror::Error;

/// Errors raised while building a slide sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("no slides available for session")]
    Empty,
}

/// Errors raised while constructing question configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionConfigError {
    #[error("scale range is invalid: min {min} must be below max {max}")]
    InvalidScaleRange { min: i32, max: i32 },
}
