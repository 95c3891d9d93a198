#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod sequence;
pub mod time;
pub mod tracker;

pub use error::{QuestionConfigError, SequenceError};
pub use sequence::{SectionSpan, SlideSequence};
pub use time::Clock;
pub use tracker::AnswerTracker;
