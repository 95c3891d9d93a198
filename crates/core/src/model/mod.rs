mod answer;
mod ids;
mod slide;
mod wine;

pub use answer::AnswerValue;
pub use ids::{ParseIdError, ParticipantId, SessionId, SlideId, WineId};
pub use slide::{
    QuestionConfig, QuestionFormat, SectionTag, Slide, SlideContent, SlideKind, SlideOwner,
};
pub use wine::Wine;
