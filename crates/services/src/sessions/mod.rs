pub mod averages;
pub mod completion;
pub mod engine;
pub mod navigation;
pub mod progress;
pub mod view;

pub use averages::{AveragesOutcome, QuestionAverage, WineAverages};
pub use completion::{CompletionPhase, WineCompletion};
pub use engine::{EngineTimings, SessionEngine};
pub use navigation::{decide_next, NavDecision, TransitionKind};
pub use progress::{section_progress, SectionProgress};
pub use view::{CompletionView, EngineSnapshot, Farewell};
