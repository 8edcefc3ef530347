// Playback module - live targets and the event-release clock

pub mod arena;
pub mod field;
pub mod scheduler;

pub use arena::{LiveTarget, TargetArena, TargetId};
pub use field::Playfield;
pub use scheduler::{PlaybackScheduler, SchedulerState};
