mod scheduler;

pub use scheduler::{Fired, Scheduler, TimerId, TimerKind};
