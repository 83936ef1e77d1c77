mod engine;
mod scheduler;

pub use engine::{CountdownEngine, TickOutcome, TimerState};
pub use scheduler::BellScheduler;
