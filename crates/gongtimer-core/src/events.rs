use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bell::BellId;
use crate::timer::TimerState;

/// Every state change in a session produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        total_secs: u64,
        bell_count: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// One second came off the countdown.
    Tick {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    BellRang {
        bell_id: BellId,
        label: String,
        offset_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and the closing gong was struck.
    SessionCompleted {
        total_secs: u64,
        bells_rung: usize,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Duration or bells changed underneath the session; it was rebuilt idle.
    SessionReinitialized {
        total_secs: u64,
        bell_count: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        total_secs: u64,
        remaining_secs: u64,
        remaining_text: String,
        bells_remaining: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for events that come with a gong.
    pub fn is_cue(&self) -> bool {
        matches!(self, Event::BellRang { .. } | Event::SessionCompleted { .. })
    }
}
