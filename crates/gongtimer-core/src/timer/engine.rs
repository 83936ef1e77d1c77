//! Countdown engine.
//!
//! A tick-driven state machine: every call to [`CountdownEngine::tick`] while
//! running removes exactly one second. It owns no thread or timer; the caller
//! decides when a second has passed. Elapsed wall-clock time is never caught
//! up, so a paused engine resumes exactly where it stopped.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            +-> Expired (remaining hit zero)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Terminal. Remaining is zero and no further ticks apply.
    Expired,
}

/// Result of a tick that actually decremented the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub remaining_secs: u64,
    /// This tick moved the engine into `Expired`.
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct CountdownEngine {
    state: TimerState,
    total_secs: u64,
    remaining_secs: u64,
}

impl CountdownEngine {
    /// Idle engine loaded with `total_secs`.
    pub fn new(total_secs: u64) -> Self {
        Self {
            state: TimerState::Idle,
            total_secs,
            remaining_secs: total_secs,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs - self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Load a new total and go back to `Idle` without ticking.
    pub fn load(&mut self, total_secs: u64) {
        *self = Self::new(total_secs);
    }

    /// Reset remaining to `total_secs` and start running.
    ///
    /// A zero-length session expires immediately.
    pub fn start(&mut self, total_secs: u64) {
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
        self.state = if total_secs == 0 {
            TimerState::Expired
        } else {
            TimerState::Running
        };
    }

    /// Flip `Running` and `Paused`. An idle engine starts with its loaded
    /// total. Returns the new state; toggling an expired engine does nothing.
    pub fn toggle(&mut self) -> TimerState {
        match self.state {
            TimerState::Running => self.state = TimerState::Paused,
            TimerState::Paused => self.state = TimerState::Running,
            TimerState::Idle => self.start(self.total_secs),
            TimerState::Expired => {}
        }
        self.state
    }

    pub fn pause(&mut self) -> bool {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
            true
        } else {
            false
        }
    }

    /// Back to `Idle` with the full total remaining.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_secs = self.total_secs;
    }

    /// Remove one second. Only has an effect while running.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.state != TimerState::Running || self.remaining_secs == 0 {
            return None;
        }
        self.remaining_secs -= 1;
        let expired = self.remaining_secs == 0;
        if expired {
            self.state = TimerState::Expired;
        }
        Some(TickOutcome {
            remaining_secs: self.remaining_secs,
            expired,
        })
    }
}
