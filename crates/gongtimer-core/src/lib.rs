//! # Gongtimer Core Library
//!
//! Countdown and interval-bell logic for the Gongtimer meditation timer.
//! Everything a session does is available here; the `gongtimer-cli` binary
//! is a thin layer that parses arguments and prints events.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a tick-driven state machine. The caller removes one
//!   second per `tick()`; nothing here reads the wall clock.
//! - **Bell Scheduler**: rings each bell once at `total - offset` and strikes
//!   the closing gong once when the countdown reaches zero
//! - **Session Runner**: a tokio task that ticks a session in real time and
//!   stops ticking while paused
//! - **Storage**: TOML-based preferences
//!
//! ## Key Components
//!
//! - [`MeditationSession`]: engine and scheduler over one configuration
//! - [`SessionStore`]: shared configuration handle that triggers rebuilds
//! - [`CueEmitter`]: trait for anything that can strike the gong
//! - [`Config`]: application configuration management

pub mod bell;
pub mod cue;
pub mod duration;
pub mod error;
pub mod events;
pub mod runner;
pub mod session;
pub mod storage;
pub mod timer;

pub use bell::{Bell, BellId, BellSet, NewBell};
pub use cue::{CueEmitter, RecordingCue, SilentCue, TerminalBell};
#[cfg(feature = "audio")]
pub use cue::GongPlayer;
pub use duration::{format_seconds, parse_to_seconds, ParsedDuration, PickedDuration};
pub use error::{ConfigError, CoreError, CueError, ValidationError};
pub use events::Event;
pub use runner::{SessionRunner, DEFAULT_TICK_INTERVAL};
pub use session::{MeditationSession, SessionConfig, SessionStore};
pub use storage::Config;
pub use timer::{BellScheduler, CountdownEngine, TickOutcome, TimerState};
