pub mod bells;
pub mod completions;
pub mod config;
pub mod duration;
pub mod run;
pub mod simulate;

use clap::Args;
use gongtimer_core::duration::resolve_route_duration;
use gongtimer_core::error::Result;
use gongtimer_core::{format_seconds, Config, Event, NewBell, PickedDuration, SessionConfig};

/// Session length and bells, shared by `run` and `simulate`.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Session length, MM:SS or HH:MM:SS (default from config)
    #[arg(short, long, conflicts_with_all = ["hours", "minutes", "seconds"])]
    pub duration: Option<String>,
    /// Session length in hours, combined with --minutes and --seconds
    #[arg(long)]
    pub hours: Option<u32>,
    #[arg(long)]
    pub minutes: Option<u32>,
    #[arg(long)]
    pub seconds: Option<u32>,
    /// Interval bell, as time after the start (repeatable)
    #[arg(short, long = "bell")]
    pub bells: Vec<String>,
    /// Label for the bells added with --bell
    #[arg(long)]
    pub label: Option<String>,
}

impl SessionArgs {
    fn picked(&self) -> Option<PickedDuration> {
        if self.hours.is_none() && self.minutes.is_none() && self.seconds.is_none() {
            return None;
        }
        Some(PickedDuration {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        })
    }

    /// Build the session configuration. Bad duration text falls back to the
    /// default length; a bad bell time is an error.
    pub fn to_session_config(&self, config: &Config) -> Result<SessionConfig> {
        let duration_secs = match (&self.duration, self.picked()) {
            (Some(text), _) => resolve_route_duration(Some(text)),
            (None, Some(picked)) => picked.total_seconds(),
            (None, None) => config.default_duration_secs(),
        };

        let mut session = SessionConfig::new(duration_secs);
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| config.bell.default_label.clone());
        for time in &self.bells {
            session.bells.add(
                NewBell::at(time.as_str())
                    .with_label(label.as_str())
                    .with_subtitle(config.bell.default_subtitle.as_str()),
            )?;
        }
        Ok(session)
    }
}

/// One human-readable line per event. Ticks are not described here.
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::SessionStarted {
            total_secs,
            bell_count,
            ..
        } => Some(format!(
            "session started: {} with {bell_count} bell(s)",
            format_seconds(*total_secs)
        )),
        Event::TimerPaused { remaining_secs, .. } => {
            Some(format!("paused at {}", format_seconds(*remaining_secs)))
        }
        Event::TimerResumed { remaining_secs, .. } => {
            Some(format!("resumed at {}", format_seconds(*remaining_secs)))
        }
        Event::BellRang {
            bell_id,
            label,
            offset_secs,
            remaining_secs,
            ..
        } => Some(format!(
            "bell {bell_id} ({label}) at +{} with {} left",
            format_seconds(*offset_secs),
            format_seconds(*remaining_secs)
        )),
        Event::SessionCompleted { bells_rung, .. } => {
            Some(format!("session complete: {bells_rung} bell(s) rang"))
        }
        Event::TimerReset { .. } => Some("reset".to_string()),
        Event::SessionReinitialized {
            total_secs,
            bell_count,
            ..
        } => Some(format!(
            "settings changed: {} with {bell_count} bell(s)",
            format_seconds(*total_secs)
        )),
        Event::Tick { .. } | Event::StateSnapshot { .. } => None,
    }
}
