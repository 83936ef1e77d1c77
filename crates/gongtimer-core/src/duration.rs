//! Duration text codec.
//!
//! Durations are whole seconds. The canonical text form is `MM:SS` below one
//! hour and `HH:MM:SS` from one hour up, every field zero-padded to two digits.
//! Parsing accepts either shape and reports anything else as
//! [`ParsedDuration::Invalid`] instead of quietly returning zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;

/// Duration used when a caller supplies no usable duration text.
pub const DEFAULT_DURATION_TEXT: &str = "25:00";
/// [`DEFAULT_DURATION_TEXT`] in seconds.
pub const DEFAULT_DURATION_SECS: u64 = 25 * 60;

/// Outcome of parsing duration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDuration {
    Parsed(u64),
    Invalid(String),
}

impl ParsedDuration {
    pub fn seconds(&self) -> Option<u64> {
        match self {
            ParsedDuration::Parsed(secs) => Some(*secs),
            ParsedDuration::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ParsedDuration::Parsed(_))
    }

    /// Legacy fallback: invalid text counts as zero seconds.
    pub fn or_zero(&self) -> u64 {
        self.seconds().unwrap_or(0)
    }

    pub fn or_default(&self, default_secs: u64) -> u64 {
        self.seconds().unwrap_or(default_secs)
    }

    pub fn into_result(self) -> Result<u64, ValidationError> {
        match self {
            ParsedDuration::Parsed(secs) => Ok(secs),
            ParsedDuration::Invalid(text) => Err(ValidationError::InvalidDuration { text }),
        }
    }
}

/// Parse `MM:SS` or `HH:MM:SS` into seconds.
///
/// Fields may exceed their clock range (`90:00` is 5400 seconds) but must be
/// plain ASCII digits. Surrounding whitespace on a field is ignored.
pub fn parse_to_seconds(text: &str) -> ParsedDuration {
    let invalid = || ParsedDuration::Invalid(text.to_string());

    if text.trim().is_empty() {
        return invalid();
    }

    let mut fields = Vec::with_capacity(3);
    for part in text.split(':') {
        match parse_field(part) {
            Some(value) => fields.push(value),
            None => return invalid(),
        }
    }

    let total = match fields.as_slice() {
        [mm, ss] => mm.checked_mul(60).and_then(|m| m.checked_add(*ss)),
        [hh, mm, ss] => hh
            .checked_mul(3600)
            .and_then(|h| mm.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*ss)),
        _ => None,
    };

    match total {
        Some(secs) => ParsedDuration::Parsed(secs),
        None => invalid(),
    }
}

fn parse_field(part: &str) -> Option<u64> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` once there is at least one hour.
pub fn format_seconds(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Rewrite well-formed duration text into its canonical form.
pub fn canonicalize(text: &str) -> Option<String> {
    parse_to_seconds(text).seconds().map(format_seconds)
}

/// Resolve a duration handed over by another screen or command.
///
/// A missing or malformed value falls back to [`DEFAULT_DURATION_TEXT`].
pub fn resolve_route_duration(param: Option<&str>) -> u64 {
    match param {
        Some(text) => match parse_to_seconds(text) {
            ParsedDuration::Parsed(secs) => secs,
            ParsedDuration::Invalid(text) => {
                warn!(duration = %text, "malformed duration, using {DEFAULT_DURATION_TEXT}");
                DEFAULT_DURATION_SECS
            }
        },
        None => DEFAULT_DURATION_SECS,
    }
}

/// A duration chosen in the hours/minutes/seconds picker.
///
/// Any field may be absent; absent fields count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedDuration {
    #[serde(default)]
    pub hours: Option<u32>,
    #[serde(default)]
    pub minutes: Option<u32>,
    #[serde(default)]
    pub seconds: Option<u32>,
}

impl PickedDuration {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours: Some(hours),
            minutes: Some(minutes),
            seconds: Some(seconds),
        }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours.unwrap_or(0)) * 3600
            + u64::from(self.minutes.unwrap_or(0)) * 60
            + u64::from(self.seconds.unwrap_or(0))
    }

    /// Canonical text for this pick.
    pub fn to_text(&self) -> String {
        format_seconds(self.total_seconds())
    }
}

impl fmt::Display for PickedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for PickedDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let total = parse_to_seconds(s).into_result()?;
        let hours = u32::try_from(total / 3600).map_err(|_| ValidationError::InvalidDuration {
            text: s.to_string(),
        })?;
        Ok(Self::new(hours, ((total % 3600) / 60) as u32, (total % 60) as u32))
    }
}
