//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Default session length and tick period
//! - Gong settings (on/off, sound file, volume)
//! - Labels given to newly added bells
//!
//! Bells themselves are not stored; they live only as long as the process.
//! Configuration is stored at `~/.config/gongtimer/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::bell::{DEFAULT_BELL_LABEL, DEFAULT_BELL_SUBTITLE};
use crate::duration::{parse_to_seconds, resolve_route_duration, DEFAULT_DURATION_TEXT};
use crate::error::ConfigError;

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// `MM:SS` or `HH:MM:SS`.
    #[serde(default = "default_duration")]
    pub default_duration: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Gong configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sound file to play. Without it (or without audio support) the
    /// terminal bell rings instead.
    #[serde(default)]
    pub sound: Option<String>,
    /// 0..=100
    #[serde(default = "default_volume")]
    pub volume: u32,
}

/// Defaults for newly added bells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BellConfig {
    #[serde(default = "default_bell_label")]
    pub default_label: String,
    #[serde(default = "default_bell_subtitle")]
    pub default_subtitle: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/gongtimer/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub cue: CueConfig,
    #[serde(default)]
    pub bell: BellConfig,
}

fn default_duration() -> String {
    DEFAULT_DURATION_TEXT.into()
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    100
}
fn default_bell_label() -> String {
    DEFAULT_BELL_LABEL.into()
}
fn default_bell_subtitle() -> String {
    DEFAULT_BELL_SUBTITLE.into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: None,
            volume: default_volume(),
        }
    }
}

impl Default for BellConfig {
    fn default() -> Self {
        Self {
            default_label: default_bell_label(),
            default_subtitle: default_bell_subtitle(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !parse_to_seconds(&self.timer.default_duration).is_valid() {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_duration".into(),
                message: format!(
                    "'{}' is not MM:SS or HH:MM:SS",
                    self.timer.default_duration
                ),
            });
        }
        if self.timer.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.cue.volume > 100 {
            return Err(ConfigError::InvalidValue {
                key: "cue.volume".into(),
                message: "must be between 0 and 100".into(),
            });
        }
        Ok(())
    }

    pub fn default_duration_secs(&self) -> u64 {
        resolve_route_duration(Some(&self.timer.default_duration))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timer.tick_interval_ms)
    }
}
