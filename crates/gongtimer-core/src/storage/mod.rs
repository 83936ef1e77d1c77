mod config;

pub use config::{BellConfig, Config, CueConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml`.
///
/// `GONGTIMER_HOME` overrides the location outright. Otherwise it is
/// `~/.config/gongtimer`, or `~/.config/gongtimer-dev` when
/// `GONGTIMER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("GONGTIMER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("GONGTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("gongtimer-dev")
            } else {
                base_dir.join("gongtimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
