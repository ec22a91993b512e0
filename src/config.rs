//! Configuration management for tilemark

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one namespace per session
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Auto-save scheduler period, milliseconds
    pub autosave_period_ms: u64,
    /// Trailing protection window after a confirmed navigation load
    pub grace_window_ms: u64,
    /// Force-clear an unconfirmed navigation load after this long
    pub load_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
            },
            session: SessionConfig {
                autosave_period_ms: 1000,
                grace_window_ms: 2000,
                load_timeout_ms: 10_000,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            storage: StorageConfig {
                data_dir: env::var("TILEMARK_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
            },
            session: SessionConfig {
                autosave_period_ms: env_ms(
                    "TILEMARK_AUTOSAVE_PERIOD_MS",
                    defaults.session.autosave_period_ms,
                ),
                grace_window_ms: env_ms(
                    "TILEMARK_GRACE_WINDOW_MS",
                    defaults.session.grace_window_ms,
                ),
                load_timeout_ms: env_ms(
                    "TILEMARK_LOAD_TIMEOUT_MS",
                    defaults.session.load_timeout_ms,
                ),
            },
        }
    }
}

impl SessionConfig {
    pub fn autosave_period(&self) -> Duration {
        Duration::from_millis(self.autosave_period_ms)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn env_ms(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.autosave_period(), Duration::from_secs(1));
        assert_eq!(config.session.grace_window(), Duration::from_secs(2));
        assert_eq!(config.session.load_timeout(), Duration::from_secs(10));
    }
}
