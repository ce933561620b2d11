//! Application-level configuration loading, including the session timing knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FLAGQUIZ_BACK_CONFIG_PATH";

/// Reveal countdown per round, in seconds.
const DEFAULT_COUNTDOWN_SECS: u64 = 5;
/// Shorter countdown used in practice mode.
const DEFAULT_PRACTICE_COUNTDOWN_SECS: u64 = 3;
/// Delay between session start and the first round presentation, decoupling
/// UI setup from the first render.
const DEFAULT_FIRST_ROUND_DELAY_MS: u64 = 500;
/// Delay between a practice-mode countdown reveal and the automatic
/// draw-slot advance.
const DEFAULT_AUTO_ADVANCE_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    countdown_secs: u64,
    practice_countdown_secs: u64,
    first_round_delay_ms: u64,
    auto_advance_delay_ms: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in timing defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded timing configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Initial countdown value in seconds for the given session mode.
    pub fn countdown_secs(&self, practice: bool) -> u64 {
        if practice {
            self.practice_countdown_secs
        } else {
            self.countdown_secs
        }
    }

    /// Delay before the first round is presented after a session start.
    pub fn first_round_delay(&self) -> Duration {
        Duration::from_millis(self.first_round_delay_ms)
    }

    /// Delay before practice mode scores the draw slot after a countdown reveal.
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            practice_countdown_secs: DEFAULT_PRACTICE_COUNTDOWN_SECS,
            first_round_delay_ms: DEFAULT_FIRST_ROUND_DELAY_MS,
            auto_advance_delay_ms: DEFAULT_AUTO_ADVANCE_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    countdown_secs: Option<u64>,
    practice_countdown_secs: Option<u64>,
    first_round_delay_ms: Option<u64>,
    auto_advance_delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            countdown_secs: value.countdown_secs.unwrap_or(defaults.countdown_secs),
            practice_countdown_secs: value
                .practice_countdown_secs
                .unwrap_or(defaults.practice_countdown_secs),
            first_round_delay_ms: value
                .first_round_delay_ms
                .unwrap_or(defaults.first_round_delay_ms),
            auto_advance_delay_ms: value
                .auto_advance_delay_ms
                .unwrap_or(defaults.auto_advance_delay_ms),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
