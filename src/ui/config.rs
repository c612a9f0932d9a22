use crate::debugger::MAX_WAIT_POLL_INTERVAL;
use crate::{muted_error, weak_error};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_PATH: &str = ".config/hl/config.toml";

/// Configuration file representation, every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    break_on_start: Option<bool>,
    break_on_exception: Option<bool>,
    wait_poll_interval_ms: Option<u64>,
    save_history: Option<bool>,
}

/// Application config.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Break every new process at its first statement.
    pub break_on_start: bool,
    /// Break a process at a failed statement.
    pub break_on_exception: bool,
    /// Pause state poll interval, never greater than [`MAX_WAIT_POLL_INTERVAL`].
    pub wait_poll_interval: Duration,
    /// Save command history in a regular file.
    pub save_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            break_on_start: false,
            break_on_exception: false,
            wait_poll_interval: MAX_WAIT_POLL_INTERVAL,
            save_history: false,
        }
    }
}

impl Config {
    /// Parse config from TOML source.
    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::de::from_str(data)?;
        Ok(Self::default().merge(file))
    }

    /// Load config from file. If `path` is [`None`] config is loaded from
    /// `~/.config/hl/config.toml`. Default config is returned on errors.
    pub fn load(path: Option<&Path>) -> Self {
        let data = match path {
            None => home::home_dir()
                .and_then(|home| muted_error!(read_to_string(home.join(DEFAULT_PATH)))),
            Some(path) => weak_error!(read_to_string(path), "load config file:"),
        };

        data.and_then(|data| weak_error!(Self::from_toml(&data), "parse config file:"))
            .unwrap_or_default()
    }

    fn merge(self, file: FileConfig) -> Self {
        Self {
            break_on_start: file.break_on_start.unwrap_or(self.break_on_start),
            break_on_exception: file.break_on_exception.unwrap_or(self.break_on_exception),
            wait_poll_interval: file
                .wait_poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(self.wait_poll_interval)
                .min(MAX_WAIT_POLL_INTERVAL),
            save_history: file.save_history.unwrap_or(self.save_history),
        }
    }
}

/// Read-only configuration (set only once, at application start).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Set initial configuration. Return `false` if configuration already set.
pub fn set(config: Config) -> bool {
    CONFIG.set(config).is_ok()
}

/// Return application config, default one if nothing was set.
pub fn current() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
