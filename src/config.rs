//! User configuration loaded from `config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Top level configuration. Every field falls back to its default when the
/// file omits it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Unix socket the daemon listens on.
    pub socket_path: PathBuf,
    pub history: HistoryConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Keep the history only in memory when false.
    pub persist: bool,
    /// JSON file the history is persisted to.
    pub path: PathBuf,
    /// Oldest entries are dropped beyond this many.
    pub max_entries: usize,
    /// Number of entries returned by a history listing.
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: dirs::runtime_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("safecalc.sock"),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            persist: true,
            path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("safecalc")
                .join("history.json"),
            max_entries: 1000,
            page_size: 30,
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the config from `path`, or from the default location.
    ///
    /// Missing files yield the defaults; malformed files are reported and
    /// also yield the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
            return Self::default();
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "invalid config, using defaults");
                Self::default()
            }
        }
    }
}

/// `$XDG_CONFIG_HOME/safecalc/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("safecalc").join("config.toml"))
}
