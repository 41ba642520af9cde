//! Configuration loading and typed config structures for the ICARUS service.
//!
//! The configuration lives in `icarus-config.yaml` next to the binary. This
//! module defines strongly-typed structs that mirror the YAML structure and
//! a loader that reads the file and applies environment overrides. Every
//! field has a default, so an empty (or missing) file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `icarus-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Journal directory and history window.
    #[serde(default)]
    pub journal: JournalConfig,

    /// Initial loading behaviour.
    #[serde(default)]
    pub loading: LoadingConfig,

    /// External star-system catalog.
    #[serde(default)]
    pub edsm: EdsmConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `ICARUS_LOG_DIR` overrides `journal.dir`
    /// - `ICARUS_PORT` overrides `server.port`
    /// - `EDSM_API_URL` overrides `edsm.api_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = std::env::var_os("ICARUS_LOG_DIR") {
            self.journal.dir = PathBuf::from(dir);
        }
        if let Some(port) = std::env::var("ICARUS_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(url) = std::env::var("EDSM_API_URL") {
            self.edsm.api_url = url;
        }
    }
}

/// Journal directory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JournalConfig {
    /// Directory holding `Journal.*.log` and the JSON status files.
    #[serde(default = "default_journal_dir")]
    pub dir: PathBuf,

    /// Only journal files modified within this many days are replayed.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,

    /// How often the watchers re-scan the directory.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl JournalConfig {
    /// Poll interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: default_journal_dir(),
            history_window_days: default_history_window_days(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Initial loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadingConfig {
    /// Period of `loadingProgress` broadcasts while loading.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl LoadingConfig {
    /// Progress period as a [`Duration`].
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// EDSM catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EdsmConfig {
    /// Base URL of the EDSM API.
    #[serde(default = "default_edsm_api_url")]
    pub api_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EdsmConfig {
    fn default() -> Self {
        Self {
            api_url: default_edsm_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_journal_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous")
}

const fn default_history_window_days() -> u32 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

const fn default_progress_interval_ms() -> u64 {
    200
}

fn default_edsm_api_url() -> String {
    "https://www.edsm.net".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3300
}

fn default_log_level() -> String {
    "info".to_owned()
}
