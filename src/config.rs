//! Runtime configuration, loaded from `SYNCMARKS_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::types::errors::ConfigError;

/// Which store backend the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Local SQLite database.
    Local,
    /// Hosted sync server over HTTP (needs the `remote` cargo feature).
    Remote,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Backend::Local),
            "remote" => Ok(Backend::Remote),
            other => Err(ConfigError::InvalidValue(format!(
                "SYNCMARKS_BACKEND must be 'local' or 'remote', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SQLite file.
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Base URL of the hosted sync server; required for the remote backend.
    pub remote_url: Option<String>,
    /// Bearer token for the hosted sync server.
    pub remote_token: Option<String>,
    /// Change feed channel capacity.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            backend: Backend::Local,
            remote_url: None,
            remote_token: None,
            channel_capacity: 256,
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Unset variables fall back to defaults; set-but-invalid values are
    /// errors rather than silent fallbacks.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = match std::env::var("SYNCMARKS_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };

        let backend = match std::env::var("SYNCMARKS_BACKEND") {
            Ok(value) => value.parse::<Backend>()?,
            Err(_) => Backend::Local,
        };

        let remote_url = std::env::var("SYNCMARKS_REMOTE_URL").ok();
        if backend == Backend::Remote && remote_url.is_none() {
            return Err(ConfigError::Missing("SYNCMARKS_REMOTE_URL".to_string()));
        }

        let remote_token = std::env::var("SYNCMARKS_REMOTE_TOKEN").ok();

        let channel_capacity = match std::env::var("SYNCMARKS_CHANNEL_CAPACITY") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "SYNCMARKS_CHANNEL_CAPACITY must be a positive integer, got '{}'",
                    value
                ))
            })?,
            Err(_) => 256,
        };
        if channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "SYNCMARKS_CHANNEL_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let config = Self {
            data_dir,
            backend,
            remote_url,
            remote_token,
            channel_capacity,
        };
        debug!(backend = %config.backend, data_dir = %config.data_dir.display(), "configuration loaded");
        Ok(config)
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("syncmarks.db")
    }
}

/// The executable's directory, falling back to the working directory.
fn default_data_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}
