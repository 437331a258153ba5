//! Process configuration.
//!
//! # Invariants
//! - Built once at process start and passed by reference; no global state.
//! - Unset variables fall back to defaults; malformed ones are errors.

use crate::logging::default_log_level;
use crate::repo::{ListWindow, DEFAULT_LIST_LIMIT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "APEXDATA_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "APEXDATA_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "APEXDATA_LOG_DIR";
pub const DEFAULT_LIMIT_ENV: &str = "APEXDATA_DEFAULT_LIMIT";

const DEFAULT_DB_PATH: &str = "apexdata.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for the core library and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Rolling log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Page size used when a list call does not pass one.
    pub default_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Loads from environment variables.
    ///
    /// - `APEXDATA_DB_PATH`: database file (default: `apexdata.sqlite3`)
    /// - `APEXDATA_LOG_LEVEL`: `trace|debug|info|warn|error`
    /// - `APEXDATA_LOG_DIR`: absolute log directory (optional)
    /// - `APEXDATA_DEFAULT_LIMIT`: list page size (default: 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_blank(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(LOG_LEVEL_ENV) {
            config.log_level = level.trim().to_ascii_lowercase();
        }
        config.log_dir = non_blank(LOG_DIR_ENV).map(PathBuf::from);
        if let Some(raw) = non_blank(DEFAULT_LIMIT_ENV) {
            config.default_limit = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: DEFAULT_LIMIT_ENV,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }

    /// List window from optional caller-supplied skip/limit.
    pub fn window(&self, skip: Option<u32>, limit: Option<u32>) -> ListWindow {
        ListWindow::new(skip.unwrap_or(0), limit.unwrap_or(self.default_limit))
    }
}
