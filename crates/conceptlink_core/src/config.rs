//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the database and logs live and how long trashed
//!   concepts are retained.
//! - Load that description from JSON or from `CONCEPTLINK_*` variables.
//!
//! # Invariants
//! - A loaded config has a supported log level and a non-zero retention.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CONCEPTLINK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CONCEPTLINK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CONCEPTLINK_LOG_DIR";
pub const ENV_TRASH_RETENTION_DAYS: &str = "CONCEPTLINK_TRASH_RETENTION_DAYS";

pub const DEFAULT_TRASH_RETENTION_DAYS: u32 = 30;

/// Configuration for opening and maintaining one graph store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Database file; `None` means in-memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub trash_retention_days: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            trash_retention_days: DEFAULT_TRASH_RETENTION_DAYS,
        }
    }
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed config document: {err}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl CoreConfig {
    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validated()
    }

    /// Reads `CONCEPTLINK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(days) = read(ENV_TRASH_RETENTION_DAYS) {
            config.trash_retention_days =
                days.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TRASH_RETENTION_DAYS,
                    value: days.clone(),
                })?;
        }
        config.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidValue {
                key: "log_level",
                value: self.log_level.clone(),
            })?
            .to_string();
        if self.trash_retention_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "trash_retention_days",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, DEFAULT_TRASH_RETENTION_DAYS, ENV_DB_PATH, ENV_LOG_LEVEL,
        ENV_TRASH_RETENTION_DAYS,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars.iter().copied().collect::<HashMap<_, _>>();
        move |key: &str| vars.get(key).map(|value| value.to_string())
    }

    #[test]
    fn empty_json_object_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.trash_retention_days, DEFAULT_TRASH_RETENTION_DAYS);
    }

    #[test]
    fn json_fields_override_defaults() {
        let config = CoreConfig::from_json_str(
            r#"{"db_path":"/tmp/graph.sqlite3","log_level":"WARN","trash_retention_days":7}"#,
        )
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/graph.sqlite3")));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.trash_retention_days, 7);
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"retention":3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn env_values_are_read_and_blank_ones_ignored() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /data/graph.sqlite3 "),
            (ENV_LOG_LEVEL, "   "),
            (ENV_TRASH_RETENTION_DAYS, "14"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/data/graph.sqlite3")));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.trash_retention_days, 14);
    }

    #[test]
    fn bad_values_are_typed_errors() {
        let err =
            CoreConfig::from_lookup(lookup(&[(ENV_TRASH_RETENTION_DAYS, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == ENV_TRASH_RETENTION_DAYS
        ));

        let err = CoreConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "log_level", .. }));

        assert!(CoreConfig::from_json_str(r#"{"trash_retention_days":0}"#).is_err());
    }
}
