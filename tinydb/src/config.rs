//! Engine configuration module.
//!
//! This module loads configuration for the storage engine from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `TINYDB_MAX_PAGES`: Ceiling on the number of pages in a table file (default: `100`)
//! - `TINYDB_DATABASE_PATH`: Database file to open when none is given on the command line
//!
//! # Invariants
//!
//! - `max_pages` is always at least 1, so the root page can be allocated

use std::path::PathBuf;

use crate::storage::DEFAULT_MAX_PAGES;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Database file used when the caller does not name one.
    pub database_path: Option<PathBuf>,
    /// Maximum number of pages a table may hold.
    pub max_pages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    pub const MAX_PAGES_VAR: &'static str = "TINYDB_MAX_PAGES";
    pub const DATABASE_PATH_VAR: &'static str = "TINYDB_DATABASE_PATH";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TINYDB_MAX_PAGES` is set but is not a positive
    /// integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_pages = match lookup(Self::MAX_PAGES_VAR) {
            Some(value) => parse_max_pages(&value)?,
            None => DEFAULT_MAX_PAGES,
        };
        let database_path = lookup(Self::DATABASE_PATH_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_path,
            max_pages,
        })
    }

    /// The configured database path.
    ///
    /// # Errors
    ///
    /// Returns `MissingEnvVar` when `TINYDB_DATABASE_PATH` was not set.
    pub fn require_database_path(&self) -> Result<&std::path::Path, ConfigError> {
        self.database_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(Self::DATABASE_PATH_VAR.to_string()))
    }
}

fn parse_max_pages(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue {
            name: EngineConfig::MAX_PAGES_VAR.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_pages, 100);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_values_from_lookup() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("TINYDB_MAX_PAGES", "400"),
            ("TINYDB_DATABASE_PATH", "/tmp/users.db"),
        ]))
        .expect("config");

        assert_eq!(config.max_pages, 400);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/users.db")));
    }

    #[test]
    fn test_invalid_max_pages() {
        for bad in ["0", "-3", "lots", ""] {
            let result = EngineConfig::from_lookup(lookup_from(&[("TINYDB_MAX_PAGES", bad)]));
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidValue { ref name, .. }) if name == "TINYDB_MAX_PAGES"
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_require_database_path() {
        let config = EngineConfig::default();
        assert_eq!(
            config.require_database_path(),
            Err(ConfigError::MissingEnvVar("TINYDB_DATABASE_PATH".to_string()))
        );

        let config = EngineConfig::from_lookup(lookup_from(&[("TINYDB_DATABASE_PATH", "a.db")]))
            .expect("config");
        assert_eq!(
            config.require_database_path(),
            Ok(std::path::Path::new("a.db"))
        );
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
