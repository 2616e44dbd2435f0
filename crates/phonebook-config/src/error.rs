//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {path} does not exist")]
    Missing {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported config format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),

    /// TOML syntax or schema error.
    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or schema error.
    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file is present but cannot be parsed.
    #[error("malformed .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A loaded value fails validation.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override could not be applied.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// The variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns the offending field for [`ConfigError::InvalidValue`].
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_path() {
        let err = ConfigError::missing("/etc/phonebook.toml");
        assert_eq!(err.to_string(), "config file /etc/phonebook.toml does not exist");
    }

    #[test]
    fn test_invalid_value_names_field() {
        let err = ConfigError::invalid_value("server.http_addr", "not a socket address");
        assert_eq!(err.to_string(), "server.http_addr: not a socket address");
        assert_eq!(err.field(), Some("server.http_addr"));
    }

    #[test]
    fn test_env_error() {
        let err = ConfigError::env("PORT", "expected a port number");
        assert_eq!(err.to_string(), "environment variable PORT: expected a port number");
        assert_eq!(err.field(), None);
    }
}
