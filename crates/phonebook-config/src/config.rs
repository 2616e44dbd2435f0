//! The root configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use phonebook_telemetry::{create_env_filter, LogConfig};
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, CorsSection, LogFormat, LoggingConfig, ServerSection, StaticFilesConfig,
    StorageBackend, StorageConfig,
};

/// Complete phonebook service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables on top of the defaults.
///
/// # Example
///
/// ```
/// use phonebook_config::PhonebookConfig;
///
/// let config = PhonebookConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:3001");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PhonebookConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSection,

    /// Contact store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Static front-end assets.
    #[serde(default)]
    pub static_files: StaticFilesConfig,

    /// Cross-origin access.
    #[serde(default)]
    pub cors: CorsSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PhonebookConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `server.http_addr` is not a socket address
    /// - `server.max_body_size` is zero
    /// - `storage.path` is empty for the file backend
    /// - `static_files.root` or `static_files.index` is empty while enabled
    /// - `cors.allowed_origins` contains an empty entry
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http_addr()?;

        if self.server.max_body_size == 0 {
            return Err(ConfigError::invalid_value("server.max_body_size", "must be greater than zero"));
        }

        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "storage.path",
                "must not be empty for the file backend",
            ));
        }

        if self.static_files.enabled {
            if self.static_files.root.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "static_files.root",
                    "must not be empty when static files are enabled",
                ));
            }
            if self.static_files.index.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "static_files.index",
                    "must not be empty when static files are enabled",
                ));
            }
        }

        if self.cors.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "cors.allowed_origins",
                "origins must not be empty",
            ));
        }

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Parses `server.http_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the address does not parse.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Builds the logging setup for this configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            json_format: self.logging.format == LogFormat::Json,
            file_line_info: self.logging.include_location,
            ..LogConfig::production()
        }
    }

    /// Development preset: pretty `debug` logs with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use phonebook_config::{LogFormat, PhonebookConfig};
    ///
    /// let config = PhonebookConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PhonebookConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().unwrap().port(), 3001);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = PhonebookConfig::default();
        config.server.http_addr = "localhost".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.http_addr"
        ));
    }

    #[test]
    fn test_empty_storage_path_only_matters_for_file_backend() {
        let mut config = PhonebookConfig::default();
        config.storage.path = String::new();
        assert!(config.validate().is_ok());

        config.storage.backend = StorageBackend::File;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_static_root_only_matters_when_enabled() {
        let mut config = PhonebookConfig::default();
        config.static_files.root = String::new();
        assert!(config.validate().is_err());

        config.static_files.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_body_limit() {
        let mut config = PhonebookConfig::default();
        config.server.max_body_size = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("server.max_body_size"));
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = PhonebookConfig::default();
        config.logging.level = "phonebook=loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_log_config_mapping() {
        let log = PhonebookConfig::development().log_config();
        assert!(!log.json_format);
        assert!(log.file_line_info);
        assert_eq!(log.level, "debug");
        assert_eq!(log.service_name, "phonebook");
    }
}
