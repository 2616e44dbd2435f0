//! Structured logging for the phonebook service.
//!
//! Every crate in the workspace logs through `tracing` macros. This crate
//! installs the subscriber that turns those events into output: JSON lines in
//! production, a human-readable layout during development.
//!
//! # Example
//!
//! ```rust,ignore
//! use phonebook_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!(http.method = "GET", http.path = "/info", "Request completed");
//! ```

#![doc(html_root_url = "https://docs.rs/phonebook-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
