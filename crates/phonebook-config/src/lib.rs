//! Typed configuration for the phonebook service.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment overrides (`PHONEBOOK__SECTION__KEY`, plus a bare `PORT`)
//! - Strict parsing that fails on unknown fields
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:3001"
//! shutdown_timeout_secs = 30
//! max_body_size = 102400
//!
//! [storage]
//! backend = "file"
//! path = "phonebook.json"
//!
//! [static_files]
//! enabled = true
//! root = "dist"
//! index = "index.html"
//!
//! [cors]
//! allowed_origins = ["*"]
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/phonebook-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::PhonebookConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, PORT_VAR};
pub use schema::{
    CorsSection, LogFormat, LoggingConfig, ServerSection, StaticFilesConfig, StorageBackend,
    StorageConfig,
};
