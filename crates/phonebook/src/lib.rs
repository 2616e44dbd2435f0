//! # Phonebook
//!
//! A small REST service that stores contacts (`name`, `number`) and serves
//! them over HTTP, together with the frontend bundle.
//!
//! This crate wires the pieces together:
//!
//! - [`phonebook_config`] - layered configuration
//! - [`phonebook_core`] - contacts, validation and repositories
//! - [`phonebook_server`] - the HTTP server
//! - [`phonebook_telemetry`] - structured logging
//!
//! # Example
//!
//! ```rust,ignore
//! use phonebook::{bootstrap, PhonebookConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PhonebookConfig::default();
//!     bootstrap(&config).await?.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/phonebook/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Context as _;

pub use phonebook_config::{ConfigLoader, PhonebookConfig, StorageBackend};
pub use phonebook_core::{ContactRepository, FileRepository, MemoryRepository};
pub use phonebook_server::{CorsConfig, Server, ServerConfig, ShutdownSignal, StaticFiles};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "PHONEBOOK";

/// Builds a ready-to-run server from `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the file store cannot
/// be opened.
pub async fn bootstrap(config: &PhonebookConfig) -> anyhow::Result<Server> {
    config.validate().context("invalid configuration")?;

    let repository = open_repository(config).await?;

    let server_config = ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.shutdown_timeout())
        .max_body_size(config.server.max_body_size)
        .build();

    let mut builder = Server::builder()
        .config(server_config)
        .repository(repository)
        .cors(CorsConfig::from_origins(config.cors.allowed_origins.iter().cloned()));

    if config.static_files.enabled {
        tracing::info!(root = %config.static_files.root, "Serving static files");
        builder = builder.static_files(
            StaticFiles::new(&config.static_files.root).index(config.static_files.index.clone()),
        );
    }

    Ok(builder.build())
}

async fn open_repository(config: &PhonebookConfig) -> anyhow::Result<Arc<dyn ContactRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory contact store");
            Ok(Arc::new(MemoryRepository::new()))
        }
        StorageBackend::File => {
            let path = &config.storage.path;
            let repository = FileRepository::open(path)
                .await
                .with_context(|| format!("failed to open contact store at {path}"))?;
            tracing::info!(path = %path, "Using file contact store");
            Ok(Arc::new(repository))
        }
    }
}
