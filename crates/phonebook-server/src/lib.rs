//! # Phonebook Server
//!
//! HTTP layer for the phonebook service.
//!
//! - [`Server`] - hyper/tokio server with graceful shutdown
//! - [`Router`] - method + path template matching to an [`Operation`]
//! - [`Handlers`] - one async handler per operation over a
//!   [`ContactRepository`](phonebook_core::ContactRepository)
//! - [`ApiError`] - translation of failures into status codes and JSON bodies
//! - [`cors`], [`static_files`], [`access_log`] - the rest of the pipeline
//!
//! ## Routes
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/info` | HTML summary with contact count and server time |
//! | GET | `/api/persons` | list contacts |
//! | POST | `/api/persons` | create, or update the contact with the same name |
//! | GET | `/api/persons/{id}` | fetch one contact |
//! | PUT | `/api/persons/{id}` | update one contact |
//! | DELETE | `/api/persons/{id}` | delete one contact |
//!
//! Anything else answers `404 {"error":"unknown endpoint"}`.

#![doc(html_root_url = "https://docs.rs/phonebook-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod access_log;
pub mod config;
pub mod cors;
mod error;
mod handlers;
pub mod response;
pub mod router;
mod server;
pub mod shutdown;
pub mod static_files;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use cors::{AllowedOrigins, CorsConfig};
pub use error::{ApiError, ApiResult, ServerError};
pub use handlers::Handlers;
pub use response::HttpResponse;
pub use router::{Operation, RouteMatch, Router};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
pub use static_files::{StaticFileError, StaticFiles};
