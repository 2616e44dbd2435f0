//! HTTP server.
//!
//! Built on hyper and tokio:
//!
//! - a TCP listener bound to the configured address
//! - one task per connection serving HTTP/1.1
//! - [`Server::dispatch`] running the request pipeline
//! - graceful shutdown that drains open connections
//!
//! The pipeline for every request is: access log timer, CORS preflight,
//! static files, router, handler, error translation, CORS response headers,
//! access log line.
//!
//! # Example
//!
//! ```rust,ignore
//! use phonebook_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:3001")
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use phonebook_core::{ContactRepository, MemoryRepository};
use tokio::net::{TcpListener, TcpStream};

use crate::access_log::AccessLog;
use crate::config::ServerConfig;
use crate::cors::CorsConfig;
use crate::error::{ApiError, ServerError};
use crate::handlers::Handlers;
use crate::response::{error_json, HttpResponse};
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::static_files::StaticFiles;

/// The phonebook HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
    handlers: Handlers,
    cors: CorsConfig,
    static_files: Option<StaticFiles>,
}

impl Server {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the listener configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the backing repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn ContactRepository> {
        self.handlers.repository()
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("Invalid address '{}': {}", self.config.http_addr(), e))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {addr}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Server running on port {}", local_addr.port());

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %e, "Connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
                },

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        let open = tracker.active_connections();
        tracing::info!(active = open, timeout = ?shutdown_timeout, "Waiting for connections to close");

        match tokio::time::timeout(shutdown_timeout, tracker.drain()).await {
            Ok(()) => tracing::info!("All connections closed"),
            Err(_) => tracing::warn!(abandoned_from = open, "Shutdown timeout reached"),
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote_addr = %remote_addr, "Closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> HttpResponse {
        let limit = self.config.max_body_size();
        let (parts, body) = request.into_parts();

        match Limited::new(body, limit).collect().await {
            Ok(collected) => {
                self.dispatch(Request::from_parts(parts, collected.to_bytes()))
                    .await
            }
            Err(e) if e.is::<LengthLimitError>() => {
                let request = Request::from_parts(parts, Bytes::new());
                self.pipeline(request, Some(ApiError::PayloadTooLarge { limit }))
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request body");
                error_json(StatusCode::BAD_REQUEST, "malformatted request body")
            }
        }
    }

    /// Runs the full request pipeline on a buffered request.
    ///
    /// This is what every connection calls; tests can call it directly.
    pub async fn dispatch(&self, request: Request<Bytes>) -> HttpResponse {
        let limit = self.config.max_body_size();
        let rejected = (request.body().len() > limit).then_some(ApiError::PayloadTooLarge { limit });
        self.pipeline(request, rejected).await
    }

    /// Access log and CORS around either `rejected` or the routed response.
    async fn pipeline(&self, request: Request<Bytes>, rejected: Option<ApiError>) -> HttpResponse {
        let access = AccessLog::start(&request);

        let response = if self.cors.is_preflight(&request) {
            self.cors.preflight(request.headers())
        } else {
            let mut response = match rejected {
                Some(e) => e.into_response(),
                None => self.respond(&request).await,
            };
            self.cors
                .apply(request.headers().get(header::ORIGIN), &mut response);
            response
        };

        access.finish(&response);
        response
    }

    async fn respond(&self, request: &Request<Bytes>) -> HttpResponse {
        let method = request.method();
        let path = request.uri().path();

        if let Some(files) = &self.static_files {
            if *method == Method::GET || *method == Method::HEAD {
                match files.handle(path, method) {
                    Ok(response) => return response,
                    Err(e) => tracing::trace!(path, error = %e, "No static file, routing"),
                }
            }
        }

        let Some(route) = self.router.match_route(method, path) else {
            return error_json(StatusCode::NOT_FOUND, "unknown endpoint");
        };

        tracing::debug!(operation = %route.operation(), path, "Dispatching");

        match self
            .handlers
            .handle(&route, request.headers(), request.body())
            .await
        {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config: ServerConfig,
    repository: Option<Arc<dyn ContactRepository>>,
    cors: CorsConfig,
    static_files: Option<StaticFiles>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("cors", &self.cors)
            .field("static_files", &self.static_files)
            .finish_non_exhaustive()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Creates a builder with default settings and no static files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            repository: None,
            cors: CorsConfig::default(),
            static_files: None,
        }
    }

    /// Replaces the listener configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config = self.config.to_builder().http_addr(addr).build();
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.to_builder().shutdown_timeout(timeout).build();
        self
    }

    /// Sets the request body limit in bytes.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.config = self.config.to_builder().max_body_size(bytes).build();
        self
    }

    /// Sets the contact repository. Defaults to an empty in-memory store.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn ContactRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the CORS policy.
    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// Serves static files ahead of the API routes.
    #[must_use]
    pub fn static_files(mut self, files: StaticFiles) -> Self {
        self.static_files = Some(files);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(MemoryRepository::new()));

        Server {
            config: self.config,
            router: Router::phonebook(),
            handlers: Handlers::new(repository),
            cors: self.cors,
            static_files: self.static_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let server = Server::builder().build();
        assert_eq!(server.config().http_addr(), "0.0.0.0:3001");
        assert_eq!(server.router().route_count(), 6);
    }

    #[test]
    fn test_builder_settings_compose() {
        let server = Server::builder()
            .shutdown_timeout(Duration::from_millis(250))
            .max_body_size(512)
            .http_addr("127.0.0.1:0")
            .build();
        assert_eq!(server.config().http_addr(), "127.0.0.1:0");
        assert_eq!(server.config().shutdown_timeout(), Duration::from_millis(250));
        assert_eq!(server.config().max_body_size(), 512);
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let server = Server::builder().http_addr("not-an-address").build();
        let result = server.run_with_shutdown(ShutdownSignal::new()).await;

        match result {
            Err(ServerError::BindError(msg)) => assert!(msg.contains("Invalid address")),
            other => panic!("expected BindError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let server = Server::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let server = Server::builder().build();
        let request = Request::builder()
            .uri("/nope")
            .body(Bytes::new())
            .unwrap();

        let response = server.dispatch(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
