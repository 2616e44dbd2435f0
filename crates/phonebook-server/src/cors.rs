//! Cross-origin resource sharing.
//!
//! Preflight `OPTIONS` requests (carrying `Origin` and
//! `Access-Control-Request-Method`) are answered directly with 204 and never
//! reach the router. Every other response gets `Access-Control-Allow-Origin`
//! when the request carried an allowed `Origin`.
//!
//! # Example
//!
//! ```rust
//! use phonebook_server::cors::CorsConfig;
//!
//! let open = CorsConfig::permissive();
//! let locked = CorsConfig::builder()
//!     .allow_origin("http://localhost:5173")
//!     .build();
//! ```

use std::collections::HashSet;
use std::time::Duration;

use http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};

use crate::response::{empty, HttpResponse};

const PREFLIGHT_VARY: &str = "Origin, Access-Control-Request-Method, Access-Control-Request-Headers";

/// The set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`*`).
    Any,
    /// Only these exact origins.
    List(HashSet<String>),
}

impl AllowedOrigins {
    /// Returns `true` if `origin` is allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.contains(origin),
        }
    }

    fn header_value(&self, origin: &HeaderValue) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::List(origins) => origin
                .to_str()
                .ok()
                .filter(|o| origins.contains(*o))
                .map(|_| origin.clone()),
        }
    }
}

/// CORS policy.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    allowed_origins: AllowedOrigins,
    allowed_methods: Vec<Method>,
    max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsConfig {
    /// Any origin, the usual methods, requested headers reflected.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allowed_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::PATCH,
                Method::POST,
                Method::DELETE,
            ],
            max_age: Some(Duration::from_secs(86400)),
        }
    }

    /// Starts a builder with no allowed origins.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::default()
    }

    /// Builds a policy from configured origin strings; `"*"` allows any.
    #[must_use]
    pub fn from_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: HashSet<String> = origins.into_iter().map(Into::into).collect();
        if origins.contains("*") {
            return Self::permissive();
        }
        Self {
            allowed_origins: AllowedOrigins::List(origins),
            ..Self::permissive()
        }
    }

    /// Returns the allowed origins.
    #[must_use]
    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.allowed_origins
    }

    /// Returns `true` for a CORS preflight request.
    #[must_use]
    pub fn is_preflight<B>(&self, request: &Request<B>) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(header::ORIGIN)
            && request
                .headers()
                .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    }

    /// Answers a preflight request.
    ///
    /// Disallowed origins get 403.
    #[must_use]
    pub fn preflight(&self, headers: &HeaderMap) -> HttpResponse {
        let Some(allow_origin) = headers
            .get(header::ORIGIN)
            .and_then(|origin| self.allowed_origins.header_value(origin))
        else {
            tracing::debug!("Preflight from disallowed origin");
            return empty(StatusCode::FORBIDDEN);
        };

        let mut response = empty(StatusCode::NO_CONTENT);
        let out = response.headers_mut();
        out.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);

        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&methods) {
            out.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
        }

        if let Some(requested) = headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            out.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }

        if let Some(max_age) = self.max_age {
            out.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age.as_secs()));
        }

        out.insert(header::VARY, HeaderValue::from_static(PREFLIGHT_VARY));
        response
    }

    /// Adds CORS headers to a non-preflight response.
    pub fn apply(&self, origin: Option<&HeaderValue>, response: &mut HttpResponse) {
        let Some(origin) = origin else {
            return;
        };

        if let Some(value) = self.allowed_origins.header_value(origin) {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            if matches!(self.allowed_origins, AllowedOrigins::List(_)) {
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
            }
        }
    }
}

/// Builder for [`CorsConfig`].
#[derive(Debug, Clone)]
pub struct CorsBuilder {
    config: CorsConfig,
}

impl Default for CorsBuilder {
    fn default() -> Self {
        Self {
            config: CorsConfig {
                allowed_origins: AllowedOrigins::List(HashSet::new()),
                ..CorsConfig::permissive()
            },
        }
    }
}

impl CorsBuilder {
    /// Allows any origin.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        if let AllowedOrigins::List(origins) = &mut self.config.allowed_origins {
            origins.insert(origin.into());
        }
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets the preflight cache duration.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Builds the policy.
    #[must_use]
    pub fn build(self) -> CorsConfig {
        self.config
    }
}
