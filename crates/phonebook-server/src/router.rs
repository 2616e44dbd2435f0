//! Request routing and path matching.
//!
//! Routes map a method and a path template to an [`Operation`]. Templates use
//! `{name}` segments for parameters. Routes are checked in registration order
//! and the first match wins; `HEAD` requests match `GET` routes.
//!
//! # Example
//!
//! ```rust
//! use phonebook_server::{Operation, Router};
//! use http::Method;
//!
//! let router = Router::phonebook();
//!
//! let m = router.match_route(&Method::GET, "/api/persons/42").unwrap();
//! assert_eq!(m.operation(), Operation::GetContact);
//! assert_eq!(m.param("id"), Some("42"));
//!
//! assert!(router.match_route(&Method::PATCH, "/api/persons/42").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

use http::Method;

/// The operations the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /info`
    Info,
    /// `GET /api/persons`
    ListContacts,
    /// `GET /api/persons/{id}`
    GetContact,
    /// `POST /api/persons`
    CreateContact,
    /// `PUT /api/persons/{id}`
    UpdateContact,
    /// `DELETE /api/persons/{id}`
    DeleteContact,
}

impl Operation {
    /// Returns the operation name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::ListContacts => "listContacts",
            Self::GetContact => "getContact",
            Self::CreateContact => "createContact",
            Self::UpdateContact => "updateContact",
            Self::DeleteContact => "deleteContact",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation: Operation,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched operation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation: Operation,
}

impl Route {
    fn new(method: Method, pattern: &str, operation: Operation) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect();

        Self {
            method,
            segments,
            operation,
        }
    }

    fn accepts(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(actual) {
            match pattern {
                PathSegment::Literal(expected) if expected != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }
}

/// HTTP request router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates a router with every phonebook route registered.
    #[must_use]
    pub fn phonebook() -> Self {
        let mut router = Self::new();
        router.add_route(Method::GET, "/info", Operation::Info);
        router.add_route(Method::GET, "/api/persons", Operation::ListContacts);
        router.add_route(Method::GET, "/api/persons/{id}", Operation::GetContact);
        router.add_route(Method::POST, "/api/persons", Operation::CreateContact);
        router.add_route(Method::PUT, "/api/persons/{id}", Operation::UpdateContact);
        router.add_route(Method::DELETE, "/api/persons/{id}", Operation::DeleteContact);
        router
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, operation: Operation) {
        self.routes.push(Route::new(method, pattern.as_ref(), operation));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request against the registered routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.accepts(method))
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    operation: route.operation,
                    params,
                })
            })
    }
}
