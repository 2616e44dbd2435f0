//! Per-request access logging.
//!
//! Every request produces one `info` event whose message is a line like
//!
//! ```text
//! POST /api/persons 200 61 - 1.204 ms {"name":"Ada","number":"040-123456"}
//! ```
//!
//! The same values are attached as structured fields.

use std::time::Instant;

use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use hyper::body::Body as _;

use crate::handlers::is_json;
use crate::response::HttpResponse;

/// Timer and request summary captured when a request arrives.
#[derive(Debug)]
pub struct AccessLog {
    started: Instant,
    method: Method,
    url: String,
    body: String,
}

impl AccessLog {
    /// Starts timing `request`.
    #[must_use]
    pub fn start(request: &Request<Bytes>) -> Self {
        Self {
            started: Instant::now(),
            method: request.method().clone(),
            url: request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path().to_string(), ToString::to_string),
            body: body_token(request),
        }
    }

    /// Emits the access log event for `response`.
    pub fn finish(self, response: &HttpResponse) {
        let status = response.status();
        let content_length = content_length(response);
        let duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let line = format_line(
            &self.method,
            &self.url,
            status,
            content_length.as_deref(),
            duration_ms,
            &self.body,
        );

        tracing::info!(
            http.method = %self.method,
            http.path = %self.url,
            http.status_code = status.as_u16(),
            content_length = content_length.as_deref().unwrap_or("-"),
            duration_ms,
            body = %self.body,
            "{line}"
        );
    }
}

/// Renders `:method :url :status :res[content-length] - :response-time ms :body`.
#[must_use]
pub fn format_line(
    method: &Method,
    url: &str,
    status: StatusCode,
    content_length: Option<&str>,
    duration_ms: f64,
    body: &str,
) -> String {
    format!(
        "{method} {url} {} {} - {duration_ms:.3} ms {body}",
        status.as_u16(),
        content_length.unwrap_or("-"),
    )
}

/// The logged body: compact JSON for writes, empty for everything else.
fn body_token(request: &Request<Bytes>) -> String {
    if !matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        return String::new();
    }

    if !is_json(request.headers()) {
        return "{}".to_string();
    }

    serde_json::from_slice::<serde_json::Value>(request.body())
        .map_or_else(|_| "{}".to_string(), |value| value.to_string())
}

fn content_length(response: &HttpResponse) -> Option<String> {
    if let Some(value) = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
    {
        return Some(value.to_string());
    }

    response
        .body()
        .size_hint()
        .exact()
        .filter(|len| *len > 0)
        .map(|len| len.to_string())
}
