//! Request-level errors and their translation to HTTP responses.
//!
//! Handlers return [`ApiResult`] and never build error responses themselves.
//! [`ApiError::into_response`] is the single place where a failure becomes a
//! status code and body:
//!
//! | Failure | Status | Body |
//! |---|---|---|
//! | [`ErrorKind::Cast`] | 400 | `{"error":"malformatted id"}` |
//! | [`ErrorKind::Validation`] | 400 | `{"error":"<message>"}` |
//! | [`ApiError::MalformedBody`] | 400 | `{"error":"malformatted request body"}` |
//! | [`ApiError::PayloadTooLarge`] | 413 | `{"error":"request entity too large"}` |
//! | [`ErrorKind::Backend`] | 500 | `{"error":"internal server error"}` |

use http::StatusCode;
use phonebook_core::{ErrorKind, StoreError};
use thiserror::Error;

use crate::response::{error_json, HttpResponse};

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A failure while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The contact store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body could not be parsed.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The request body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// The limit in bytes.
        limit: usize,
    },
}

impl ApiError {
    /// Returns the status code this error translates to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(e) if e.kind() == ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Logs the error and converts it into the terminal response.
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        match &self {
            Self::Store(e) => match e.kind() {
                ErrorKind::Cast => error_json(status, "malformatted id"),
                ErrorKind::Validation => error_json(status, &e.to_string()),
                ErrorKind::Backend => error_json(status, "internal server error"),
            },
            Self::MalformedBody(_) => error_json(status, "malformatted request body"),
            Self::PayloadTooLarge { .. } => error_json(status, "request entity too large"),
        }
    }
}

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("Bind error: {0}")]
    BindError(String),

    /// An I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_cast_error_translation() {
        let response = ApiError::from(StoreError::cast("xyz")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "malformatted id"})
        );
    }

    #[tokio::test]
    async fn test_validation_error_carries_message() {
        let err = StoreError::validation("Person validation failed: name: Path `name` is required.");
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Person validation failed: name: Path `name` is required."})
        );
    }

    #[tokio::test]
    async fn test_backend_error_is_opaque() {
        let response = ApiError::from(StoreError::backend("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "internal server error"})
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let response = ApiError::MalformedBody("expected value".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "malformatted request body"})
        );
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let err = ApiError::PayloadTooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "request body exceeds 1024 bytes");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "request entity too large"})
        );
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::BindError("address in use".to_string());
        assert_eq!(err.to_string(), "Bind error: address in use");
    }
}
