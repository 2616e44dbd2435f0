//! Response construction helpers.

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

const JSON: &str = "application/json; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";

/// Serializes `value` as a JSON response.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => with_body(status, JSON, Bytes::from(body)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// Builds `{"error": message}` with the given status.
pub fn error_json(status: StatusCode, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message });
    with_body(status, JSON, Bytes::from(body.to_string()))
}

/// Builds an HTML response.
pub fn html(status: StatusCode, body: String) -> HttpResponse {
    with_body(status, HTML, Bytes::from(body))
}

/// Builds a response with no body.
pub fn empty(status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_json_shape() {
        let response = error_json(StatusCode::NOT_FOUND, "unknown endpoint");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(body_string(response).await, r#"{"error":"unknown endpoint"}"#);
    }

    #[tokio::test]
    async fn test_empty_has_no_content_type() {
        let response = empty(StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_json_array() {
        let response = json(StatusCode::OK, &[1, 2, 3]);
        assert_eq!(body_string(response).await, "[1,2,3]");
    }
}
