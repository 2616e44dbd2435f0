//! Static file serving for the bundled frontend.
//!
//! Files are served from a root directory for `GET` and `HEAD` only. A
//! request for a directory serves its index file. Anything that cannot be
//! served is reported as a [`StaticFileError`] so the server can fall through
//! to the API router.
//!
//! # Example
//!
//! ```rust
//! use phonebook_server::static_files::StaticFiles;
//!
//! let files = StaticFiles::new("./dist").index("index.html");
//! assert_eq!(files.index_file(), Some("index.html"));
//! ```
//!
//! # Security
//!
//! - `..` components are rejected before touching the filesystem
//! - hidden files (leading `.`) are never served
//! - the canonical path must stay under the canonical root

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::Full;
use thiserror::Error;

use crate::response::HttpResponse;

/// Errors that can occur when serving static files.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// The requested file was not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The path is forbidden (traversal or hidden file).
    #[error("Forbidden path: {0}")]
    Forbidden(String),

    /// Only GET and HEAD are served.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading the file or the root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticFileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Static file server rooted at a directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: Option<String>,
}

impl StaticFiles {
    /// Creates a static file server for `root`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            index_file: None,
        }
    }

    /// Sets the file served for directory requests.
    #[must_use]
    pub fn index<S: Into<String>>(mut self, index: S) -> Self {
        self.index_file = Some(index.into());
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured index file.
    #[must_use]
    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref()
    }

    /// Serves `request_path` relative to the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is not GET or HEAD, the path is
    /// forbidden, nothing exists at the path, or reading fails.
    pub fn handle(&self, request_path: &str, method: &Method) -> Result<HttpResponse, StaticFileError> {
        if method != Method::GET && method != Method::HEAD {
            return Err(StaticFileError::MethodNotAllowed);
        }

        let path = self.resolve_path(request_path)?;

        if path.is_dir() {
            return match &self.index_file {
                Some(index) if path.join(index).is_file() => self.serve_file(&path.join(index), method),
                _ => Err(StaticFileError::NotFound(request_path.to_string())),
            };
        }

        self.serve_file(&path, method)
    }

    fn resolve_path(&self, request_path: &str) -> Result<PathBuf, StaticFileError> {
        let relative = request_path.trim_start_matches('/');

        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir => {
                    return Err(StaticFileError::Forbidden(
                        "Directory traversal not allowed".to_string(),
                    ));
                }
                Component::Normal(name) if name.to_string_lossy().starts_with('.') => {
                    return Err(StaticFileError::Forbidden(
                        "Hidden files not allowed".to_string(),
                    ));
                }
                _ => {}
            }
        }

        let canonical = self
            .root
            .join(relative)
            .canonicalize()
            .map_err(|_| StaticFileError::NotFound(request_path.to_string()))?;
        let canonical_root = self.root.canonicalize()?;

        if !canonical.starts_with(&canonical_root) {
            return Err(StaticFileError::Forbidden(
                "Path escapes root directory".to_string(),
            ));
        }

        Ok(canonical)
    }

    fn serve_file(&self, path: &Path, method: &Method) -> Result<HttpResponse, StaticFileError> {
        let metadata = std::fs::metadata(path)?;
        let body = if method == Method::HEAD {
            Bytes::new()
        } else {
            Bytes::from(std::fs::read(path)?)
        };

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, detect_mime_type(path))
            .header(header::CONTENT_LENGTH, metadata.len());

        if let Ok(modified) = metadata.modified() {
            builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
        }

        builder
            .body(Full::new(body))
            .map_err(|e| StaticFileError::Io(std::io::Error::other(e)))
    }
}

fn detect_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, StaticFiles) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>phonebook</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets").join("logo.svg"), "<svg/>").unwrap();
        let files = StaticFiles::new(dir.path()).index("index.html");
        (dir, files)
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let (_dir, files) = fixture();
        let response = files.handle("/", &Method::GET).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "18");
        assert!(response.headers().contains_key(header::LAST_MODIFIED));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>phonebook</h1>");
    }

    #[test]
    fn test_mime_by_extension() {
        let (_dir, files) = fixture();
        let js = files.handle("/app.js", &Method::GET).unwrap();
        assert_eq!(js.headers()[header::CONTENT_TYPE], "text/javascript; charset=utf-8");

        let svg = files.handle("/assets/logo.svg", &Method::GET).unwrap();
        assert_eq!(svg.headers()[header::CONTENT_TYPE], "image/svg+xml");

        assert_eq!(detect_mime_type(Path::new("blob.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, files) = fixture();
        let response = files.handle("/app.js", &Method::HEAD).unwrap();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "14");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_rejections() {
        let (_dir, files) = fixture();

        assert!(matches!(
            files.handle("/app.js", &Method::POST),
            Err(StaticFileError::MethodNotAllowed)
        ));
        assert!(matches!(
            files.handle("/../etc/passwd", &Method::GET),
            Err(StaticFileError::Forbidden(_))
        ));
        assert!(matches!(
            files.handle("/.env", &Method::GET),
            Err(StaticFileError::Forbidden(_))
        ));
        assert!(matches!(
            files.handle("/api/persons", &Method::GET),
            Err(StaticFileError::NotFound(_))
        ));
    }

    #[test]
    fn test_directory_without_index() {
        let (_dir, files) = fixture();
        assert!(matches!(
            files.handle("/assets", &Method::GET),
            Err(StaticFileError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let files = StaticFiles::new("/definitely/not/here").index("index.html");
        let err = files.handle("/", &Method::GET).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
