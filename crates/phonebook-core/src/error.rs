//! Error types for the contact store.
//!
//! [`StoreError`] is what every [`ContactRepository`](crate::ContactRepository)
//! operation fails with. The HTTP layer inspects [`StoreError::kind`] to pick a
//! response; nothing else should match on the variants.

use thiserror::Error;

use crate::schema::FieldViolation;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The identifier is not structurally valid for the store.
    Cast,
    /// A candidate violates the schema.
    Validation,
    /// Anything else (I/O, serialization, poisoned state).
    Backend,
}

/// Errors raised by the contact store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The identifier could not be cast to a [`ContactId`](crate::ContactId).
    #[error("Cast to ObjectId failed for value \"{value}\"")]
    Cast {
        /// The rejected identifier.
        value: String,
    },

    /// A candidate contact violates the schema.
    #[error("{message}")]
    Validation {
        /// Human-readable message, suitable for clients.
        message: String,
        /// The individual violations, in field order.
        violations: Vec<FieldViolation>,
    },

    /// The backing store failed.
    #[error("store backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates a cast error for the given identifier.
    #[must_use]
    pub fn cast(value: impl Into<String>) -> Self {
        Self::Cast {
            value: value.into(),
        }
    }

    /// Creates a validation error with a single message and no field detail.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Creates a validation error from field violations.
    ///
    /// The message is `"{prefix}: field: msg, field: msg"`.
    #[must_use]
    pub fn from_violations(prefix: &str, violations: Vec<FieldViolation>) -> Self {
        let detail = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::Validation {
            message: format!("{prefix}: {detail}"),
            violations,
        }
    }

    /// Creates a backend error without a source.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Cast { .. } => ErrorKind::Cast,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Returns the field violations of a validation error.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Backend {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Backend {
            message: format!("invalid store data: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_error() {
        let err = StoreError::cast("not-an-id");
        assert_eq!(err.kind(), ErrorKind::Cast);
        assert!(err.to_string().contains("not-an-id"));
    }

    #[test]
    fn test_validation_message_is_display() {
        let err = StoreError::validation("name: Path `name` is required.");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "name: Path `name` is required.");
        assert!(err.violations().is_empty());
    }

    #[test]
    fn test_from_violations_joins_fields() {
        let err = StoreError::from_violations(
            "Person validation failed",
            vec![
                FieldViolation::new("name", "Path `name` is required."),
                FieldViolation::new("number", "Path `number` is required."),
            ],
        );
        assert_eq!(
            err.to_string(),
            "Person validation failed: name: Path `name` is required., number: Path `number` is required."
        );
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_io_error_is_backend() {
        let err: StoreError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(std::error::Error::source(&err).is_some());
    }
}
