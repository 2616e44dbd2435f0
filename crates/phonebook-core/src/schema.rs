//! Store-enforced schema rules for contacts.
//!
//! Validation lives with the store, not the request handlers: every
//! repository runs [`ContactSchema::validate_new`] on create and
//! [`ContactSchema::validate_update`] on update, so a malformed number is
//! rejected no matter which route submitted it.
//!
//! # Rules
//!
//! - `name`: required, at least 3 characters
//! - `number`: required, at least 8 characters, two or three digits, a hyphen,
//!   then one or more digits (`040-123456`, `09-1234556`)
//!
//! # Example
//!
//! ```
//! use phonebook_core::{ContactFields, ContactSchema};
//!
//! let schema = ContactSchema::default();
//! assert!(schema.validate_new(&ContactFields::new("Ada", "040-123456")).is_ok());
//!
//! let err = schema
//!     .validate_new(&ContactFields::new("Ada", "12345678"))
//!     .unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Person validation failed: number: `12345678` is not a valid phone number!"
//! );
//! ```

use std::fmt;

use regex::Regex;

use crate::contact::ContactFields;
use crate::error::StoreError;

/// Default minimum name length, in characters.
pub const DEFAULT_NAME_MIN_LEN: usize = 3;

/// Default minimum number length, in characters.
pub const DEFAULT_NUMBER_MIN_LEN: usize = 8;

/// Default phone number pattern. ASCII digits only.
pub const DEFAULT_NUMBER_PATTERN: &str = r"^[0-9]{2,3}-[0-9]+$";

const CREATE_PREFIX: &str = "Person validation failed";
const UPDATE_PREFIX: &str = "Validation failed";

/// A single rule violation on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// The offending field (`name` or `number`).
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl FieldViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation rules applied by the store.
#[derive(Debug, Clone)]
pub struct ContactSchema {
    name_min_len: usize,
    number_min_len: usize,
    number_pattern: Regex,
}

impl Default for ContactSchema {
    fn default() -> Self {
        Self {
            name_min_len: DEFAULT_NAME_MIN_LEN,
            number_min_len: DEFAULT_NUMBER_MIN_LEN,
            number_pattern: default_number_pattern(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_number_pattern() -> Regex {
    Regex::new(DEFAULT_NUMBER_PATTERN).expect("default number pattern is valid")
}

impl ContactSchema {
    /// Creates a schema with the default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum name length.
    #[must_use]
    pub fn name_min_len(mut self, len: usize) -> Self {
        self.name_min_len = len;
        self
    }

    /// Sets the minimum number length.
    #[must_use]
    pub fn number_min_len(mut self, len: usize) -> Self {
        self.number_min_len = len;
        self
    }

    /// Replaces the number pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn number_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.number_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    /// Returns `true` if `number` has a recognized phone-number shape.
    ///
    /// Only the pattern is checked, not the length.
    #[must_use]
    pub fn is_valid_number(&self, number: &str) -> bool {
        self.number_pattern.is_match(number)
    }

    /// Checks a create candidate. Both fields are required.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] listing every violation.
    pub fn validate_new(&self, candidate: &ContactFields) -> Result<(), StoreError> {
        let violations: Vec<_> = [
            self.check_name(candidate.name()),
            self.check_number(candidate.number()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(StoreError::from_violations(CREATE_PREFIX, violations))
        }
    }

    /// Checks an update patch. Only supplied fields are checked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] listing every violation.
    pub fn validate_update(&self, fields: &ContactFields) -> Result<(), StoreError> {
        let violations: Vec<_> = [
            fields.name.as_ref().and_then(|n| self.check_name(Some(n))),
            fields.number.as_ref().and_then(|n| self.check_number(Some(n))),
        ]
        .into_iter()
        .flatten()
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(StoreError::from_violations(UPDATE_PREFIX, violations))
        }
    }

    /// Error for a rename onto a name owned by another contact.
    #[must_use]
    pub fn name_taken(name: &str) -> StoreError {
        StoreError::from_violations(
            UPDATE_PREFIX,
            vec![FieldViolation::new("name", format!("`{name}` is already taken."))],
        )
    }

    fn check_name(&self, name: Option<&str>) -> Option<FieldViolation> {
        let name = match name {
            Some(n) if !n.is_empty() => n,
            _ => return Some(required("name")),
        };

        if name.chars().count() < self.name_min_len {
            return Some(too_short("name", name, self.name_min_len));
        }
        None
    }

    fn check_number(&self, number: Option<&str>) -> Option<FieldViolation> {
        let number = match number {
            Some(n) if !n.is_empty() => n,
            _ => return Some(required("number")),
        };

        if number.chars().count() < self.number_min_len {
            return Some(too_short("number", number, self.number_min_len));
        }
        if !self.is_valid_number(number) {
            return Some(FieldViolation::new(
                "number",
                format!("`{number}` is not a valid phone number!"),
            ));
        }
        None
    }
}

fn required(field: &'static str) -> FieldViolation {
    FieldViolation::new(field, format!("Path `{field}` is required."))
}

fn too_short(field: &'static str, value: &str, min: usize) -> FieldViolation {
    FieldViolation::new(
        field,
        format!("Path `{field}` (`{value}`) is shorter than the minimum allowed length ({min})."),
    )
}
