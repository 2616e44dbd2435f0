//! The contact record and its candidate fields.

use serde::{Deserialize, Serialize};

use crate::id::ContactId;

/// A stored phonebook entry.
///
/// Serializes as `{"id": "...", "name": "...", "number": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned identifier.
    pub id: ContactId,
    /// Unique display name.
    pub name: String,
    /// Phone number.
    pub number: String,
}

impl Contact {
    /// Returns a copy with the supplied fields applied.
    #[must_use]
    pub fn merged(&self, fields: &ContactFields) -> Self {
        Self {
            id: self.id,
            name: fields.name.clone().unwrap_or_else(|| self.name.clone()),
            number: fields.number.clone().unwrap_or_else(|| self.number.clone()),
        }
    }
}

/// Candidate fields submitted by a client.
///
/// Used both as a create candidate and as an update patch. Both fields are
/// optional so that missing values reach the schema, which rejects them with
/// a validation message rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    /// Submitted name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Submitted number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl ContactFields {
    /// Creates fields with both values set.
    #[must_use]
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: Some(number.into()),
        }
    }

    /// Returns the submitted name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the submitted number, if any.
    #[must_use]
    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_json_shape() {
        let contact = Contact {
            id: ContactId::parse("0123456789abcdef01234567").unwrap(),
            name: "Ada".to_string(),
            number: "040-123456".to_string(),
        };

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "0123456789abcdef01234567",
                "name": "Ada",
                "number": "040-123456"
            })
        );
    }

    #[test]
    fn test_fields_tolerate_missing_values() {
        let fields: ContactFields = serde_json::from_str(r#"{"number":"09-999999"}"#).unwrap();
        assert_eq!(fields.name(), None);
        assert_eq!(fields.number(), Some("09-999999"));

        let empty: ContactFields = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ContactFields::default());
    }

    #[test]
    fn test_fields_ignore_unknown_keys() {
        let fields: ContactFields =
            serde_json::from_str(r#"{"name":"Ada","number":"040-123456","id":"x"}"#).unwrap();
        assert_eq!(fields, ContactFields::new("Ada", "040-123456"));
    }

    #[test]
    fn test_merged_keeps_omitted_fields() {
        let contact = Contact {
            id: ContactId::generate(),
            name: "Ada".to_string(),
            number: "040-123456".to_string(),
        };

        let merged = contact.merged(&ContactFields {
            name: None,
            number: Some("09-999999".to_string()),
        });

        assert_eq!(merged.id, contact.id);
        assert_eq!(merged.name, "Ada");
        assert_eq!(merged.number, "09-999999");
    }
}
