//! Contact identifiers.
//!
//! A [`ContactId`] has the document-store object id layout:
//!
//! | Bytes | Content |
//! |---|---|
//! | 0..4 | Unix seconds, big-endian |
//! | 4..9 | Per-process random value |
//! | 9..12 | Wrapping counter, big-endian |
//!
//! Ids render as 24 lowercase hex digits and order by creation time.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::StoreError;

/// Length of an id in bytes.
pub const ID_LEN: usize = 12;

/// Length of the hex rendering of an id.
pub const ID_HEX_LEN: usize = ID_LEN * 2;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

struct ProcessSeed {
    random: [u8; 5],
    counter: AtomicU32,
}

fn process_seed() -> &'static ProcessSeed {
    static SEED: OnceLock<ProcessSeed> = OnceLock::new();
    SEED.get_or_init(|| {
        // The tail of a v7 uuid is random; the head is a timestamp.
        let random_source = Uuid::now_v7();
        let counter_source = Uuid::now_v7();
        let r = random_source.as_bytes();
        let c = counter_source.as_bytes();

        ProcessSeed {
            random: [r[11], r[12], r[13], r[14], r[15]],
            counter: AtomicU32::new(u32::from_be_bytes([0, c[13], c[14], c[15]])),
        }
    })
}

/// Store-assigned contact identifier.
///
/// # Example
///
/// ```
/// use phonebook_core::ContactId;
///
/// let id = ContactId::generate();
/// let parsed: ContactId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
///
/// assert!("not-an-id".parse::<ContactId>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId([u8; ID_LEN]);

impl ContactId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);

        let seed = process_seed();
        let count = seed.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&seed.random);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Creates an id from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Returns the creation time in Unix seconds.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Parses a 24-digit hex string (either case).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cast`] if the input is not exactly 24 hex digits.
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        let raw = value.as_bytes();
        if raw.len() != ID_HEX_LEN {
            return Err(StoreError::cast(value));
        }

        let mut bytes = [0u8; ID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or_else(|| StoreError::cast(value))?;
            let lo = hex_value(pair[1]).ok_or_else(|| StoreError::cast(value))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for ContactId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContactId({self})")
    }
}

impl Serialize for ContactId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_generate_is_24_lowercase_hex() {
        let id = ContactId::generate().to_string();
        assert_eq!(id.len(), ID_HEX_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generate_unique_and_ordered() {
        let ids: Vec<_> = (0..1000).map(|_| ContactId::generate()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_parse_all_zeroes() {
        let id = ContactId::parse("000000000000000000000000").unwrap();
        assert_eq!(id.as_bytes(), &[0u8; ID_LEN]);
        assert_eq!(id.timestamp(), 0);
    }

    #[test]
    fn test_parse_uppercase_normalizes() {
        let id = ContactId::parse("65A1B2C3D4E5F60718293A4B").unwrap();
        assert_eq!(id.to_string(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "not-an-id", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "0000000000000000000000000"] {
            let err = ContactId::parse(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Cast, "{bad:?} should be a cast error");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let id = ContactId::parse("0123456789abcdef01234567").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""0123456789abcdef01234567""#);

        let back: ContactId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_timestamp_is_recent() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let ts = u64::from(ContactId::generate().timestamp());
        assert!(now.abs_diff(ts) <= 1);
    }

    proptest! {
        #[test]
        fn prop_any_bytes_survive_display_and_parse(bytes in any::<[u8; ID_LEN]>()) {
            let id = ContactId::from_bytes(bytes);
            prop_assert_eq!(ContactId::parse(&id.to_string()).unwrap(), id);
        }

        #[test]
        fn prop_wrong_length_is_cast_error(s in "[0-9a-f]{0,23}|[0-9a-f]{25,40}") {
            prop_assert!(ContactId::parse(&s).is_err());
        }
    }
}
