//! Vote receipt hash type.
//!
//! A receipt hash is a one-way SHA-256 digest over the cast vote's
//! identifying inputs plus the cast timestamp. It proves a vote was
//! recorded without revealing the voter to anyone who only holds the
//! hash. It is a correlation-resistant identifier, not a formal
//! ballot-secrecy guarantee.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte vote receipt hash, rendered as lowercase hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiptHash([u8; 32]);

impl ReceiptHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character lowercase/uppercase hex string.
    pub fn parse_hex(s: &str) -> Result<Self, ReceiptHashParseError> {
        let bytes = hex::decode(s).map_err(|_| ReceiptHashParseError)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| ReceiptHashParseError)?;
        Ok(Self(arr))
    }
}

/// Error returned when a string is not a valid 64-hex-digit receipt hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptHashParseError;

impl fmt::Display for ReceiptHashParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid receipt hash: expected 64 hex digits")
    }
}

impl std::error::Error for ReceiptHashParseError {}

// Abbreviated form for logs; the full hash is 64 characters.
impl fmt::Debug for ReceiptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReceiptHash({}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ReceiptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ReceiptHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ReceiptHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hash = ReceiptHash::new([0xAB; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(ReceiptHash::parse_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ReceiptHash::parse_hex("abcd").is_err());
        assert!(ReceiptHash::parse_hex(&"ab".repeat(33)).is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(ReceiptHash::parse_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn serde_as_hex_string() {
        let hash = ReceiptHash::new([1; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: ReceiptHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
