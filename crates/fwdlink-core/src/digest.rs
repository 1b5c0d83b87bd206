//! # Content Digest
//!
//! Defines `ContentDigest`, the 32-byte SHA-256 value embedded in
//! certificate extensions and attestation payloads. Computation lives in
//! `fwdlink-crypto`; this module only owns the value type and its
//! lowercase-hex wire form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A SHA-256 content digest.
///
/// Serializes as a 64-character lowercase hex string, the form used in the
/// certificate extension (`{"0": "<hex>"}`) and in the attestation
/// payload's `hash` field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a digest from exactly 64 lowercase hex characters.
    ///
    /// Uppercase hex is rejected: the extension format is lowercase-only,
    /// and accepting both would give one digest two encodings.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != 64 {
            return Err(CoreError::InvalidDigest(format!(
                "expected 64 hex chars, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CoreError::InvalidDigest(format!(
                "not lowercase hex: {s:?}"
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hex_roundtrip() {
        let d = ContentDigest::from_hex(EMPTY_SHA256).unwrap();
        assert_eq!(d.to_hex(), EMPTY_SHA256);
        assert_eq!(d.to_string(), EMPTY_SHA256);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(ContentDigest::from_hex("abcd").is_err());
        assert!(ContentDigest::from_hex(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_uppercase_rejected() {
        assert!(ContentDigest::from_hex(&EMPTY_SHA256.to_uppercase()).is_err());
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(ContentDigest::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let d = ContentDigest::from_hex(EMPTY_SHA256).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{EMPTY_SHA256}\""));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_debug_shows_hex() {
        let d = ContentDigest::from_bytes([0u8; 32]);
        assert_eq!(format!("{d:?}"), format!("ContentDigest({})", "0".repeat(64)));
    }
}
