//! # Link-Digest Extension
//!
//! The custom certificate extension binding a certificate to its verified
//! link set.
//!
//! - OID: `1.3.6.1.4.1.99999.1`, non-critical.
//! - Value: compact UTF-8 JSON mapping positional index to the lowercase
//!   hex SHA-256 of the link URL, written in index order:
//!   `{"0":"3a7f...","1":"9c21..."}`.
//!
//! Index `i` is position `i` in the verified link set at issuance. The map
//! is positional evidence, so decoding requires the keys to be exactly
//! `"0"` through `"n-1"`, each appearing once.

use std::collections::HashMap;
use std::fmt;

use fwdlink_core::{ContentDigest, ForwardLink};
use fwdlink_crypto::url_digest;
use serde::de::{self, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Dotted form of the extension OID.
pub const LINK_DIGEST_OID: &str = "1.3.6.1.4.1.99999.1";

/// Arcs of the extension OID, as the certificate builder takes them.
pub const LINK_DIGEST_OID_ARCS: [u64; 8] = [1, 3, 6, 1, 4, 1, 99999, 1];

/// Why an extension value failed to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionDecodeError {
    #[error("extension value is not JSON: {0}")]
    NotJson(String),

    #[error("extension value is not a JSON object")]
    NotAnObject,

    /// The same key appears twice in the object.
    #[error("duplicate key {0:?} in link digest map")]
    DuplicateKey(String),

    /// Keys are not exactly `"0"..="n-1"`.
    #[error("index {0} missing from link digest map")]
    MissingIndex(usize),

    #[error("digest at index {index} is not a string")]
    NotAString { index: usize },

    #[error("digest at index {index} is invalid: {reason}")]
    InvalidDigest { index: usize, reason: String },
}

/// Ordered SHA-256 digests of the verified link URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinkDigestMap(Vec<ContentDigest>);

impl LinkDigestMap {
    /// Digest each link's normalized URL, preserving order.
    pub fn from_links<'a>(links: impl IntoIterator<Item = &'a ForwardLink>) -> Self {
        Self(links.into_iter().map(|l| url_digest(l.as_str())).collect())
    }

    pub fn from_digests(digests: Vec<ContentDigest>) -> Self {
        Self(digests)
    }

    pub fn digests(&self) -> &[ContentDigest] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&ContentDigest> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of `digest`, if present.
    pub fn position(&self, digest: &ContentDigest) -> Option<usize> {
        self.0.iter().position(|d| d == digest)
    }

    /// The extension value bytes: the [`Serialize`] form as compact JSON.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse and validate extension value bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExtensionDecodeError> {
        let raw: RawObject = serde_json::from_slice(bytes)
            .map_err(|e| ExtensionDecodeError::NotJson(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawObject) -> Result<Self, ExtensionDecodeError> {
        let entries = raw.0.ok_or(ExtensionDecodeError::NotAnObject)?;
        let mut map = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            if map.contains_key(&key) {
                return Err(ExtensionDecodeError::DuplicateKey(key));
            }
            map.insert(key, value);
        }
        // With `len` distinct keys all present as "0".."len-1", there is no
        // room for any other key.
        let mut digests = Vec::with_capacity(map.len());
        for index in 0..map.len() {
            let entry = map
                .get(&index.to_string())
                .ok_or(ExtensionDecodeError::MissingIndex(index))?;
            let hex = entry
                .as_str()
                .ok_or(ExtensionDecodeError::NotAString { index })?;
            let digest = ContentDigest::from_hex(hex).map_err(|e| {
                ExtensionDecodeError::InvalidDigest {
                    index,
                    reason: e.to_string(),
                }
            })?;
            digests.push(digest);
        }
        Ok(Self(digests))
    }
}

/// Object entries in document order with duplicates kept, or `None` for
/// any other JSON value.
struct RawObject(Option<Vec<(String, serde_json::Value)>>);

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawObjectVisitor)
    }
}

struct RawObjectVisitor;

impl<'de> Visitor<'de> for RawObjectVisitor {
    type Value = RawObject;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawObject, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = access.next_entry::<String, serde_json::Value>()? {
            entries.push(entry);
        }
        Ok(RawObject(Some(entries)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<RawObject, A::Error> {
        while access.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawObject(None))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawObject, E> {
        Ok(RawObject(None))
    }
}

impl Serialize for LinkDigestMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, digest) in self.0.iter().enumerate() {
            map.serialize_entry(&i.to_string(), &digest.to_hex())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LinkDigestMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawObject::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(D::Error::custom)
    }
}
