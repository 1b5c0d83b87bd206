//! # Attestation Payload
//!
//! A signed, time-bounded claim about the source URL itself:
//!
//! ```json
//! {"url": "https://example.org", "hash": "<sha256 hex of url>",
//!  "method": "llm-verify", "iat": 1768478400, "exp": 1768482000}
//! ```
//!
//! ## Security Invariant
//!
//! The signing input is the JCS canonical form of the payload (sorted keys,
//! no insignificant whitespace), produced by [`CanonicalBytes::new()`]. A
//! relying party who re-serializes the payload the same way gets the exact
//! signed bytes; [`AttestationPayload::signing_input()`] exposes them.

use chrono::Duration;
use fwdlink_core::{CanonicalBytes, CanonicalizationError, ContentDigest, SourceIdentity, Timestamp};
use fwdlink_crypto::{url_digest, RsaKeyPair, RsaPublicKey, RsaSignature};
use serde::{Deserialize, Serialize};

use crate::error::{AttestationError, CertError};

/// The `method` tag of every payload this crate issues.
pub const ATTESTATION_METHOD: &str = "llm-verify";

/// The unsigned attestation claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationPayload {
    /// Canonical source URL.
    pub url: String,
    /// SHA-256 of the `url` bytes.
    pub hash: ContentDigest,
    pub method: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expires-at, Unix seconds.
    pub exp: i64,
}

impl AttestationPayload {
    /// Build a payload for `source` valid from `issued_at` for `ttl`.
    pub fn new(source: &SourceIdentity, issued_at: Timestamp, ttl: Duration) -> Self {
        let url = source.as_str().to_string();
        Self {
            hash: url_digest(&url),
            url,
            method: ATTESTATION_METHOD.to_string(),
            iat: issued_at.epoch_secs(),
            exp: issued_at.plus(ttl).epoch_secs(),
        }
    }

    /// The exact bytes that are signed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Structural checks independent of any key or clock.
    pub fn check_consistency(&self) -> Result<(), AttestationError> {
        if self.iat >= self.exp {
            return Err(AttestationError::Malformed(format!(
                "iat {} is not before exp {}",
                self.iat, self.exp
            )));
        }
        if self.method != ATTESTATION_METHOD {
            return Err(AttestationError::Malformed(format!(
                "unknown method {:?}",
                self.method
            )));
        }
        if self.hash != url_digest(&self.url) {
            return Err(AttestationError::Malformed(
                "hash does not match url".to_string(),
            ));
        }
        Ok(())
    }
}

/// A payload plus its detached PKCS#1 v1.5 / SHA-256 signature (base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttestation {
    pub payload: AttestationPayload,
    pub signature: RsaSignature,
}

impl SignedAttestation {
    /// Sign `payload` with `key`.
    pub fn sign(payload: AttestationPayload, key: &RsaKeyPair) -> Result<Self, CertError> {
        let input = payload.signing_input()?;
        let signature = key.sign(&input)?;
        Ok(Self { payload, signature })
    }

    /// [`verify_at`](Self::verify_at) with the current time.
    pub fn verify(&self, public_key: &RsaPublicKey) -> Result<(), AttestationError> {
        self.verify_at(public_key, Timestamp::now())
    }

    /// Check the signature, then consistency, then `iat <= now <= exp`.
    pub fn verify_at(
        &self,
        public_key: &RsaPublicKey,
        now: Timestamp,
    ) -> Result<(), AttestationError> {
        let input = self
            .payload
            .signing_input()
            .map_err(|e| AttestationError::Malformed(e.to_string()))?;
        public_key
            .verify(&input, &self.signature)
            .map_err(|e| AttestationError::SignatureInvalid(e.to_string()))?;

        self.payload.check_consistency()?;

        let iat = Timestamp::from_epoch_secs(self.payload.iat)
            .map_err(|e| AttestationError::Malformed(e.to_string()))?;
        let exp = Timestamp::from_epoch_secs(self.payload.exp)
            .map_err(|e| AttestationError::Malformed(e.to_string()))?;
        if now < iat {
            return Err(AttestationError::NotYetValid { iat, now });
        }
        if now > exp {
            return Err(AttestationError::Expired { exp, now });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn keys() -> &'static (RsaKeyPair, RsaKeyPair) {
        static KEYS: OnceLock<(RsaKeyPair, RsaKeyPair)> = OnceLock::new();
        KEYS.get_or_init(|| {
            (
                RsaKeyPair::generate(2048).unwrap(),
                RsaKeyPair::generate(2048).unwrap(),
            )
        })
    }

    fn t0() -> Timestamp {
        Timestamp::from_epoch_secs(1_768_478_400).unwrap()
    }

    fn payload() -> AttestationPayload {
        AttestationPayload::new(
            &SourceIdentity::parse("https://example.org").unwrap(),
            t0(),
            Duration::hours(1),
        )
    }

    #[test]
    fn test_payload_fields() {
        let p = payload();
        assert_eq!(p.url, "https://example.org");
        assert_eq!(
            p.hash.to_hex(),
            "50d7a905e3046b88638362cc34a31a1ae534766ca55e3aa397951efe653b062b"
        );
        assert_eq!(p.method, "llm-verify");
        assert_eq!(p.iat, 1_768_478_400);
        assert_eq!(p.exp, 1_768_482_000);
    }

    #[test]
    fn test_signing_input_is_sorted_compact_json() {
        let text = String::from_utf8(payload().signing_input().unwrap().as_bytes().to_vec()).unwrap();
        assert_eq!(
            text,
            "{\"exp\":1768482000,\
             \"hash\":\"50d7a905e3046b88638362cc34a31a1ae534766ca55e3aa397951efe653b062b\",\
             \"iat\":1768478400,\"method\":\"llm-verify\",\"url\":\"https://example.org\"}"
        );
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let (key, _) = keys();
        let signed = SignedAttestation::sign(payload(), key).unwrap();
        assert!(signed.verify_at(&key.public_key(), t0()).is_ok());
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let (key, other) = keys();
        let signed = SignedAttestation::sign(payload(), key).unwrap();
        assert!(matches!(
            signed.verify_at(&other.public_key(), t0()),
            Err(AttestationError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_tampered_payload_is_signature_invalid() {
        let (key, _) = keys();
        let mut signed = SignedAttestation::sign(payload(), key).unwrap();
        signed.payload.exp += 86_400;
        assert!(matches!(
            signed.verify_at(&key.public_key(), t0()),
            Err(AttestationError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_time_window() {
        let (key, _) = keys();
        let signed = SignedAttestation::sign(payload(), key).unwrap();
        let pk = key.public_key();
        assert!(signed.verify_at(&pk, t0().plus(Duration::hours(1))).is_ok());
        assert!(matches!(
            signed.verify_at(&pk, t0().plus(Duration::seconds(3601))),
            Err(AttestationError::Expired { .. })
        ));
        assert!(matches!(
            signed.verify_at(&pk, t0().minus(Duration::seconds(1))),
            Err(AttestationError::NotYetValid { .. })
        ));
    }

    #[test]
    fn test_inconsistent_payload_rejected_even_if_signed() {
        let (key, _) = keys();
        let mut p = payload();
        p.hash = url_digest("https://attacker.example");
        let signed = SignedAttestation::sign(p, key).unwrap();
        assert!(matches!(
            signed.verify_at(&key.public_key(), t0()),
            Err(AttestationError::Malformed(_))
        ));
    }

    #[test]
    fn test_json_shape() {
        let (key, _) = keys();
        let signed = SignedAttestation::sign(payload(), key).unwrap();
        let v = serde_json::to_value(&signed).unwrap();
        assert_eq!(v["payload"]["method"], "llm-verify");
        assert!(v["payload"]["iat"].is_i64());
        assert!(v["signature"].is_string());
        let back: SignedAttestation = serde_json::from_value(v).unwrap();
        assert_eq!(back, signed);
    }
}
