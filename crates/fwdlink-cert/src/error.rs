//! # Certificate Error Types
//!
//! [`CertError`] is for failures the caller must handle: issuance that
//! could not complete, or a certificate file that could not be read.
//! Expected verification failures (malformed, expired, missing extension)
//! are not errors; they come back inside a
//! [`CertificateStatus`](crate::CertificateStatus).

use std::path::PathBuf;

use fwdlink_core::{CanonicalizationError, Timestamp};
use fwdlink_crypto::CryptoError;
use thiserror::Error;

/// Errors from issuance and certificate I/O.
#[derive(Error, Debug)]
pub enum CertError {
    /// Key generation, encoding, or signing failed. Key generation failure
    /// is fatal and never retried.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The certificate builder rejected the parameters or failed to sign.
    #[error("certificate generation failed: {0}")]
    Generation(String),

    /// The attestation payload could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Issuer settings are unusable.
    #[error("invalid issuer configuration: {0}")]
    Config(String),

    /// The freshly issued certificate did not pass its own verification.
    #[error("issued certificate failed self-check: {0}")]
    SelfCheck(String),

    /// A certificate file could not be read.
    #[error("failed to read certificate {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate carries no decodable link digests to compare against.
    #[error("certificate has no decodable link digests: {0}")]
    NoLinkDigests(String),
}

/// Errors from verifying a signed attestation payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    /// The signature does not verify under the given public key.
    #[error("attestation signature invalid: {0}")]
    SignatureInvalid(String),

    /// `now` is past the payload's `exp`.
    #[error("attestation expired at {exp} (now {now})")]
    Expired { exp: Timestamp, now: Timestamp },

    /// `now` is before the payload's `iat`.
    #[error("attestation not valid until {iat} (now {now})")]
    NotYetValid { iat: Timestamp, now: Timestamp },

    /// The payload is internally inconsistent (bad timestamps, hash that
    /// does not match the URL, unknown method).
    #[error("malformed attestation: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation_error_passes_through() {
        let err: CertError = CryptoError::KeyGeneration("entropy".into()).into();
        assert!(matches!(err, CertError::Crypto(CryptoError::KeyGeneration(_))));
        assert_eq!(err.to_string(), "key generation failed: entropy");
    }

    #[test]
    fn test_expired_display_names_both_times() {
        let exp = Timestamp::from_epoch_secs(1_768_478_400).unwrap();
        let now = Timestamp::from_epoch_secs(1_768_482_001).unwrap();
        let msg = AttestationError::Expired { exp, now }.to_string();
        assert!(msg.contains("2026-01-15T12:00:00Z"));
        assert!(msg.contains("2026-01-15T13:00:01Z"));
    }
}
