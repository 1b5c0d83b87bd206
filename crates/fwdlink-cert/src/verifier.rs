//! # Certificate Verifier
//!
//! Structural verification of a forward-link certificate the caller
//! already holds. Nothing is fetched and no link is re-hashed from live
//! content; see [`ContentReverifier`](crate::ContentReverifier) for that.
//!
//! ## Check Order
//!
//! 1. Parse the PEM certificate: [`CertErrorKind::Malformed`].
//! 2. Verify the self-signature against the embedded public key:
//!    [`CertErrorKind::SignatureInvalid`].
//! 3. `not_before <= now <= not_after`: [`CertErrorKind::NotYetValid`],
//!    [`CertErrorKind::Expired`].
//! 4. Find and decode the link-digest extension:
//!    [`CertErrorKind::ExtensionMissing`], [`CertErrorKind::ExtensionInvalid`].
//!
//! The first failing check is reported. Every field that could be read is
//! still filled in, so an expired certificate still shows its digests.
//!
//! The verifier holds no state and is safe to share across threads.

use std::path::Path;

use fwdlink_core::Timestamp;
use fwdlink_crypto::RsaPublicKey;
use serde::{Deserialize, Serialize};
use x509_cert::der::oid::ObjectIdentifier;
use x509_cert::der::{DecodePem, Encode};
use x509_cert::time::Time;
use x509_cert::Certificate;

use crate::error::CertError;
use crate::extension::{LinkDigestMap, LINK_DIGEST_OID};

/// `sha256WithRSAEncryption`.
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

const LINK_DIGEST: ObjectIdentifier = ObjectIdentifier::new_unwrap(LINK_DIGEST_OID);

/// Structural verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertErrorKind {
    /// Not a parsable PEM X.509 certificate.
    Malformed,
    /// The self-signature does not verify under the embedded key.
    SignatureInvalid,
    NotYetValid,
    Expired,
    /// No link-digest extension.
    ExtensionMissing,
    /// The extension is present but does not decode to a digest map.
    ExtensionInvalid,
}

/// Result of structural verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateStatus {
    pub valid: bool,
    /// Serial number, lowercase hex.
    pub serial: Option<String>,
    pub not_before: Option<Timestamp>,
    pub not_after: Option<Timestamp>,
    /// Embedded public key as SPKI PEM.
    pub public_key_pem: Option<String>,
    /// Decoded extension value.
    pub link_digests: Option<LinkDigestMap>,
    pub error: Option<CertErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CertificateStatus {
    fn failed(kind: CertErrorKind, detail: impl Into<String>) -> Self {
        Self {
            valid: false,
            serial: None,
            not_before: None,
            not_after: None,
            public_key_pem: None,
            link_digests: None,
            error: Some(kind),
            detail: Some(detail.into()),
        }
    }

    /// The decoded extension value, if any.
    pub fn extension_value(&self) -> Option<&LinkDigestMap> {
        self.link_digests.as_ref()
    }
}

/// Stateless structural verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateVerifier;

impl CertificateVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify at the current time.
    pub fn verify(&self, pem: &str) -> CertificateStatus {
        self.verify_at(pem, Timestamp::now())
    }

    /// Verify raw file contents; non-UTF-8 input is `Malformed`.
    pub fn verify_bytes_at(&self, bytes: &[u8], now: Timestamp) -> CertificateStatus {
        match std::str::from_utf8(bytes) {
            Ok(pem) => self.verify_at(pem, now),
            Err(e) => CertificateStatus::failed(CertErrorKind::Malformed, format!("not UTF-8: {e}")),
        }
    }

    /// Read and verify a PEM file at the current time.
    ///
    /// Only an unreadable file is an `Err`.
    pub fn verify_file(&self, path: &Path) -> Result<CertificateStatus, CertError> {
        self.verify_file_at(path, Timestamp::now())
    }

    pub fn verify_file_at(&self, path: &Path, now: Timestamp) -> Result<CertificateStatus, CertError> {
        let bytes = std::fs::read(path).map_err(|source| CertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.verify_bytes_at(&bytes, now))
    }

    /// Verify as of `now`.
    pub fn verify_at(&self, pem: &str, now: Timestamp) -> CertificateStatus {
        let cert = match Certificate::from_pem(pem.trim().as_bytes()) {
            Ok(cert) => cert,
            Err(e) => return CertificateStatus::failed(CertErrorKind::Malformed, e.to_string()),
        };
        let tbs = &cert.tbs_certificate;

        let not_before = match to_timestamp(tbs.validity.not_before) {
            Ok(t) => t,
            Err(e) => return CertificateStatus::failed(CertErrorKind::Malformed, e),
        };
        let not_after = match to_timestamp(tbs.validity.not_after) {
            Ok(t) => t,
            Err(e) => return CertificateStatus::failed(CertErrorKind::Malformed, e),
        };

        let mut errors: Vec<(CertErrorKind, String)> = Vec::new();

        let public_key = tbs
            .subject_public_key_info
            .to_der()
            .map_err(|e| e.to_string())
            .and_then(|der| RsaPublicKey::from_der(&der).map_err(|e| e.to_string()));
        let public_key_pem = match &public_key {
            Ok(pk) => pk.to_pem().ok(),
            Err(_) => None,
        };
        if let Err(detail) = check_self_signature(&cert, public_key.as_ref()) {
            errors.push((CertErrorKind::SignatureInvalid, detail));
        }

        if now < not_before {
            errors.push((
                CertErrorKind::NotYetValid,
                format!("not valid before {not_before}"),
            ));
        } else if now > not_after {
            errors.push((CertErrorKind::Expired, format!("expired at {not_after}")));
        }

        let link_digests = match find_link_extension(&cert) {
            Ok(Some(bytes)) => match LinkDigestMap::decode(bytes) {
                Ok(map) => Some(map),
                Err(e) => {
                    errors.push((CertErrorKind::ExtensionInvalid, e.to_string()));
                    None
                }
            },
            Ok(None) => {
                errors.push((
                    CertErrorKind::ExtensionMissing,
                    format!("no extension {LINK_DIGEST_OID}"),
                ));
                None
            }
            Err(detail) => {
                errors.push((CertErrorKind::ExtensionInvalid, detail));
                None
            }
        };

        let first = errors.into_iter().next();
        CertificateStatus {
            valid: first.is_none(),
            serial: Some(hex::encode(tbs.serial_number.as_bytes())),
            not_before: Some(not_before),
            not_after: Some(not_after),
            public_key_pem,
            link_digests,
            error: first.as_ref().map(|(kind, _)| *kind),
            detail: first.map(|(_, detail)| detail),
        }
    }
}

fn to_timestamp(time: Time) -> Result<Timestamp, String> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|_| "validity time out of range".to_string())?;
    Timestamp::from_epoch_secs(secs).map_err(|e| e.to_string())
}

fn check_self_signature(
    cert: &Certificate,
    public_key: Result<&RsaPublicKey, &String>,
) -> Result<(), String> {
    if cert.signature_algorithm.oid != SHA256_WITH_RSA {
        return Err(format!(
            "unsupported signature algorithm {}",
            cert.signature_algorithm.oid
        ));
    }
    let public_key = public_key.map_err(|e| format!("unusable public key: {e}"))?;
    let tbs_der = cert
        .tbs_certificate
        .to_der()
        .map_err(|e| format!("cannot re-encode TBS certificate: {e}"))?;
    let signature = cert
        .signature
        .as_bytes()
        .ok_or_else(|| "signature has unused bits".to_string())?;
    public_key
        .verify_der(&tbs_der, signature)
        .map_err(|e| e.to_string())
}

/// The raw value of the link-digest extension, if present exactly once.
fn find_link_extension(cert: &Certificate) -> Result<Option<&[u8]>, String> {
    let mut matches = cert
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|ext| ext.extn_id == LINK_DIGEST);
    let first = matches.next();
    if matches.next().is_some() {
        return Err(format!("extension {LINK_DIGEST_OID} appears more than once"));
    }
    Ok(first.map(|ext| ext.extn_value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_malformed() {
        let status = CertificateVerifier::new().verify("not a certificate");
        assert!(!status.valid);
        assert_eq!(status.error, Some(CertErrorKind::Malformed));
        assert!(status.link_digests.is_none());
    }

    #[test]
    fn test_truncated_pem_is_malformed() {
        let pem = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
        let status = CertificateVerifier::new().verify(pem);
        assert_eq!(status.error, Some(CertErrorKind::Malformed));
    }

    #[test]
    fn test_non_utf8_bytes_are_malformed() {
        let status = CertificateVerifier::new().verify_bytes_at(&[0xff, 0xfe, 0x00], Timestamp::now());
        assert_eq!(status.error, Some(CertErrorKind::Malformed));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CertificateVerifier::new()
            .verify_file(Path::new("/nonexistent/fwdlink/cert.pem"))
            .unwrap_err();
        assert!(matches!(err, CertError::Io { .. }));
    }

    #[test]
    fn test_error_kind_serializes_by_name() {
        assert_eq!(
            serde_json::to_string(&CertErrorKind::ExtensionMissing).unwrap(),
            "\"ExtensionMissing\""
        );
    }
}
