//! # fwdlink-cert: Forward-Link Certificates
//!
//! Issuance and verification of the artifacts that bind a source to its
//! verified forward links:
//!
//! - a self-signed X.509 certificate (RSA-2048, SHA-256) whose non-critical
//!   extension `1.3.6.1.4.1.99999.1` maps positional index to the SHA-256 of
//!   each verified URL;
//! - a signed attestation payload for the source URL, valid for one hour.
//!
//! ## Modules
//!
//! - [`extension`]: link-digest extension codec.
//! - [`payload`]: attestation payload, signing and verification.
//! - [`issuer`]: key generation, certificate building, self-check.
//! - [`verifier`]: structural verification, never touches the network.
//! - [`reverify`]: content-level re-verification against live pages.
//!
//! This is not a PKI. There are no chains, no revocation, and no
//! intermediate authorities; each certificate is its own issuer.

pub mod error;
pub mod extension;
pub mod issuer;
pub mod payload;
pub mod reverify;
pub mod verifier;

pub use error::{AttestationError, CertError};
pub use extension::{ExtensionDecodeError, LinkDigestMap, LINK_DIGEST_OID};
pub use issuer::{
    CertificateIssuer, IssuedCertificate, IssuerConfig, KeyDisclosure, ATTESTATION_TTL_SECS,
    CERTIFICATE_VALIDITY_DAYS, DEFAULT_KEY_BITS,
};
pub use payload::{AttestationPayload, SignedAttestation, ATTESTATION_METHOD};
pub use reverify::{ContentReverifier, EntryStatus, ReverificationReport, ReverifiedEntry};
pub use verifier::{CertErrorKind, CertificateStatus, CertificateVerifier};
