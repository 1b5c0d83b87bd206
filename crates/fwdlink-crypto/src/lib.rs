//! # fwdlink-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for attestation issuance:
//!
//! - **SHA-256** digests of forward-link URLs (the values embedded in the
//!   certificate extension) and of `CanonicalBytes`.
//! - **RSA** key generation (≥2048-bit modulus, exponent 65537), PEM
//!   import/export, and PKCS#1 v1.5 / SHA-256 signatures.
//!
//! ## Crate Policy
//!
//! - Depends only on `fwdlink-core` internally.
//! - No mocking of cryptographic operations in tests: all tests use real
//!   SHA-256 and real RSA keys.
//! - Private keys never appear in `Debug` output or logs, and exported
//!   private-key PEM is wrapped in `Zeroizing`.

pub mod error;
pub mod rsa;
pub mod sha256;

pub use crate::rsa::{RsaKeyPair, RsaPublicKey, RsaSignature, MIN_KEY_BITS};
pub use error::CryptoError;
pub use sha256::{sha256_digest, url_digest};
