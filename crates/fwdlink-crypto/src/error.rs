//! # Cryptographic Error Types
//!
//! Structured errors for all cryptographic operations in `fwdlink-crypto`.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// RSA key generation failed. Not retried: entropy exhaustion is not a
    /// transient condition at this layer.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Requested modulus size is below the minimum.
    #[error("RSA modulus of {bits} bits is below the {min}-bit minimum")]
    KeyTooSmall {
        /// Requested size.
        bits: usize,
        /// Minimum accepted size.
        min: usize,
    },

    /// A public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A private key could not be decoded.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Key material could not be encoded.
    #[error("key encoding failed: {0}")]
    Encoding(String),

    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature did not verify against the given key and message.
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    /// A signature string is not valid base64.
    #[error("invalid signature encoding: {0}")]
    SignatureEncoding(String),
}
