//! # Error Types
//!
//! Errors raised while constructing core values. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level error type for core value construction.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A URL could not be parsed or is not an absolute http(s) URL.
    #[error("invalid URL {input:?}: {reason}")]
    InvalidUrl {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A digest string is not 64 lowercase hex characters.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A timestamp is outside the representable range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid_url(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_display_includes_input_and_reason() {
        let err = CoreError::invalid_url("ftp://x", "unsupported scheme");
        let msg = err.to_string();
        assert!(msg.contains("ftp://x"));
        assert!(msg.contains("unsupported scheme"));
    }

    #[test]
    fn float_rejected_display() {
        let err = CanonicalizationError::FloatRejected(0.5);
        assert!(err.to_string().contains("0.5"));
    }

    #[test]
    fn canonicalization_converts_into_core_error() {
        let err: CoreError = CanonicalizationError::FloatRejected(1.5).into();
        assert!(matches!(err, CoreError::Canonicalization(_)));
    }
}
