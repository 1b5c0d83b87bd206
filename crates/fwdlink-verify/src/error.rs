//! Verification error types.

use thiserror::Error;

/// Failure of a relevance scorer.
///
/// The pipeline records these per candidate as a `score_error` rejection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The scoring service could not be reached or refused the request.
    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    /// The scorer produced NaN or an infinity.
    #[error("scorer returned non-finite score {0}")]
    NonFinite(f64),
}

/// Failure of a candidate discovery backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("discovery backend unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_error_display() {
        assert!(ScoreError::NonFinite(f64::NAN).to_string().contains("NaN"));
        assert!(ScoreError::Unavailable("503".into())
            .to_string()
            .contains("503"));
    }
}
