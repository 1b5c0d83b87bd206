//! Fetch error types.

use thiserror::Error;

/// Errors from fetching a page.
///
/// Every variant carries the URL so a pipeline outcome can name the page
/// that failed without extra bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    /// Connection, TLS, or protocol failure.
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response is not a text document.
    #[error("{url} returned non-text content type {content_type:?}")]
    NonText {
        url: String,
        content_type: Option<String>,
    },

    /// The body could not be read.
    #[error("failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// The URL this error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url, .. }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::NonText { url, .. }
            | Self::Body { url, .. } => Some(url),
            Self::Client(_) => None,
        }
    }
}
