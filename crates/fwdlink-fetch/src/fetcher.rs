//! # Fetch Collaborator Contract
//!
//! `fetch(url, timeout) -> (status_code, content_type, body)`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

/// A fetched page before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value, if present.
    pub content_type: Option<String>,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
}

impl FetchedPage {
    /// True when the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the content type is `text/*`.
    ///
    /// A missing `Content-Type` header counts as non-text.
    pub fn is_text(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/"))
            .unwrap_or(false)
    }

    /// Accept the page as a text document or classify it as a fetch error.
    pub fn into_text(self) -> Result<String, FetchError> {
        if !self.is_success() {
            return Err(FetchError::Status {
                url: self.url,
                status: self.status,
            });
        }
        if !self.is_text() {
            return Err(FetchError::NonText {
                url: self.url,
                content_type: self.content_type,
            });
        }
        Ok(self.body)
    }
}

/// Retrieves raw page content.
///
/// Implementations must be `Send + Sync`: one fetcher is shared across all
/// concurrent fetches of a pipeline run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url, timeout).await
    }
}
