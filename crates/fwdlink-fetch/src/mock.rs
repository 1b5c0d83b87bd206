//! In-memory [`PageFetcher`] with canned responses.
//!
//! Unknown URLs fail with a transport error. Every call is recorded so
//! tests can assert which pages were requested and how many fetches ran
//! at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;
use crate::fetcher::{FetchedPage, PageFetcher};

/// A canned response.
#[derive(Debug, Clone)]
pub enum MockPage {
    /// Respond after `delay`.
    Response {
        status: u16,
        content_type: Option<String>,
        body: String,
        delay: Duration,
    },
    /// Fail with [`FetchError::Timeout`].
    Timeout,
    /// Fail with [`FetchError::Transport`].
    Unreachable,
}

/// Fetcher serving [`MockPage`]s by exact URL string.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, MockPage>,
    requested: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `text/html` with status 200.
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_response(url, 200, Some("text/html; charset=utf-8"), body)
    }

    /// Serve `body` as `text/html` with status 200 after `delay`.
    pub fn with_delayed_text(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.pages.insert(
            key(url),
            MockPage::Response {
                status: 200,
                content_type: Some("text/html".into()),
                body: body.into(),
                delay,
            },
        );
        self
    }

    pub fn with_response(
        mut self,
        url: &str,
        status: u16,
        content_type: Option<&str>,
        body: &str,
    ) -> Self {
        self.pages.insert(
            key(url),
            MockPage::Response {
                status,
                content_type: content_type.map(str::to_string),
                body: body.into(),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(key(url), page);
        self
    }

    /// URLs requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Highest number of fetches observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Parse-and-reserialize so `https://A.example` and `https://a.example/`
/// address the same page.
fn key(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        if let Ok(mut r) = self.requested.lock() {
            r.push(url.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.pages.get(url.as_str()) {
            Some(MockPage::Response {
                status,
                content_type,
                body,
                delay,
            }) => {
                if *delay > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(FetchedPage {
                    url: url.to_string(),
                    status: *status,
                    content_type: content_type.clone(),
                    body: body.clone(),
                })
            }
            Some(MockPage::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Some(MockPage::Unreachable) | None => Err(FetchError::Transport {
                url: url.to_string(),
                reason: "unreachable".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_serves_registered_page() {
        let f = MemoryFetcher::new().with_text("https://a.example/x", "hello");
        let page = f
            .fetch(&Url::parse("https://a.example/x").unwrap(), T)
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.into_text().unwrap(), "hello");
        assert_eq!(f.requested(), vec!["https://a.example/x".to_string()]);
    }

    #[tokio::test]
    async fn test_host_only_url_key_normalized() {
        let f = MemoryFetcher::new().with_text("https://a.example", "root");
        assert!(f
            .fetch(&Url::parse("https://a.example/").unwrap(), T)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_url_is_transport_error() {
        let f = MemoryFetcher::new();
        let err = f
            .fetch(&Url::parse("https://nowhere.example/").unwrap(), T)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_delay_beyond_timeout_times_out() {
        let f = MemoryFetcher::new().with_delayed_text(
            "https://slow.example/",
            "late",
            Duration::from_millis(200),
        );
        let err = f
            .fetch(
                &Url::parse("https://slow.example/").unwrap(),
                Duration::from_millis(20),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 20, .. }));
    }
}
