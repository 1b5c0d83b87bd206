//! # HTTP Page Fetcher
//!
//! `reqwest`-backed [`PageFetcher`]. The timeout passed to `fetch` bounds
//! each attempt from connect until the body is read. Bodies longer than
//! `max_body_bytes` are truncated at the cap.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fetcher::{FetchedPage, PageFetcher};
use crate::retry::{retry_send, RetryPolicy};

/// HTTP implementation of [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
    max_body_bytes: usize,
}

impl HttpPageFetcher {
    /// Build the client from `config`.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay,
            },
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn classify(url: &Url, timeout: Duration, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        tracing::debug!(%url, timeout_ms = timeout.as_millis() as u64, "fetching page");

        let mut resp = retry_send(self.retry, || {
            self.client.get(url.clone()).timeout(timeout).send()
        })
        .await
        .map_err(|e| Self::classify(url, timeout, e))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Self::classify(url, timeout, e))?
        {
            let room = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!(%url, cap = self.max_body_bytes, "body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(%url, status, bytes = body.len(), "fetched page");
        Ok(FetchedPage {
            url: final_url,
            status,
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
