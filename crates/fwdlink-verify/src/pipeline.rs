//! # Link Verification Pipeline
//!
//! For one source and its claimed forward links: fetch the source page,
//! then fetch and score every candidate with at most `concurrency` fetches
//! in flight, and gather a [`PipelineReport`].
//!
//! ## Failure Model
//!
//! - A candidate that cannot be fetched is rejected with `fetch_error`.
//!   The other candidates are still evaluated.
//! - A source page that cannot be fetched rejects every candidate with
//!   `source_fetch_error`.
//! - Every fetch is bounded by `fetch_timeout`, whatever the fetcher does.
//!
//! ## Ordering and Interruption
//!
//! Outcomes, and therefore the verified set, are in completion order. When
//! the shutdown future passed to
//! [`verify_forward_links_until`](LinkVerifier::verify_forward_links_until)
//! resolves, candidates still in flight are abandoned and the outcomes
//! already gathered are returned with `interrupted = true`.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use fwdlink_core::{ForwardLink, SourceIdentity};
use fwdlink_fetch::{FetchError, PageFetcher};
use url::Url;

use crate::normalize::extract_text;
use crate::outcome::{OutcomeReason, PipelineReport, VerificationOutcome};
use crate::relevance::{Relevance, RelevanceConfig, RelevanceVerifier};
use crate::scorer::RelevanceScorer;

/// Simultaneous candidate fetches.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Values below 1 are treated as 1.
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    pub relevance: RelevanceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            relevance: RelevanceConfig::default(),
        }
    }
}

/// Runs the fetch, normalize, score sequence for a batch of candidates.
///
/// Holds no per-run state; one instance can serve many runs.
#[derive(Debug)]
pub struct LinkVerifier<F, S> {
    fetcher: F,
    relevance: RelevanceVerifier<S>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl<F: PageFetcher, S: RelevanceScorer> LinkVerifier<F, S> {
    pub fn new(fetcher: F, scorer: S, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            relevance: RelevanceVerifier::new(scorer, config.relevance),
            concurrency: config.concurrency.max(1),
            fetch_timeout: config.fetch_timeout,
        }
    }

    pub fn relevance(&self) -> &RelevanceVerifier<S> {
        &self.relevance
    }

    /// Verify every candidate against `source`.
    pub async fn verify_forward_links(
        &self,
        source: &SourceIdentity,
        candidates: &[ForwardLink],
    ) -> PipelineReport {
        self.verify_forward_links_until(source, candidates, std::future::pending::<()>())
            .await
    }

    /// Verify every candidate against `source`, stopping early when
    /// `shutdown` resolves.
    pub async fn verify_forward_links_until<Sd>(
        &self,
        source: &SourceIdentity,
        candidates: &[ForwardLink],
        shutdown: Sd,
    ) -> PipelineReport
    where
        Sd: Future<Output = ()>,
    {
        let candidates = dedup(candidates);
        let submitted = candidates.len();
        tracing::info!(source = %source, candidates = submitted, "verifying forward links");

        if candidates.is_empty() {
            return PipelineReport::summarize(source.clone(), Vec::new(), 0, false);
        }

        tokio::pin!(shutdown);
        let mut outcomes = Vec::with_capacity(submitted);

        let source_text = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::warn!(source = %source, "interrupted before source page was fetched");
                return PipelineReport::summarize(source.clone(), outcomes, submitted, true);
            }
            fetched = self.fetch_text(source.url()) => fetched,
        };

        let source_text = match source_text {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "source page fetch failed");
                let detail = e.to_string();
                outcomes.extend(candidates.into_iter().map(|link| {
                    VerificationOutcome::rejected(
                        link,
                        OutcomeReason::SourceFetchError,
                        None,
                        Some(detail.clone()),
                    )
                }));
                return PipelineReport::summarize(source.clone(), outcomes, submitted, false);
            }
        };

        let mut pending = stream::iter(
            candidates
                .into_iter()
                .map(|link| self.evaluate(&source_text, link)),
        )
        .buffer_unordered(self.concurrency);

        let mut interrupted = false;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
                next = pending.next() => match next {
                    Some(outcome) => outcomes.push(outcome),
                    None => break,
                },
            }
        }

        let report = PipelineReport::summarize(source.clone(), outcomes, submitted, interrupted);
        tracing::info!(
            source = %source,
            evaluated = report.outcomes.len(),
            verified = report.verified.len(),
            interrupted,
            status = ?report.outcome.status,
            "forward link verification finished"
        );
        report
    }

    async fn evaluate(&self, source_text: &str, link: ForwardLink) -> VerificationOutcome {
        let text = match self.fetch_text(link.url()).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(candidate = %link, error = %e, "candidate fetch failed");
                return VerificationOutcome::rejected(
                    link,
                    OutcomeReason::FetchError,
                    None,
                    Some(e.to_string()),
                );
            }
        };

        match self.relevance.assess(source_text, &text).await {
            Ok(Relevance::Relevant { score }) => {
                tracing::debug!(candidate = %link, score, "candidate relevant");
                VerificationOutcome::verified(link, score)
            }
            Ok(Relevance::BelowThreshold { score }) => {
                tracing::debug!(candidate = %link, score, "candidate below threshold");
                VerificationOutcome::rejected(link, OutcomeReason::BelowThreshold, Some(score), None)
            }
            Ok(Relevance::EmptyContent) => {
                tracing::debug!(candidate = %link, "empty content after normalization");
                VerificationOutcome::rejected(link, OutcomeReason::EmptyContent, None, None)
            }
            Err(e) => {
                tracing::warn!(candidate = %link, error = %e, "relevance scoring failed");
                VerificationOutcome::rejected(
                    link,
                    OutcomeReason::ScoreError,
                    None,
                    Some(e.to_string()),
                )
            }
        }
    }

    /// Fetch, classify, and strip markup.
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let fetch = self.fetcher.fetch(url, self.fetch_timeout);
        let page = tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        Ok(extract_text(&page.into_text()?))
    }
}

/// First occurrence of each normalized URL, in input order.
fn dedup(candidates: &[ForwardLink]) -> Vec<ForwardLink> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|link| seen.insert(link.as_str().to_string()))
        .cloned()
        .collect()
}
