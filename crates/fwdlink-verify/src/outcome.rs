//! # Verification Outcomes
//!
//! One [`VerificationOutcome`] per (source, candidate) pair, created once by
//! the pipeline and never mutated. A [`PipelineReport`] gathers them with
//! the verified set and the batch-level `{status, message}` record.

use fwdlink_core::{ForwardLink, SourceIdentity, VerifiedLinkSet};
use serde::{Deserialize, Serialize};

/// Per-candidate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Verified,
    Rejected,
}

/// Why a candidate ended up verified or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    Relevant,
    /// The candidate page could not be fetched or was not a 2xx text page.
    FetchError,
    /// The source page could not be fetched, so nothing could be compared.
    SourceFetchError,
    EmptyContent,
    BelowThreshold,
    ScoreError,
}

impl OutcomeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::FetchError => "fetch_error",
            Self::SourceFetchError => "source_fetch_error",
            Self::EmptyContent => "empty_content",
            Self::BelowThreshold => "below_threshold",
            Self::ScoreError => "score_error",
        }
    }
}

impl std::fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub link: ForwardLink,
    pub status: LinkStatus,
    /// Similarity in `[0, 1]`, absent when the pair was never scored.
    pub score: Option<f64>,
    pub reason: OutcomeReason,
    /// Error text for fetch and score failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationOutcome {
    pub fn verified(link: ForwardLink, score: f64) -> Self {
        Self {
            link,
            status: LinkStatus::Verified,
            score: Some(score),
            reason: OutcomeReason::Relevant,
            detail: None,
        }
    }

    pub fn rejected(
        link: ForwardLink,
        reason: OutcomeReason,
        score: Option<f64>,
        detail: Option<String>,
    ) -> Self {
        Self {
            link,
            status: LinkStatus::Rejected,
            score,
            reason,
            detail,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status == LinkStatus::Verified
    }
}

/// Batch-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Fail,
}

/// `{"status": "success"|"fail", "message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub message: String,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub source: SourceIdentity,
    /// Outcomes in completion order.
    pub outcomes: Vec<VerificationOutcome>,
    /// Verified links in completion order, de-duplicated.
    pub verified: VerifiedLinkSet,
    pub outcome: BatchOutcome,
    /// True when the run was cut short; candidates still in flight have no
    /// outcome.
    pub interrupted: bool,
}

impl PipelineReport {
    /// Assemble a report. `submitted` is the number of distinct candidates.
    pub fn summarize(
        source: SourceIdentity,
        outcomes: Vec<VerificationOutcome>,
        submitted: usize,
        interrupted: bool,
    ) -> Self {
        let verified: VerifiedLinkSet = outcomes
            .iter()
            .filter(|o| o.is_verified())
            .map(|o| o.link.clone())
            .collect();
        let rejected: Vec<&VerificationOutcome> =
            outcomes.iter().filter(|o| !o.is_verified()).collect();

        let outcome = if interrupted {
            BatchOutcome {
                status: BatchStatus::Fail,
                message: format!(
                    "interrupted after {} of {} forward links were evaluated",
                    outcomes.len(),
                    submitted
                ),
            }
        } else if let Some(first) = rejected.first() {
            BatchOutcome {
                status: BatchStatus::Fail,
                message: format!(
                    "{} of {} forward links rejected; first: {} ({})",
                    rejected.len(),
                    submitted,
                    first.link,
                    first.reason
                ),
            }
        } else if submitted == 0 {
            BatchOutcome {
                status: BatchStatus::Success,
                message: "no forward links to verify".to_string(),
            }
        } else {
            BatchOutcome {
                status: BatchStatus::Success,
                message: format!("all {submitted} forward links verified"),
            }
        };

        Self {
            source,
            outcomes,
            verified,
            outcome,
            interrupted,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.status == BatchStatus::Success
    }

    /// The outcome recorded for `url`, if it completed.
    pub fn outcome_for(&self, url: &str) -> Option<&VerificationOutcome> {
        self.outcomes.iter().find(|o| o.link.as_str() == url)
    }
}
