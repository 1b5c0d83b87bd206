//! # Relevance Verifier
//!
//! Owns the threshold policy and nothing else: texts are normalized and
//! truncated identically on both sides, an injected [`RelevanceScorer`]
//! measures similarity, and `score >= threshold` means relevant.
//!
//! ## Batch Policy
//!
//! [`RelevanceVerifier::assess_batch`] is conjunctive. A source is relevant
//! to a batch of candidates only if **every** candidate clears the
//! threshold; one irrelevant or unscorable candidate fails the batch. An
//! empty batch is vacuously relevant.
//!
//! The default threshold of 0.1 is permissive. It is kept as a named
//! constant so it can be tested and tuned, not raised silently.

use crate::error::ScoreError;
use crate::normalize::prepare;
use crate::scorer::RelevanceScorer;

/// Minimum similarity score for a candidate to count as relevant.
pub const RELEVANCE_THRESHOLD: f64 = 0.1;

/// Characters of each normalized text passed to the scorer.
pub const MAX_SCORED_CHARS: usize = 3000;

/// Threshold policy settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceConfig {
    pub threshold: f64,
    pub max_chars: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: RELEVANCE_THRESHOLD,
            max_chars: MAX_SCORED_CHARS,
        }
    }
}

/// Decision for one (source, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relevance {
    Relevant { score: f64 },
    BelowThreshold { score: f64 },
    /// One side was empty after normalization. Not scored.
    EmptyContent,
}

impl Relevance {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::Relevant { .. })
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Relevant { score } | Self::BelowThreshold { score } => Some(*score),
            Self::EmptyContent => None,
        }
    }
}

/// Per-candidate decisions plus the conjunctive verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRelevance {
    /// One entry per candidate, in input order.
    pub decisions: Vec<Result<Relevance, ScoreError>>,
    /// True iff every decision is `Ok(Relevant)`.
    pub relevant: bool,
}

/// Applies the relevance threshold over an injected scorer.
#[derive(Debug, Clone)]
pub struct RelevanceVerifier<S> {
    scorer: S,
    config: RelevanceConfig,
}

impl<S: RelevanceScorer> RelevanceVerifier<S> {
    pub fn new(scorer: S, config: RelevanceConfig) -> Self {
        Self { scorer, config }
    }

    pub fn with_defaults(scorer: S) -> Self {
        Self::new(scorer, RelevanceConfig::default())
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// True when `score` clears the threshold.
    pub fn passes(&self, score: f64) -> bool {
        score >= self.config.threshold
    }

    /// Decide one pair.
    ///
    /// Scores are clamped into `[0, 1]`; a non-finite score is an error.
    pub async fn assess(
        &self,
        source_text: &str,
        candidate_text: &str,
    ) -> Result<Relevance, ScoreError> {
        let source = prepare(source_text, self.config.max_chars);
        self.assess_prepared(&source, candidate_text).await
    }

    async fn assess_prepared(
        &self,
        source: &str,
        candidate_text: &str,
    ) -> Result<Relevance, ScoreError> {
        let candidate = prepare(candidate_text, self.config.max_chars);
        if source.is_empty() || candidate.is_empty() {
            return Ok(Relevance::EmptyContent);
        }

        let raw = self.scorer.score(source, &candidate).await?;
        if !raw.is_finite() {
            return Err(ScoreError::NonFinite(raw));
        }
        let score = raw.clamp(0.0, 1.0);

        Ok(if self.passes(score) {
            Relevance::Relevant { score }
        } else {
            Relevance::BelowThreshold { score }
        })
    }

    /// Boolean form of [`assess`](Self::assess). Scorer failures count as
    /// not relevant.
    pub async fn is_relevant(&self, source_text: &str, candidate_text: &str) -> bool {
        match self.assess(source_text, candidate_text).await {
            Ok(decision) => decision.is_relevant(),
            Err(e) => {
                tracing::warn!(error = %e, "relevance scoring failed");
                false
            }
        }
    }

    /// Decide every candidate against one source. See the module docs for
    /// the conjunctive policy.
    pub async fn assess_batch(&self, source_text: &str, candidates: &[&str]) -> BatchRelevance {
        let source = prepare(source_text, self.config.max_chars);
        let mut decisions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            decisions.push(self.assess_prepared(&source, candidate).await);
        }
        let relevant = decisions
            .iter()
            .all(|d| matches!(d, Ok(Relevance::Relevant { .. })));
        BatchRelevance {
            decisions,
            relevant,
        }
    }

    /// Boolean form of [`assess_batch`](Self::assess_batch).
    pub async fn is_relevant_batch(&self, source_text: &str, candidates: &[&str]) -> bool {
        self.assess_batch(source_text, candidates).await.relevant
    }
}
