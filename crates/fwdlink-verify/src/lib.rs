//! # fwdlink-verify: Relevance and Link Verification
//!
//! Turns a source and its claimed forward links into a verified subset and
//! a structured outcome.
//!
//! ```text
//! CandidateDiscovery ──▶ LinkVerifier ──▶ PipelineReport
//!                         │   │
//!                PageFetcher  RelevanceVerifier ── RelevanceScorer
//! ```
//!
//! - [`normalize`]: lower-case, collapse `<br>` and whitespace, truncate,
//!   strip markup.
//! - [`relevance`]: threshold policy, conjunctive batch verdict.
//! - [`scorer`]: scorer trait and the built-in TF-IDF scorer.
//! - [`pipeline`]: bounded-concurrency fetch and score with interruption.
//! - [`outcome`]: per-candidate outcomes and the batch report.
//! - [`manifest`]: `Forward:` manifest discovery.
//!
//! Fetcher and scorer are constructed by the caller and injected.

pub mod error;
pub mod manifest;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod relevance;
pub mod scorer;

pub use error::{DiscoveryError, ScoreError};
pub use manifest::{
    manifest_locations, parse_forward_links, CandidateDiscovery, ManifestDiscovery,
    MANIFEST_PATHS,
};
pub use outcome::{
    BatchOutcome, BatchStatus, LinkStatus, OutcomeReason, PipelineReport, VerificationOutcome,
};
pub use pipeline::{LinkVerifier, PipelineConfig, DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT};
pub use relevance::{
    BatchRelevance, Relevance, RelevanceConfig, RelevanceVerifier, MAX_SCORED_CHARS,
    RELEVANCE_THRESHOLD,
};
pub use scorer::{RelevanceScorer, TfIdfScorer};
