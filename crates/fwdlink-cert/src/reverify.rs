//! # Content-Level Re-verification
//!
//! Distinct from structural verification: re-runs the link verification
//! pipeline against live pages and compares the digests of the links that
//! verify now with the digests embedded in the certificate.
//!
//! Each embedded index ends up `confirmed` (a live-verified URL hashes to
//! it) or `not_reverified`. Live-verified URLs whose digest is not in the
//! certificate are listed separately.

use std::collections::HashMap;

use fwdlink_core::{ContentDigest, ForwardLink, SourceIdentity, Timestamp};
use fwdlink_crypto::url_digest;
use fwdlink_fetch::PageFetcher;
use fwdlink_verify::{LinkVerifier, PipelineReport, RelevanceScorer};
use serde::{Deserialize, Serialize};

use crate::error::CertError;
use crate::verifier::{CertificateStatus, CertificateVerifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Confirmed,
    NotReverified,
}

/// One embedded digest and what live verification found for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverifiedEntry {
    pub index: usize,
    pub digest: ContentDigest,
    pub status: EntryStatus,
    /// The live-verified URL that hashes to `digest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverificationReport {
    /// Structural status of the certificate.
    pub certificate: CertificateStatus,
    pub entries: Vec<ReverifiedEntry>,
    /// Live-verified URLs absent from the certificate.
    pub unattested: Vec<String>,
    pub pipeline: PipelineReport,
}

impl ReverificationReport {
    /// True when every embedded digest was confirmed.
    pub fn all_confirmed(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.status == EntryStatus::Confirmed)
    }
}

/// Runs the pipeline and compares against an issued certificate.
#[derive(Debug)]
pub struct ContentReverifier<F, S> {
    pipeline: LinkVerifier<F, S>,
    verifier: CertificateVerifier,
}

impl<F: PageFetcher, S: RelevanceScorer> ContentReverifier<F, S> {
    pub fn new(pipeline: LinkVerifier<F, S>) -> Self {
        Self {
            pipeline,
            verifier: CertificateVerifier::new(),
        }
    }

    /// Re-verify at the current time.
    pub async fn reverify(
        &self,
        certificate_pem: &str,
        source: &SourceIdentity,
        candidates: &[ForwardLink],
    ) -> Result<ReverificationReport, CertError> {
        self.reverify_at(certificate_pem, source, candidates, Timestamp::now())
            .await
    }

    /// Re-verify with `now` as the structural check time.
    ///
    /// Fails only when the certificate has no decodable digest map.
    pub async fn reverify_at(
        &self,
        certificate_pem: &str,
        source: &SourceIdentity,
        candidates: &[ForwardLink],
        now: Timestamp,
    ) -> Result<ReverificationReport, CertError> {
        let certificate = self.verifier.verify_at(certificate_pem, now);
        let digests = certificate.link_digests.clone().ok_or_else(|| {
            CertError::NoLinkDigests(
                certificate
                    .detail
                    .clone()
                    .unwrap_or_else(|| format!("{:?}", certificate.error)),
            )
        })?;

        let pipeline = self.pipeline.verify_forward_links(source, candidates).await;

        let live: HashMap<ContentDigest, String> = pipeline
            .verified
            .iter()
            .map(|link| (url_digest(link.as_str()), link.as_str().to_string()))
            .collect();

        let entries: Vec<ReverifiedEntry> = digests
            .digests()
            .iter()
            .enumerate()
            .map(|(index, digest)| match live.get(digest) {
                Some(url) => ReverifiedEntry {
                    index,
                    digest: *digest,
                    status: EntryStatus::Confirmed,
                    url: Some(url.clone()),
                },
                None => ReverifiedEntry {
                    index,
                    digest: *digest,
                    status: EntryStatus::NotReverified,
                    url: None,
                },
            })
            .collect();

        let unattested: Vec<String> = pipeline
            .verified
            .iter()
            .filter(|link| digests.position(&url_digest(link.as_str())).is_none())
            .map(|link| link.as_str().to_string())
            .collect();

        let confirmed = entries
            .iter()
            .filter(|e| e.status == EntryStatus::Confirmed)
            .count();
        tracing::info!(
            source = %source,
            embedded = entries.len(),
            confirmed,
            unattested = unattested.len(),
            "content re-verification finished"
        );

        Ok(ReverificationReport {
            certificate,
            entries,
            unattested,
            pipeline,
        })
    }
}
