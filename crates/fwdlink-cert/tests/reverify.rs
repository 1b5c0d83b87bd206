//! # Content-Level Re-verification
//!
//! Issues a certificate from one pipeline run, then re-runs the pipeline
//! against changed pages and checks which embedded digests still hold.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fwdlink_core::{ForwardLink, Provenance, SourceIdentity, Timestamp};
use fwdlink_fetch::MemoryFetcher;
use fwdlink_cert::{
    CertError, CertificateIssuer, ContentReverifier, EntryStatus, IssuerConfig, KeyDisclosure,
};
use fwdlink_crypto::url_digest;
use fwdlink_verify::{LinkVerifier, PipelineConfig, RelevanceScorer, ScoreError};

const SOURCE: &str = "https://example.org";

struct FixedScores(HashMap<String, f64>);

#[async_trait]
impl RelevanceScorer for FixedScores {
    async fn score(&self, _source: &str, candidate: &str) -> Result<f64, ScoreError> {
        self.0
            .get(candidate)
            .copied()
            .ok_or_else(|| ScoreError::Unavailable(format!("no score for {candidate:?}")))
    }
}

fn pipeline(
    pages: &[(&str, &str)],
    scores: &[(&str, f64)],
) -> LinkVerifier<Arc<MemoryFetcher>, FixedScores> {
    let fetcher = pages
        .iter()
        .fold(MemoryFetcher::new().with_text(SOURCE, "<p>solar panels</p>"), |f, (url, body)| {
            f.with_text(url, body)
        });
    let scores = scores.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    LinkVerifier::new(Arc::new(fetcher), FixedScores(scores), PipelineConfig::default())
}

fn link(url: &str) -> ForwardLink {
    ForwardLink::new(url, Provenance::Declared).unwrap()
}

fn t0() -> Timestamp {
    Timestamp::from_epoch_secs(1_768_478_400).unwrap()
}

fn issuer() -> CertificateIssuer {
    CertificateIssuer::new(IssuerConfig {
        key_disclosure: KeyDisclosure::Discard,
        ..IssuerConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn reverify_reports_confirmed_dropped_and_unattested_links() {
    let source = SourceIdentity::parse(SOURCE).unwrap();
    let a = "https://a.example/x";
    let b = "https://b.example/y";
    let c = "https://c.example/z";

    // Issue from a run where a and b verified.
    let first = pipeline(
        &[(a, "alpha"), (b, "beta"), (c, "gamma")],
        &[("alpha", 0.8), ("beta", 0.6), ("gamma", 0.01)],
    )
    .verify_forward_links(&source, &[link(a), link(b), link(c)])
    .await;
    assert_eq!(first.verified.len(), 2);
    let issued = issuer().issue_at(&source, &first.verified, t0()).unwrap();

    // Later, b lost relevance and c gained it.
    let reverifier = ContentReverifier::new(pipeline(
        &[(a, "alpha"), (b, "beta"), (c, "gamma")],
        &[("alpha", 0.8), ("beta", 0.02), ("gamma", 0.7)],
    ));
    let report = reverifier
        .reverify_at(issued.certificate_pem(), &source, &[link(a), link(b), link(c)], t0())
        .await
        .unwrap();

    assert!(report.certificate.valid);
    assert_eq!(report.entries.len(), 2);
    assert!(!report.all_confirmed());

    let by_digest = |url: &str| {
        report
            .entries
            .iter()
            .find(|e| e.digest == url_digest(url))
            .unwrap()
    };
    assert_eq!(by_digest(a).status, EntryStatus::Confirmed);
    assert_eq!(by_digest(a).url.as_deref(), Some(a));
    assert_eq!(by_digest(b).status, EntryStatus::NotReverified);
    assert_eq!(by_digest(b).url, None);
    assert_eq!(report.unattested, vec![c.to_string()]);

    let json = serde_json::to_value(&report.entries).unwrap();
    let statuses: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert!(statuses.contains(&"confirmed"));
    assert!(statuses.contains(&"not_reverified"));
}

#[tokio::test]
async fn reverify_unchanged_pages_confirms_everything() {
    let source = SourceIdentity::parse(SOURCE).unwrap();
    let pages = [("https://a.example/x", "alpha"), ("https://b.example/y", "beta")];
    let scores = [("alpha", 0.5), ("beta", 0.5)];
    let links = [link(pages[0].0), link(pages[1].0)];

    let first = pipeline(&pages, &scores)
        .verify_forward_links(&source, &links)
        .await;
    let issued = issuer().issue_at(&source, &first.verified, t0()).unwrap();

    let report = ContentReverifier::new(pipeline(&pages, &scores))
        .reverify_at(issued.certificate_pem(), &source, &links, t0())
        .await
        .unwrap();
    assert!(report.all_confirmed());
    assert!(report.unattested.is_empty());
    assert_eq!(report.entries[0].index, 0);
    assert_eq!(report.entries[1].index, 1);
}

#[tokio::test]
async fn reverify_rejects_certificate_without_digests() {
    let source = SourceIdentity::parse(SOURCE).unwrap();
    let err = ContentReverifier::new(pipeline(&[], &[]))
        .reverify("not a certificate", &source, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CertError::NoLinkDigests(_)));
}
