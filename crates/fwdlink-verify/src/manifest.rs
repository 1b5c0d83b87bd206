//! # Candidate Discovery
//!
//! [`CandidateDiscovery`] is the seam for finding forward-link candidates.
//! The built-in backend, [`ManifestDiscovery`], reads owner-declared
//! `Forward: <url>` lines from well-known files on the source host. A
//! search-service backend would implement the same trait.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use fwdlink_core::{ForwardLink, Provenance, SourceIdentity};
use fwdlink_fetch::PageFetcher;
use url::Url;

use crate::error::DiscoveryError;

/// Manifest paths, probed in this order.
pub const MANIFEST_PATHS: [&str; 3] = ["/flm.txt", "/.well-known/flm.txt", "/robots.txt"];

/// Finds forward-link candidates for a source.
#[async_trait]
pub trait CandidateDiscovery: Send + Sync {
    async fn discover(&self, source: &SourceIdentity) -> Result<Vec<ForwardLink>, DiscoveryError>;
}

/// Extract `Forward: <url>` declarations.
///
/// The key is case-insensitive. The URL is the first whitespace-delimited
/// token after the colon; the rest of the line is ignored. Unparsable URLs
/// are skipped; duplicates keep their first position.
pub fn parse_forward_links(text: &str) -> Vec<ForwardLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("forward") {
            continue;
        }
        let Some(url) = value.split_whitespace().next() else {
            continue;
        };
        match ForwardLink::new(url, Provenance::Declared) {
            Ok(link) => {
                if seen.insert(link.as_str().to_string()) {
                    links.push(link);
                }
            }
            Err(e) => tracing::debug!(line = line.trim(), error = %e, "skipping forward declaration"),
        }
    }
    links
}

/// Manifest URLs on the source host.
pub fn manifest_locations(source: &SourceIdentity) -> Vec<Url> {
    MANIFEST_PATHS
        .iter()
        .filter_map(|path| source.join(path).ok())
        .collect()
}

/// Reads forward-link manifests from the source host.
///
/// Missing or unreadable manifests are skipped; discovery itself never
/// fails.
#[derive(Debug)]
pub struct ManifestDiscovery<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: PageFetcher> ManifestDiscovery<F> {
    pub fn new(fetcher: F, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }
}

#[async_trait]
impl<F: PageFetcher> CandidateDiscovery for ManifestDiscovery<F> {
    async fn discover(&self, source: &SourceIdentity) -> Result<Vec<ForwardLink>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for location in manifest_locations(source) {
            let text = match self.fetcher.fetch(&location, self.timeout).await {
                Ok(page) => match page.into_text() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::debug!(%location, error = %e, "manifest not usable");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::debug!(%location, error = %e, "manifest not reachable");
                    continue;
                }
            };
            let found = parse_forward_links(&text);
            tracing::debug!(%location, links = found.len(), "read manifest");
            for link in found {
                if seen.insert(link.as_str().to_string()) {
                    links.push(link);
                }
            }
        }

        tracing::info!(source = %source, links = links.len(), "discovered declared forward links");
        Ok(links)
    }
}
