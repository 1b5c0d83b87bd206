//! # Shared Arguments
//!
//! Network tunables and candidate inputs used by every subcommand that
//! touches the network. Each tunable falls back to an `FWDLINK_*`
//! environment variable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use fwdlink_core::{ForwardLink, Provenance, SourceIdentity};
use fwdlink_fetch::{FetchConfig, HttpPageFetcher, PageFetcher, DEFAULT_USER_AGENT};
use fwdlink_verify::{
    parse_forward_links, CandidateDiscovery, LinkVerifier, ManifestDiscovery, PipelineConfig,
    TfIdfScorer, DEFAULT_CONCURRENCY,
};

/// Fetch and pipeline settings.
#[derive(Args, Debug, Clone)]
pub struct NetworkArgs {
    /// Per-fetch timeout in seconds.
    #[arg(
        long = "timeout-secs",
        env = "FWDLINK_FETCH_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Maximum concurrent page fetches.
    #[arg(long, env = "FWDLINK_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// User-Agent header sent with every request.
    #[arg(long, env = "FWDLINK_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl NetworkArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            ..FetchConfig::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            concurrency: self.concurrency,
            fetch_timeout: self.timeout(),
            ..PipelineConfig::default()
        }
    }

    /// The HTTP fetcher, built once per process.
    pub fn fetcher(&self) -> Result<Arc<HttpPageFetcher>> {
        let fetcher =
            HttpPageFetcher::new(&self.fetch_config()).context("failed to build HTTP client")?;
        Ok(Arc::new(fetcher))
    }

    /// The pipeline over `fetcher` with the TF-IDF scorer.
    pub fn link_verifier<F: PageFetcher>(&self, fetcher: F) -> LinkVerifier<F, TfIdfScorer> {
        LinkVerifier::new(fetcher, TfIdfScorer::new(), self.pipeline_config())
    }
}

/// Where the source and its candidates come from.
#[derive(Args, Debug, Clone)]
pub struct CandidateArgs {
    /// Source domain or URL.
    #[arg(long)]
    pub source: String,

    /// Forward-link candidate URL. Repeatable.
    #[arg(long = "link", value_name = "URL")]
    pub links: Vec<String>,

    /// Local manifest file with `Forward: <url>` lines.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Also read the manifests published on the source host.
    #[arg(long)]
    pub discover: bool,
}

impl CandidateArgs {
    pub fn source(&self) -> Result<SourceIdentity> {
        SourceIdentity::parse(&self.source)
            .with_context(|| format!("invalid --source {:?}", self.source))
    }

    /// Gather candidates from `--link`, `--manifest`, then `--discover`,
    /// in that order. Duplicates are left to the pipeline.
    pub async fn collect<F: PageFetcher + Clone>(
        &self,
        source: &SourceIdentity,
        fetcher: &F,
        timeout: Duration,
    ) -> Result<Vec<ForwardLink>> {
        let mut candidates = self
            .links
            .iter()
            .map(|url| {
                ForwardLink::new(url, Provenance::Declared)
                    .with_context(|| format!("invalid --link {url:?}"))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(path) = &self.manifest {
            let text = crate::read_text(path)?;
            let found = parse_forward_links(&text);
            tracing::debug!(manifest = %path.display(), links = found.len(), "read local manifest");
            candidates.extend(found);
        }

        if self.discover {
            let found = ManifestDiscovery::new(fetcher.clone(), timeout)
                .discover(source)
                .await
                .context("manifest discovery failed")?;
            candidates.extend(found);
        }

        if candidates.is_empty() {
            tracing::warn!(source = %source, "no forward-link candidates given");
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwdlink_fetch::MemoryFetcher;

    fn args(source: &str) -> CandidateArgs {
        CandidateArgs {
            source: source.to_string(),
            links: Vec::new(),
            manifest: None,
            discover: false,
        }
    }

    #[test]
    fn test_network_configs_carry_flags() {
        let net = NetworkArgs {
            timeout_secs: 3,
            concurrency: 2,
            user_agent: "TestBot/1".into(),
        };
        let fetch = net.fetch_config();
        assert_eq!(fetch.user_agent, "TestBot/1");
        assert_eq!(fetch.max_retries, FetchConfig::default().max_retries);

        let pipeline = net.pipeline_config();
        assert_eq!(pipeline.concurrency, 2);
        assert_eq!(pipeline.fetch_timeout, Duration::from_secs(3));
        assert_eq!(pipeline.relevance.threshold, 0.1);
    }

    #[test]
    fn test_invalid_source_is_error() {
        assert!(args("ftp://example.org").source().is_err());
        assert_eq!(
            args("example.org").source().unwrap().as_str(),
            "https://example.org"
        );
    }

    #[tokio::test]
    async fn test_collect_links_then_manifest_then_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("flm.txt");
        std::fs::write(&manifest, "Forward: https://b.example/2\n").unwrap();

        let fetcher = Arc::new(
            MemoryFetcher::new().with_text("https://example.org/flm.txt", "Forward: https://c.example/3"),
        );
        let mut candidate_args = args("https://example.org");
        candidate_args.links = vec!["https://a.example/1".into()];
        candidate_args.manifest = Some(manifest);
        candidate_args.discover = true;

        let source = candidate_args.source().unwrap();
        let found = candidate_args
            .collect(&source, &fetcher, Duration::from_secs(1))
            .await
            .unwrap();
        let urls: Vec<&str> = found.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/1", "https://b.example/2", "https://c.example/3"]
        );
    }

    #[tokio::test]
    async fn test_collect_rejects_bad_link() {
        let mut candidate_args = args("https://example.org");
        candidate_args.links = vec!["not a url".into()];
        let source = candidate_args.source().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new());
        let err = candidate_args
            .collect(&source, &fetcher, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("--link"));
    }

    #[tokio::test]
    async fn test_collect_without_discovery_makes_no_requests() {
        let mut candidate_args = args("https://example.org");
        candidate_args.links = vec!["https://a.example/1".into()];
        let source = candidate_args.source().unwrap();
        let fetcher = Arc::new(MemoryFetcher::new());
        candidate_args
            .collect(&source, &fetcher, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(fetcher.requested().is_empty());
    }
}
