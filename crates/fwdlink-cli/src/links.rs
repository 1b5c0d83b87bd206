//! # Discovery and Link Verification
//!
//! `fwdlink discover` and `fwdlink verify-links`.

use anyhow::{Context, Result};
use clap::Args;
use fwdlink_core::{ForwardLink, SourceIdentity};
use fwdlink_fetch::PageFetcher;
use fwdlink_verify::{CandidateDiscovery, ManifestDiscovery, PipelineReport};
use serde::Serialize;

use crate::network::{CandidateArgs, NetworkArgs};

/// Arguments for `fwdlink discover`.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Source domain or URL.
    #[arg(long)]
    pub source: String,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Arguments for `fwdlink verify-links`.
#[derive(Args, Debug)]
pub struct VerifyLinksArgs {
    #[command(flatten)]
    pub candidates: CandidateArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(Serialize)]
struct DiscoverOutput<'a> {
    source: &'a SourceIdentity,
    links: &'a [ForwardLink],
}

/// Execute `fwdlink discover`.
pub async fn run_discover(args: &DiscoverArgs) -> Result<u8> {
    let source = SourceIdentity::parse(&args.source)
        .with_context(|| format!("invalid --source {:?}", args.source))?;
    let fetcher = args.network.fetcher()?;
    let links = ManifestDiscovery::new(fetcher, args.network.timeout())
        .discover(&source)
        .await
        .context("manifest discovery failed")?;

    crate::print_json(&DiscoverOutput {
        source: &source,
        links: &links,
    })?;
    Ok(0)
}

/// Execute `fwdlink verify-links`.
pub async fn run_verify_links(args: &VerifyLinksArgs) -> Result<u8> {
    let fetcher = args.network.fetcher()?;
    let report = verify_candidates(&args.candidates, &args.network, fetcher).await?;
    crate::print_json(&report)?;
    Ok(if report.is_success() { 0 } else { 1 })
}

/// Collect candidates and run the pipeline until done or interrupted.
pub(crate) async fn verify_candidates<F: PageFetcher + Clone>(
    candidates: &CandidateArgs,
    network: &NetworkArgs,
    fetcher: F,
) -> Result<PipelineReport> {
    let source = candidates.source()?;
    let links = candidates
        .collect(&source, &fetcher, network.timeout())
        .await?;
    let report = network
        .link_verifier(fetcher)
        .verify_forward_links_until(&source, &links, crate::interrupt_signal())
        .await;

    tracing::info!(
        source = %source,
        verified = report.verified.len(),
        evaluated = report.outcomes.len(),
        status = ?report.outcome.status,
        "{}",
        report.outcome.message
    );
    Ok(report)
}
