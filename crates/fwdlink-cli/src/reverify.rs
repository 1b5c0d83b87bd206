//! # Re-verification
//!
//! `fwdlink reverify`: fetch the candidates again and compare the links
//! that verify now with the digests embedded in a certificate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fwdlink_cert::ContentReverifier;

use crate::network::{CandidateArgs, NetworkArgs};

/// Arguments for `fwdlink reverify`.
#[derive(Args, Debug)]
pub struct ReverifyArgs {
    /// PEM certificate file.
    #[arg(long, value_name = "PATH")]
    pub cert: PathBuf,

    #[command(flatten)]
    pub candidates: CandidateArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Execute `fwdlink reverify`. Exit code 1 unless the certificate is
/// structurally valid and every embedded digest is confirmed.
pub async fn run_reverify(args: &ReverifyArgs) -> Result<u8> {
    let cert_pem = crate::read_text(&args.cert)?;
    let source = args.candidates.source()?;
    let fetcher = args.network.fetcher()?;
    let links = args
        .candidates
        .collect(&source, &fetcher, args.network.timeout())
        .await?;

    let report = ContentReverifier::new(args.network.link_verifier(fetcher))
        .reverify(&cert_pem, &source, &links)
        .await
        .context("cannot re-verify certificate")?;

    crate::print_json(&report)?;
    Ok(if report.certificate.valid && report.all_confirmed() {
        0
    } else {
        1
    })
}
