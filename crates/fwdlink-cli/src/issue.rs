//! # Certificate Issuance
//!
//! `fwdlink issue`: run the pipeline, then issue a certificate over the
//! verified links. Writes only to the paths given on the command line.
//!
//! ```bash
//! fwdlink issue --source example.org --manifest flm.txt \
//!     --cert-out out/cert.pem --key-out out/key.pem \
//!     --attestation-out out/attestation.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use fwdlink_cert::{
    CertificateIssuer, IssuedCertificate, IssuerConfig, KeyDisclosure, SignedAttestation,
    DEFAULT_KEY_BITS,
};
use fwdlink_core::{SourceIdentity, Timestamp, VerifiedLinkSet};
use fwdlink_verify::{BatchOutcome, PipelineReport};
use serde::Serialize;

use crate::links::verify_candidates;
use crate::network::{CandidateArgs, NetworkArgs};

/// Arguments for `fwdlink issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(flatten)]
    pub candidates: CandidateArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Where to write the PEM certificate.
    #[arg(long, value_name = "PATH")]
    pub cert_out: PathBuf,

    /// Where to write the PKCS#8 private key. Without it the key is
    /// discarded after signing.
    #[arg(long, value_name = "PATH")]
    pub key_out: Option<PathBuf>,

    /// Where to write the signed attestation JSON.
    #[arg(long, value_name = "PATH")]
    pub attestation_out: Option<PathBuf>,

    /// Issue over the verified subset even when some candidates failed.
    #[arg(long)]
    pub allow_partial: bool,

    /// RSA modulus size.
    #[arg(long, env = "FWDLINK_KEY_BITS", default_value_t = DEFAULT_KEY_BITS)]
    pub key_bits: usize,
}

impl IssueArgs {
    pub fn issuer_config(&self) -> IssuerConfig {
        IssuerConfig {
            key_bits: self.key_bits,
            key_disclosure: if self.key_out.is_some() {
                KeyDisclosure::ReturnOnce
            } else {
                KeyDisclosure::Discard
            },
            ..IssuerConfig::default()
        }
    }
}

#[derive(Serialize)]
struct IssueOutput<'a> {
    source: &'a SourceIdentity,
    serial: &'a str,
    not_before: Timestamp,
    not_after: Timestamp,
    links: &'a VerifiedLinkSet,
    public_key_pem: String,
    attestation: &'a SignedAttestation,
    outcome: &'a BatchOutcome,
    cert_out: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_out: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attestation_out: Option<&'a Path>,
}

/// Execute `fwdlink issue`.
pub async fn run_issue(args: &IssueArgs) -> Result<u8> {
    let issuer = CertificateIssuer::new(args.issuer_config()).context("invalid issuer settings")?;
    let fetcher = args.network.fetcher()?;
    let report = verify_candidates(&args.candidates, &args.network, fetcher).await?;

    if let Some(reason) = refusal(&report, args.allow_partial) {
        crate::print_json(&report)?;
        tracing::error!(source = %report.source, "{reason}");
        return Ok(1);
    }

    let source = report.source.clone();
    let verified = report.verified.clone();
    let mut issued = tokio::task::spawn_blocking(move || issuer.issue(&source, &verified))
        .await
        .context("issuer task failed")?
        .context("certificate issuance failed")?;

    write_artifacts(args, &mut issued)?;

    crate::print_json(&IssueOutput {
        source: issued.source(),
        serial: issued.serial(),
        not_before: issued.not_before(),
        not_after: issued.not_after(),
        links: &report.verified,
        public_key_pem: issued
            .public_key()
            .to_pem()
            .context("failed to encode public key")?,
        attestation: issued.attestation(),
        outcome: &report.outcome,
        cert_out: &args.cert_out,
        key_out: args.key_out.as_deref(),
        attestation_out: args.attestation_out.as_deref(),
    })?;
    Ok(0)
}

/// Why `report` must not be issued over, if it must not.
pub fn refusal(report: &PipelineReport, allow_partial: bool) -> Option<String> {
    if report.interrupted {
        return Some("verification was interrupted; not issuing".to_string());
    }
    if !report.is_success() && !allow_partial {
        return Some(format!(
            "not issuing: {} (pass --allow-partial to issue over the verified subset)",
            report.outcome.message
        ));
    }
    None
}

fn write_artifacts(args: &IssueArgs, issued: &mut IssuedCertificate) -> Result<()> {
    crate::write_output(&args.cert_out, issued.certificate_pem().as_bytes())?;

    if let Some(path) = &args.attestation_out {
        let json = serde_json::to_vec_pretty(issued.attestation())
            .context("failed to serialize attestation")?;
        crate::write_output(path, &json)?;
    }

    if let Some(path) = &args.key_out {
        let Some(key) = issued.take_private_key() else {
            bail!("issuer did not disclose the private key");
        };
        crate::write_secret(path, key.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwdlink_core::{ForwardLink, Provenance};
    use fwdlink_verify::{OutcomeReason, VerificationOutcome};

    fn report(
        outcomes: Vec<VerificationOutcome>,
        submitted: usize,
        interrupted: bool,
    ) -> PipelineReport {
        PipelineReport::summarize(
            SourceIdentity::parse("https://example.org").unwrap(),
            outcomes,
            submitted,
            interrupted,
        )
    }

    fn link(url: &str) -> ForwardLink {
        ForwardLink::new(url, Provenance::Declared).unwrap()
    }

    #[test]
    fn test_refusal_on_failed_batch_unless_partial_allowed() {
        let failed = report(
            vec![
                VerificationOutcome::verified(link("https://a.example/1"), 0.5),
                VerificationOutcome::rejected(
                    link("https://b.example/2"),
                    OutcomeReason::BelowThreshold,
                    Some(0.01),
                    None,
                ),
            ],
            2,
            false,
        );
        assert!(refusal(&failed, false).unwrap().contains("--allow-partial"));
        assert!(refusal(&failed, true).is_none());
    }

    #[test]
    fn test_refusal_on_interrupt_even_with_partial() {
        let interrupted = report(Vec::new(), 3, true);
        assert!(refusal(&interrupted, true).is_some());
    }

    #[test]
    fn test_no_refusal_for_success() {
        let ok = report(
            vec![VerificationOutcome::verified(link("https://a.example/1"), 0.5)],
            1,
            false,
        );
        assert!(refusal(&ok, false).is_none());
        assert!(refusal(&report(Vec::new(), 0, false), false).is_none());
    }

    #[test]
    fn test_key_disclosure_follows_key_out() {
        let mut args = IssueArgs {
            candidates: CandidateArgs {
                source: "example.org".into(),
                links: Vec::new(),
                manifest: None,
                discover: false,
            },
            network: NetworkArgs {
                timeout_secs: 10,
                concurrency: 5,
                user_agent: "t".into(),
            },
            cert_out: PathBuf::from("cert.pem"),
            key_out: None,
            attestation_out: None,
            allow_partial: false,
            key_bits: 3072,
        };
        assert_eq!(args.issuer_config().key_disclosure, KeyDisclosure::Discard);
        assert_eq!(args.issuer_config().key_bits, 3072);
        args.key_out = Some(PathBuf::from("key.pem"));
        assert_eq!(args.issuer_config().key_disclosure, KeyDisclosure::ReturnOnce);
    }
}
