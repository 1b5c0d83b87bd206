//! # Inspection
//!
//! `fwdlink inspect` and `fwdlink check-attestation`. Both work offline on
//! files the caller already holds.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use fwdlink_cert::{AttestationPayload, CertificateVerifier, SignedAttestation};
use fwdlink_crypto::RsaPublicKey;
use serde::Serialize;

/// Arguments for `fwdlink inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PEM certificate file.
    #[arg(long, value_name = "PATH")]
    pub cert: PathBuf,

    /// Check time as Unix seconds. Defaults to now.
    #[arg(long, value_name = "UNIX_SECS")]
    pub at: Option<i64>,
}

/// Arguments for `fwdlink check-attestation`.
#[derive(Args, Debug)]
pub struct CheckAttestationArgs {
    /// PEM certificate whose key signed the attestation.
    #[arg(long, value_name = "PATH")]
    pub cert: PathBuf,

    /// Signed attestation JSON.
    #[arg(long, value_name = "PATH")]
    pub attestation: PathBuf,

    /// Check time as Unix seconds. Defaults to now.
    #[arg(long, value_name = "UNIX_SECS")]
    pub at: Option<i64>,
}

/// Execute `fwdlink inspect`. Exit code 1 when the certificate is invalid.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let now = crate::check_time(args.at)?;
    let status = CertificateVerifier::new()
        .verify_file_at(&args.cert, now)
        .context("cannot inspect certificate")?;

    if let Some(kind) = status.error {
        tracing::warn!(
            cert = %args.cert.display(),
            error = ?kind,
            detail = status.detail.as_deref().unwrap_or(""),
            "certificate is not valid"
        );
    }
    crate::print_json(&status)?;
    Ok(if status.valid { 0 } else { 1 })
}

#[derive(Debug, Serialize)]
pub struct AttestationCheck {
    pub valid: bool,
    pub payload: AttestationPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verify `attestation` against the public key embedded in `cert_pem`.
///
/// Only the key is taken from the certificate; the certificate's own
/// validity window does not apply to the attestation.
pub fn check_attestation(
    cert_pem: &str,
    attestation: SignedAttestation,
    now: fwdlink_core::Timestamp,
) -> Result<AttestationCheck> {
    let status = CertificateVerifier::new().verify_at(cert_pem, now);
    let key_pem = status.public_key_pem.with_context(|| {
        format!(
            "certificate has no usable public key: {}",
            status.detail.unwrap_or_default()
        )
    })?;
    let public_key = RsaPublicKey::from_pem(&key_pem).context("invalid embedded public key")?;

    let error = attestation
        .verify_at(&public_key, now)
        .err()
        .map(|e| e.to_string());
    Ok(AttestationCheck {
        valid: error.is_none(),
        payload: attestation.payload,
        error,
    })
}

/// Execute `fwdlink check-attestation`.
pub fn run_check_attestation(args: &CheckAttestationArgs) -> Result<u8> {
    let now = crate::check_time(args.at)?;
    let cert_pem = crate::read_text(&args.cert)?;
    let attestation_json = crate::read_text(&args.attestation)?;
    let attestation: SignedAttestation = serde_json::from_str(&attestation_json)
        .with_context(|| format!("{} is not a signed attestation", args.attestation.display()))?;

    let check = check_attestation(&cert_pem, attestation, now)?;
    if let Some(error) = &check.error {
        tracing::warn!(url = %check.payload.url, %error, "attestation rejected");
    }
    crate::print_json(&check)?;
    Ok(if check.valid { 0 } else { 1 })
}
