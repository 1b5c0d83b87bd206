//! # fwdlink-cli: Forward-Link Attestation Tool
//!
//! Provides the `fwdlink` command-line interface. Every subcommand is a
//! thin wrapper: it builds the collaborators once, calls into the library
//! crates, and prints JSON on stdout. Logs go to stderr.
//!
//! ## Subcommands
//!
//! - `fwdlink discover`: read forward-link manifests from a source host.
//! - `fwdlink verify-links`: run the verification pipeline.
//! - `fwdlink issue`: verify, then issue a certificate and attestation.
//! - `fwdlink inspect`: structural verification of a certificate file.
//! - `fwdlink check-attestation`: verify an attestation against a certificate.
//! - `fwdlink reverify`: compare a certificate against live pages.
//!
//! ```bash
//! fwdlink verify-links --source example.org --discover
//! fwdlink issue --source example.org --link https://a.example/x \
//!     --cert-out out/cert.pem --attestation-out out/attestation.json
//! fwdlink inspect --cert out/cert.pem
//! ```
//!
//! Exit codes: `0` success, `1` failed verification or error, `2` usage.

pub mod inspect;
pub mod issue;
pub mod links;
pub mod network;
pub mod reverify;

use std::path::Path;

use anyhow::{Context, Result};
use fwdlink_core::Timestamp;
use serde::Serialize;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Write key material readable by the owner only.
pub fn write_secret(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    create_parent(path)?;
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display())),
        _ => Ok(()),
    }
}

/// Read a UTF-8 file.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// `--at <unix-secs>`, or the current time.
pub fn check_time(at: Option<i64>) -> Result<Timestamp> {
    match at {
        Some(secs) => Timestamp::from_epoch_secs(secs)
            .with_context(|| format!("--at {secs} is not a representable time")),
        None => Ok(Timestamp::now()),
    }
}

/// Resolves when Ctrl-C is received. Never resolves if the handler cannot
/// be installed.
pub async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; runs cannot be interrupted");
        std::future::pending::<()>().await;
    }
    tracing::warn!("interrupt received; returning partial results");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("cert.pem");
        write_output(&path, b"pem").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"pem");
    }

    #[test]
    fn test_write_output_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        write_output(&path, b"first").unwrap();
        write_output(&path, b"second").unwrap();
        assert_eq!(read_text(&path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_secret_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");
        write_secret(&path, b"secret").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_read_text_missing_file_has_path_in_error() {
        let err = read_text(Path::new("/nonexistent/fwdlink.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/fwdlink.txt"));
    }

    #[test]
    fn test_check_time_explicit() {
        assert_eq!(check_time(Some(1_768_478_400)).unwrap().epoch_secs(), 1_768_478_400);
    }

    #[test]
    fn test_check_time_out_of_range() {
        assert!(check_time(Some(i64::MAX)).is_err());
    }
}
