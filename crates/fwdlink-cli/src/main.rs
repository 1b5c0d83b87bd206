//! # fwdlink CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fwdlink_cli::inspect::{run_check_attestation, run_inspect, CheckAttestationArgs, InspectArgs};
use fwdlink_cli::issue::{run_issue, IssueArgs};
use fwdlink_cli::links::{run_discover, run_verify_links, DiscoverArgs, VerifyLinksArgs};
use fwdlink_cli::reverify::{run_reverify, ReverifyArgs};

/// Forward-link attestation.
///
/// Verifies that the pages a domain forwards to are topically related to
/// it, and issues self-signed certificates binding the domain to the
/// verified links.
#[derive(Parser, Debug)]
#[command(name = "fwdlink", version, about, long_about = None)]
struct Cli {
    /// More log output. Repeat for more (-v, -vv). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the forward links declared in the source's manifests.
    Discover(DiscoverArgs),

    /// Verify forward-link candidates against their source.
    VerifyLinks(VerifyLinksArgs),

    /// Verify candidates, then issue a certificate and attestation.
    Issue(IssueArgs),

    /// Structurally verify a certificate file.
    Inspect(InspectArgs),

    /// Verify a signed attestation against a certificate's key.
    CheckAttestation(CheckAttestationArgs),

    /// Compare a certificate's digests with live verification.
    Reverify(ReverifyArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match &cli.command {
        Commands::Discover(args) => run_discover(args).await,
        Commands::VerifyLinks(args) => run_verify_links(args).await,
        Commands::Issue(args) => run_issue(args).await,
        Commands::Inspect(args) => run_inspect(args),
        Commands::CheckAttestation(args) => run_check_attestation(args),
        Commands::Reverify(args) => run_reverify(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify_links_repeated_links() {
        let cli = Cli::try_parse_from([
            "fwdlink",
            "verify-links",
            "--source",
            "example.org",
            "--link",
            "https://a.example/x",
            "--link",
            "https://b.example/y",
            "--discover",
        ])
        .unwrap();
        let Commands::VerifyLinks(args) = cli.command else {
            panic!("expected verify-links");
        };
        assert_eq!(args.candidates.source, "example.org");
        assert_eq!(args.candidates.links.len(), 2);
        assert!(args.candidates.discover);
        assert!(args.candidates.manifest.is_none());
    }

    #[test]
    fn test_parse_network_flags() {
        let cli = Cli::try_parse_from([
            "fwdlink",
            "discover",
            "--source",
            "example.org",
            "--timeout-secs",
            "3",
            "--concurrency",
            "2",
            "--user-agent",
            "TestBot/1",
        ])
        .unwrap();
        let Commands::Discover(args) = cli.command else {
            panic!("expected discover");
        };
        assert_eq!(args.network.timeout_secs, 3);
        assert_eq!(args.network.concurrency, 2);
        assert_eq!(args.network.user_agent, "TestBot/1");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from([
            "fwdlink",
            "discover",
            "--source",
            "example.org",
            "--timeout-secs",
            "0",
        ])
        .is_err());
    }

    #[test]
    fn test_parse_issue() {
        let cli = Cli::try_parse_from([
            "fwdlink",
            "issue",
            "--source",
            "example.org",
            "--manifest",
            "flm.txt",
            "--cert-out",
            "out/cert.pem",
            "--attestation-out",
            "out/attestation.json",
            "--allow-partial",
        ])
        .unwrap();
        let Commands::Issue(args) = cli.command else {
            panic!("expected issue");
        };
        assert_eq!(args.cert_out, PathBuf::from("out/cert.pem"));
        assert!(args.key_out.is_none());
        assert_eq!(
            args.attestation_out,
            Some(PathBuf::from("out/attestation.json"))
        );
        assert!(args.allow_partial);
        assert_eq!(args.candidates.manifest, Some(PathBuf::from("flm.txt")));
    }

    #[test]
    fn test_issue_requires_cert_out() {
        assert!(Cli::try_parse_from(["fwdlink", "issue", "--source", "example.org"]).is_err());
    }

    #[test]
    fn test_parse_inspect_at() {
        let cli = Cli::try_parse_from([
            "fwdlink", "inspect", "--cert", "cert.pem", "--at", "1768478400",
        ])
        .unwrap();
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.at, Some(1_768_478_400));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fwdlink",
            "inspect",
            "--cert",
            "cert.pem",
            "-vv",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn test_parse_reverify_and_check_attestation() {
        assert!(matches!(
            Cli::try_parse_from([
                "fwdlink",
                "reverify",
                "--cert",
                "cert.pem",
                "--source",
                "example.org",
                "--link",
                "https://a.example/x",
            ])
            .unwrap()
            .command,
            Commands::Reverify(_)
        ));
        assert!(matches!(
            Cli::try_parse_from([
                "fwdlink",
                "check-attestation",
                "--cert",
                "cert.pem",
                "--attestation",
                "a.json",
            ])
            .unwrap()
            .command,
            Commands::CheckAttestation(_)
        ));
    }
}
