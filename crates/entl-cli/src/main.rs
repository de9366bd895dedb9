//! # entl CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use entl_cli::check::{run_check, CheckArgs};
use entl_cli::claims::{run_claims, ClaimsArgs};
use entl_cli::expiration::{run_expiration, ExpirationArgs};
use entl_cli::issue::{run_issue, IssueArgs};
use entl_cli::keygen::{run_keygen, KeygenArgs};
use entl_cli::verify::{run_verify, VerifyArgs};
use entl_cli::{init_logging, CliContext, LogFormat};

/// Entitlement licensing toolchain.
///
/// Issues Ed25519-signed organization and user licenses and validates
/// them offline: token verification, entity cross-checks, and claims
/// checks.
#[derive(Parser, Debug)]
#[command(name = "entl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the licensing configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 issuer key pair.
    Keygen(KeygenArgs),

    /// Issue and sign a license from an entity snapshot.
    Issue(IssueArgs),

    /// Verify a license token and check its validity window.
    Verify(VerifyArgs),

    /// Verify a license token and cross-check it against a live entity.
    Check(CheckArgs),

    /// Print or cross-check the claims a license carries.
    Claims(ClaimsArgs),

    /// Preview the dates a freshly issued organization license would get.
    Expiration(ExpirationArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    tracing::debug!(root = %root.display(), "entl starting");

    let result = CliContext::load(cli.config.as_deref(), root).and_then(|ctx| match &cli.command {
        Commands::Keygen(args) => run_keygen(args, &ctx),
        Commands::Issue(args) => run_issue(args, &ctx),
        Commands::Verify(args) => run_verify(args, &ctx),
        Commands::Check(args) => run_check(args, &ctx),
        Commands::Claims(args) => run_claims(args, &ctx),
        Commands::Expiration(args) => run_expiration(args, &ctx),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
