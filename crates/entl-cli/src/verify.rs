//! # Verify Subcommand
//!
//! Verifies a license token (signature, canonical form, version, hash)
//! and then checks the decoded license against the clock and this
//! installation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use entl_license::{validate_license, validate_license_token, License, LicenseRecord, LicenseStanding};

use crate::{parse_now, read_trimmed, report, CliContext};

/// Arguments for `entl verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File holding the license token.
    #[arg(value_name = "TOKEN")]
    pub token: PathBuf,
    /// Issuer public key (hex). Defaults to `public_key` in the config.
    #[arg(long)]
    pub pubkey: Option<PathBuf>,
    /// Validate as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
    /// Also print the verified license as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `entl verify`.
pub fn run_verify(args: &VerifyArgs, ctx: &CliContext) -> Result<u8> {
    let license = match verified_license(ctx, &args.token, args.pubkey.as_deref())? {
        Ok(license) => license,
        Err(code) => return Ok(code),
    };
    let now = parse_now(args.now.as_deref())?;
    let standing = match report(validate_license(&license, now, &ctx.config))? {
        Ok(standing) => standing,
        Err(code) => return Ok(code),
    };

    println!("OK: license is valid");
    print_summary(&license, standing);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&license)?);
    }
    Ok(0)
}

/// Read and verify the token at `token`. A rejection is printed and
/// returned as the exit code.
pub(crate) fn verified_license(
    ctx: &CliContext,
    token: &Path,
    pubkey: Option<&Path>,
) -> Result<std::result::Result<License, u8>> {
    let public = ctx.public_key(pubkey)?;
    let token = read_trimmed(&ctx.path(token), "token")?;
    report(validate_license_token(&token, &public))
}

pub(crate) fn print_summary(license: &License, standing: LicenseStanding) {
    let (id, name) = match license {
        License::Organization(l) => (l.id.to_string(), l.name.as_str()),
        License::User(l) => (l.id.to_string(), l.name.as_str()),
    };
    println!("  Kind:     {}", license.kind().as_str());
    println!("  Subject:  {id} ({name})");
    println!("  Version:  {}", license.version());
    println!("  Issued:   {}", license.issued());
    match license.expires() {
        Some(expires) => println!("  Expires:  {expires}"),
        None => println!("  Expires:  never"),
    }
    if let Some(refresh) = license.refresh() {
        println!("  Refresh:  {refresh}");
    }
    match standing {
        LicenseStanding::Current => println!("  Standing: current"),
        LicenseStanding::RefreshDue => println!("  Standing: refresh due"),
    }
}
