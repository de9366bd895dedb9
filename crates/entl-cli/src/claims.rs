//! # Claims Subcommand
//!
//! Prints the claims a verified license projects into an identity store,
//! or, with `--against`, cross-checks a previously exported claim list
//! against the license and the live entity given with `--entity`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use entl_license::{to_claims, validate_claims_against_license, ClaimSet, EntitySnapshot};

use crate::verify::verified_license;
use crate::{parse_now, read_yaml, report, CliContext};

/// Output format for `entl claims`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ClaimsFormat {
    /// One `Name=value` line per claim.
    #[default]
    Text,
    Json,
    Yaml,
}

/// Arguments for `entl claims`.
#[derive(Args, Debug)]
pub struct ClaimsArgs {
    /// File holding the license token.
    #[arg(value_name = "TOKEN")]
    pub token: PathBuf,
    /// Issuer public key (hex). Defaults to `public_key` in the config.
    #[arg(long)]
    pub pubkey: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ClaimsFormat::Text)]
    pub format: ClaimsFormat,
    /// Claim list (JSON or YAML) to check against the license.
    #[arg(long, requires = "entity")]
    pub against: Option<PathBuf>,
    /// Live entity snapshot (YAML) the claims must agree with.
    #[arg(long)]
    pub entity: Option<PathBuf>,
    /// Validate as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

/// Execute `entl claims`.
pub fn run_claims(args: &ClaimsArgs, ctx: &CliContext) -> Result<u8> {
    let license = match verified_license(ctx, &args.token, args.pubkey.as_deref())? {
        Ok(license) => license,
        Err(code) => return Ok(code),
    };

    if let Some(against) = &args.against {
        let Some(entity) = &args.entity else {
            bail!("--against needs the live entity: pass --entity");
        };
        let claims: ClaimSet = read_yaml(&ctx.path(against), "claims")?;
        let entity: EntitySnapshot = read_yaml(&ctx.path(entity), "entity snapshot")?;
        let now = parse_now(args.now.as_deref())?;
        if let Err(code) = report(validate_claims_against_license(
            &license,
            &claims,
            &entity,
            &ctx.config,
            now,
        ))? {
            return Ok(code);
        }
        println!("OK: {} claims match the license", claims.len());
        return Ok(0);
    }

    let claims = to_claims(&license);
    match args.format {
        ClaimsFormat::Text => {
            for claim in claims.iter() {
                println!("{}={}", claim.name, claim.value);
            }
        }
        ClaimsFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
        ClaimsFormat::Yaml => print!("{}", serde_yaml::to_string(&claims)?),
    }
    Ok(0)
}
