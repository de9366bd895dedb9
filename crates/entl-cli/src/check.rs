//! # Check Subcommand
//!
//! Verifies a token and cross-checks the license against a snapshot of
//! the live entity it licenses. Every drifted field is reported.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use entl_license::{validate_entity_against_license, EntitySnapshot};

use crate::verify::{print_summary, verified_license};
use crate::{parse_now, read_yaml, report, CliContext};

/// Arguments for `entl check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File holding the license token.
    #[arg(value_name = "TOKEN")]
    pub token: PathBuf,
    /// Live entity snapshot (YAML).
    #[arg(long)]
    pub entity: PathBuf,
    /// Issuer public key (hex). Defaults to `public_key` in the config.
    #[arg(long)]
    pub pubkey: Option<PathBuf>,
    /// Validate as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

/// Execute `entl check`.
pub fn run_check(args: &CheckArgs, ctx: &CliContext) -> Result<u8> {
    let entity: EntitySnapshot = read_yaml(&ctx.path(&args.entity), "entity snapshot")?;
    let license = match verified_license(ctx, &args.token, args.pubkey.as_deref())? {
        Ok(license) => license,
        Err(code) => return Ok(code),
    };
    let now = parse_now(args.now.as_deref())?;
    let standing = match report(validate_entity_against_license(
        &license,
        &entity,
        &ctx.config,
        now,
    ))? {
        Ok(standing) => standing,
        Err(code) => return Ok(code),
    };

    println!("OK: license matches the {} entity", entity.kind().as_str());
    print_summary(&license, standing);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, NOW, ORGANIZATION, USER};

    fn args(token: PathBuf, entity: PathBuf) -> CheckArgs {
        CheckArgs {
            token,
            entity,
            pubkey: None,
            now: Some(NOW.to_string()),
        }
    }

    #[test]
    fn unchanged_organization_matches() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let token = fixtures::issue(&ctx, ORGANIZATION);
        let entity = fixtures::write(dir.path(), "live.yaml", ORGANIZATION);
        assert_eq!(run_check(&args(token, entity), &ctx).unwrap(), 0);
    }

    #[test]
    fn seat_change_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let token = fixtures::issue(&ctx, ORGANIZATION);
        let live = ORGANIZATION.replace("seats: 25", "seats: 30");
        let entity = fixtures::write(dir.path(), "live.yaml", &live);
        assert_eq!(run_check(&args(token, entity), &ctx).unwrap(), 1);
    }

    #[test]
    fn user_premium_revocation_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let token = fixtures::issue(&ctx, USER);
        let live = USER.replace("premium: true", "premium: false");
        let entity = fixtures::write(dir.path(), "live.yaml", &live);
        assert_eq!(run_check(&args(token, entity), &ctx).unwrap(), 1);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let token = fixtures::issue(&ctx, USER);
        let entity = fixtures::write(dir.path(), "live.yaml", ORGANIZATION);
        assert_eq!(run_check(&args(token, entity), &ctx).unwrap(), 1);
    }
}
