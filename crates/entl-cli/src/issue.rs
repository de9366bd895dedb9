//! # Issue Subcommand
//!
//! Issues and signs a license from an entity snapshot file. The snapshot
//! is a YAML document tagged with `kind: organization` or `kind: user`;
//! an optional subscription snapshot feeds the expiration policy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use entl_license::{
    issue_organization_license, issue_user_license, EntitySnapshot, IssueParams, LicenseRecord,
    SubscriptionSnapshot,
};

use crate::{parse_now, read_yaml, CliContext};

/// Arguments for `entl issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Entity snapshot to license (YAML).
    #[arg(long)]
    pub entity: PathBuf,
    /// Subscription snapshot (YAML).
    #[arg(long)]
    pub subscription: Option<PathBuf>,
    /// Issuer signing key (hex seed). Defaults to `signing_key` in the config.
    #[arg(long)]
    pub key: Option<PathBuf>,
    /// Format version to issue. Defaults to the current one.
    #[arg(long)]
    pub version: Option<u32>,
    /// Write the token here instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
    /// Issue as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

/// Execute `entl issue`.
pub fn run_issue(args: &IssueArgs, ctx: &CliContext) -> Result<u8> {
    let key = ctx.signing_key(args.key.as_deref())?;
    let entity: EntitySnapshot = read_yaml(&ctx.path(&args.entity), "entity snapshot")?;
    let subscription: Option<SubscriptionSnapshot> = args
        .subscription
        .as_ref()
        .map(|p| read_yaml(&ctx.path(p), "subscription snapshot"))
        .transpose()?;

    let mut params = IssueParams {
        now: parse_now(args.now.as_deref())?,
        installation_id: ctx.config.installation_id.unwrap_or_default(),
        grace_period_days: ctx.config.self_host_grace_period_days,
        version: args.version,
    };

    let license = match &entity {
        EntitySnapshot::Organization(org) => {
            params.installation_id = ctx
                .config
                .installation_id
                .context("organization licenses need installation_id in the config")?;
            issue_organization_license(org, subscription.as_ref(), &params, &key)
        }
        EntitySnapshot::User(user) => {
            issue_user_license(user, subscription.as_ref(), &params, &key)
        }
    }
    .context("failed to issue license")?;

    let token = license.token().context("issued license carries no token")?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, token)
                .with_context(|| format!("failed to write token: {}", out.display()))?;
            println!("OK: issued {} license", license.kind().as_str());
            println!("  Token:   {}", out.display());
            println!("  Version: {}", license.version());
            match license.expires() {
                Some(expires) => println!("  Expires: {expires}"),
                None => println!("  Expires: never"),
            }
        }
        None => println!("{token}"),
    }
    Ok(0)
}
