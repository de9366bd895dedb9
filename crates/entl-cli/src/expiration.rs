//! # Expiration Subcommand
//!
//! Previews the dates a license issued now would carry for an
//! organization, without signing anything.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use entl_license::{EntitySnapshot, ExpirationContext, SubscriptionSnapshot};

use crate::{parse_now, read_yaml, CliContext};

/// Arguments for `entl expiration`.
#[derive(Args, Debug)]
pub struct ExpirationArgs {
    /// Organization snapshot (YAML).
    #[arg(long)]
    pub entity: PathBuf,
    /// Subscription snapshot (YAML).
    #[arg(long)]
    pub subscription: Option<PathBuf>,
    /// Self-host grace period in days. Defaults to the config value.
    #[arg(long)]
    pub grace_days: Option<i64>,
    /// Compute as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

/// Execute `entl expiration`.
pub fn run_expiration(args: &ExpirationArgs, ctx: &CliContext) -> Result<u8> {
    let entity: EntitySnapshot = read_yaml(&ctx.path(&args.entity), "entity snapshot")?;
    let EntitySnapshot::Organization(org) = entity else {
        bail!("expiration previews apply to organization snapshots");
    };
    let subscription: Option<SubscriptionSnapshot> = args
        .subscription
        .as_ref()
        .map(|p| read_yaml(&ctx.path(p), "subscription snapshot"))
        .transpose()?;

    let policy = ExpirationContext {
        now: parse_now(args.now.as_deref())?,
        plan_type: org.plan_type,
        expiration: org.expiration_date,
        subscription: subscription.as_ref(),
        grace_period_days: args
            .grace_days
            .unwrap_or(ctx.config.self_host_grace_period_days),
    };
    let dates = policy.dates().context("expiration out of range")?;

    println!("Organization: {} ({})", org.id, org.name);
    println!("  Plan:                        {}", org.plan_type);
    println!("  Trialing:                    {}", policy.is_trialing());
    println!("  Expires:                     {}", dates.expires);
    println!("  Refresh:                     {}", dates.refresh);
    println!(
        "  Expiration without grace:    {}",
        dates.expiration_without_grace_period
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, NOW, ORGANIZATION, USER};

    fn args(entity: PathBuf, subscription: Option<PathBuf>) -> ExpirationArgs {
        ExpirationArgs {
            entity,
            subscription,
            grace_days: None,
            now: Some(NOW.to_string()),
        }
    }

    #[test]
    fn previews_annual_subscription() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let entity = fixtures::write(dir.path(), "org.yaml", ORGANIZATION);
        let subscription = fixtures::write(
            dir.path(),
            "sub.yaml",
            "period_start: 2026-01-01T00:00:00Z\nperiod_end: 2027-01-01T00:00:00Z\n",
        );
        assert_eq!(
            run_expiration(&args(entity, Some(subscription)), &ctx).unwrap(),
            0
        );
    }

    #[test]
    fn user_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let entity = fixtures::write(dir.path(), "user.yaml", USER);
        assert!(run_expiration(&args(entity, None), &ctx).is_err());
    }

    #[test]
    fn unknown_subscription_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixtures::context(dir.path());
        let entity = fixtures::write(dir.path(), "org.yaml", ORGANIZATION);
        let subscription = fixtures::write(dir.path(), "sub.yaml", "renews_at: tomorrow\n");
        assert!(run_expiration(&args(entity, Some(subscription)), &ctx).is_err());
    }
}
