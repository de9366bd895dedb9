//! # Issuance
//!
//! Builds licenses from entity snapshots, dates them with the expiration
//! policy, and runs them through the signing pipeline. Refreshing an
//! existing license re-dates and re-signs it; nothing else changes.

use entl_core::{InstallationId, Timestamp};
use entl_crypto::Ed25519KeyPair;

use crate::entity::{OrganizationSnapshot, UserSnapshot};
use crate::error::IssueError;
use crate::expiration::{ExpirationContext, SubscriptionSnapshot, PROVISIONAL_PERIOD_DAYS};
use crate::license::{License, LicenseRecord};
use crate::organization::{OrganizationLicense, ORGANIZATION_LICENSE_VERSION};
use crate::token::sign_license;
use crate::user::{UserLicense, USER_LICENSE_VERSION};

/// Inputs shared by every issuance.
#[derive(Debug, Clone, Copy)]
pub struct IssueParams {
    pub now: Timestamp,
    /// Installation an organization license is bound to.
    pub installation_id: InstallationId,
    pub grace_period_days: i64,
    /// Format version to issue; the current one when unset.
    pub version: Option<u32>,
}

/// Issue and sign an organization license.
pub fn issue_organization_license(
    org: &OrganizationSnapshot,
    subscription: Option<&SubscriptionSnapshot>,
    params: &IssueParams,
    key: &Ed25519KeyPair,
) -> Result<License, IssueError> {
    let ctx = ExpirationContext {
        now: params.now,
        plan_type: org.plan_type,
        expiration: org.expiration_date,
        subscription,
        grace_period_days: params.grace_period_days,
    };
    let dates = ctx.dates()?;

    let license = OrganizationLicense {
        license_key: org.license_key.clone().unwrap_or_default(),
        installation_id: params.installation_id,
        id: org.id,
        name: org.name.clone(),
        billing_email: org.billing_email.clone(),
        business_name: org.business_name.clone().unwrap_or_default(),
        enabled: org.enabled,
        plan: org.plan.clone(),
        plan_type: org.plan_type,
        seats: org.seats,
        max_collections: org.max_collections,
        use_policies: org.use_policies,
        use_sso: org.use_sso,
        use_key_connector: org.use_key_connector,
        use_scim: org.use_scim,
        use_groups: org.use_groups,
        use_events: org.use_events,
        use_directory: org.use_directory,
        use_totp: org.use_totp,
        use_2fa: org.use_2fa,
        use_api: org.use_api,
        use_reset_password: org.use_reset_password,
        use_secrets_manager: org.use_secrets_manager,
        use_password_manager: org.use_password_manager,
        use_custom_permissions: org.use_custom_permissions,
        max_storage_gb: org.max_storage_gb,
        self_host: org.self_host,
        users_get_premium: org.users_get_premium,
        sm_seats: org.sm_seats,
        sm_service_accounts: org.sm_service_accounts,
        limit_collection_creation_deletion: org.limit_collection_creation
            || org.limit_collection_deletion,
        allow_admin_access_to_all_collection_items: org.allow_admin_access_to_all_collection_items,
        use_admin_sponsored_families: org.use_admin_sponsored_families,
        use_automatic_user_confirmation: org.use_automatic_user_confirmation,
        use_organization_domains: org.use_organization_domains,
        use_risk_insights: org.use_risk_insights,
        expiration_without_grace_period: Some(dates.expiration_without_grace_period),
        version: params.version.unwrap_or(ORGANIZATION_LICENSE_VERSION),
        trial: ctx.is_trialing(),
        issued: params.now,
        refresh: Some(dates.refresh),
        expires: Some(dates.expires),
        hash: None,
        signature: None,
        token: None,
    };
    tracing::debug!(org = %org.id, expires = %dates.expires, "issuing organization license");
    finish(license.into(), key)
}

/// Issue and sign a user license.
pub fn issue_user_license(
    user: &UserSnapshot,
    subscription: Option<&SubscriptionSnapshot>,
    params: &IssueParams,
    key: &Ed25519KeyPair,
) -> Result<License, IssueError> {
    let (refresh, expires, trial) = user_dates(user.premium_expiration_date, subscription, params.now)?;
    let license = UserLicense {
        license_key: user.license_key.clone().unwrap_or_default(),
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        premium: user.premium,
        max_storage_gb: user.max_storage_gb,
        version: params.version.unwrap_or(USER_LICENSE_VERSION),
        trial,
        issued: params.now,
        refresh,
        expires,
        hash: None,
        signature: None,
        token: None,
    };
    tracing::debug!(user = %user.id, "issuing user license");
    finish(license.into(), key)
}

/// User licenses follow the billing period directly: refresh at the period
/// end, expire a provisional week later. Without a subscription the stored
/// premium expiration plays the period end's role.
fn user_dates(
    premium_expiration: Option<Timestamp>,
    subscription: Option<&SubscriptionSnapshot>,
    now: Timestamp,
) -> Result<(Option<Timestamp>, Option<Timestamp>, bool), IssueError> {
    let (anchor, trial) = match subscription {
        Some(sub) => (sub.period_end, sub.is_trialing(now)),
        None => (premium_expiration, false),
    };
    let expires = anchor
        .map(|t| t.plus_days(PROVISIONAL_PERIOD_DAYS))
        .transpose()?;
    Ok((anchor, expires, trial))
}

/// Re-date an existing license as of `now` and re-sign it.
///
/// The license's current expiration is the prior expiration the policy
/// extends from. Entitlements, identity and version are kept.
pub fn refresh_license(
    license: &mut License,
    subscription: Option<&SubscriptionSnapshot>,
    params: &IssueParams,
    key: &Ed25519KeyPair,
) -> Result<(), IssueError> {
    match license {
        License::Organization(l) => {
            let ctx = ExpirationContext {
                now: params.now,
                plan_type: l.plan_type,
                expiration: l.expires,
                subscription,
                grace_period_days: params.grace_period_days,
            };
            let dates = ctx.dates()?;
            l.issued = params.now;
            l.expires = Some(dates.expires);
            l.refresh = Some(dates.refresh);
            l.expiration_without_grace_period = Some(dates.expiration_without_grace_period);
            l.trial = ctx.is_trialing();
        }
        License::User(l) => {
            let prior = l.refresh.or(l.expires);
            let (refresh, expires, trial) = user_dates(prior, subscription, params.now)?;
            l.issued = params.now;
            l.refresh = refresh;
            l.expires = expires;
            l.trial = trial;
        }
    }
    sign_license(license, key)?;
    tracing::debug!(license_key = license.license_key(), "license refreshed");
    Ok(())
}

fn finish(mut license: License, key: &Ed25519KeyPair) -> Result<License, IssueError> {
    sign_license(&mut license, key)?;
    Ok(license)
}
