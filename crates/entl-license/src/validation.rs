//! # Validation Commands
//!
//! Three orchestrators over the encoder, hasher, token framing and
//! configuration. Each returns a typed result; an expected rejection is
//! [`ValidationError::Rejected`], and only a schema/instance inconsistency
//! surfaces as [`ValidationError::Fault`].
//!
//! ## Token Verification Order
//!
//! 1. Split the token and decode both parts (`MalformedToken`).
//! 2. Verify the signature over the payload bytes exactly as received
//!    (`SignatureInvalid`). Nothing is parsed before this step, so a
//!    flipped bit can only ever report a signature failure.
//! 3. Decode the payload strictly (`UnsupportedVersion`, `MalformedToken`).
//! 4. Re-encode at the declared version and require the received bytes
//!    (`SignatureInvalid`).
//! 5. Recompute the hash (`HashMismatch`).
//!
//! Every rejection is logged at `warn` with the failure kind as a field.

use chrono::TimeDelta;
use entl_core::Timestamp;
use entl_crypto::{verify_bytes, Ed25519PublicKey};
use uuid::Uuid;

use crate::claims::{from_claims, license_from_claims, ClaimsSource};
use crate::config::LicensingConfig;
use crate::encoder::{decode_exact, payload_bytes};
use crate::entity::{EntitySnapshot, OrganizationSnapshot, UserSnapshot};
use crate::error::{DecodeError, LicenseFailure, ValidationError};
use crate::hasher::verify_hash;
use crate::license::{License, LicenseKind, LicenseRecord};
use crate::plan::LicenseType;
use crate::organization::OrganizationLicense;
use crate::schema::{fields, max_version};
use crate::token::split_token;
use crate::user::UserLicense;

/// How a license that passed validation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStanding {
    /// Valid, and not yet due for refresh.
    Current,
    /// Valid, but `Refresh` has passed and a new license should be fetched.
    RefreshDue,
}

fn reject(failure: LicenseFailure) -> ValidationError {
    tracing::warn!(failure = failure.kind(), class = ?failure.class(), "license rejected: {failure}");
    ValidationError::Rejected(failure)
}

// ─── Token ───────────────────────────────────────────────────────────

/// Verify a token and return the license it carries.
///
/// The returned license has `Signature` and `Token` attached from the token
/// itself. Temporal and entitlement checks are left to [`validate_license`]
/// and [`validate_entity_against_license`].
pub fn validate_license_token(
    token: &str,
    public_key: &Ed25519PublicKey,
) -> Result<License, ValidationError> {
    let parts = split_token(token).map_err(reject)?;

    if let Err(e) = verify_bytes(&parts.payload, &parts.signature, public_key) {
        tracing::debug!(error = %e, "signature verification failed");
        return Err(reject(LicenseFailure::SignatureInvalid));
    }

    let mut license = decode_exact(&parts.payload).map_err(|e| {
        reject(match e {
            DecodeError::UnsupportedVersion { version, max, .. } => {
                LicenseFailure::UnsupportedVersion { version, max }
            }
            other => LicenseFailure::MalformedToken(other.to_string()),
        })
    })?;

    let reencoded = payload_bytes(&license)?;
    if reencoded.as_bytes() != parts.payload.as_slice() {
        return Err(reject(LicenseFailure::SignatureInvalid));
    }

    if !verify_hash(&license)? {
        return Err(reject(LicenseFailure::HashMismatch));
    }

    license.set_signature(Some(parts.signature.to_base64()));
    license.set_token(Some(token.trim().to_string()));
    tracing::debug!(
        kind = %license.kind(),
        version = license.version(),
        license_key = license.license_key(),
        "license token verified"
    );
    Ok(license)
}

// ─── License ─────────────────────────────────────────────────────────

/// Check a decoded license against the clock and this installation.
///
/// Organization licenses must also be enabled, allow self-hosting, and be
/// bound to the configured installation (when one is configured).
pub fn validate_license(
    license: &License,
    now: Timestamp,
    config: &LicensingConfig,
) -> Result<LicenseStanding, ValidationError> {
    let standing = check_window(license, now, config).map_err(reject)?;
    check_installation(license, config).map_err(reject)?;
    if let License::Organization(l) = license {
        let mut refused = Vec::new();
        if !l.enabled {
            refused.push(fields::ENABLED);
        }
        if !l.self_host {
            refused.push(fields::SELF_HOST);
        }
        if !refused.is_empty() {
            return Err(reject(LicenseFailure::EntitlementMismatch { fields: refused }));
        }
    }
    Ok(standing)
}

fn horizon(now: Timestamp, config: &LicensingConfig) -> Option<Timestamp> {
    now.plus_months(config.max_expiration_years.saturating_mul(12)).ok()
}

/// Version range and the temporal guards.
fn check_window(
    license: &License,
    now: Timestamp,
    config: &LicensingConfig,
) -> Result<LicenseStanding, LicenseFailure> {
    let max = max_version(license.kind());
    let version = license.version();
    if version == 0 || version > max {
        return Err(LicenseFailure::UnsupportedVersion { version, max });
    }

    let issued = license.issued();
    if issued > now {
        return Err(LicenseFailure::NotYetIssued {
            issued: issued.to_iso8601(),
        });
    }
    if let Some(expires) = license.expires() {
        if expires < now {
            return Err(LicenseFailure::Expired {
                expires: expires.to_iso8601(),
            });
        }
        if horizon(now, config).is_some_and(|limit| expires > limit) {
            return Err(LicenseFailure::ExpirationOutOfRange {
                expires: expires.to_iso8601(),
            });
        }
    }
    match license.refresh() {
        Some(refresh) if refresh < issued => Err(LicenseFailure::RefreshInconsistent),
        Some(refresh) if refresh <= now => Ok(LicenseStanding::RefreshDue),
        _ => Ok(LicenseStanding::Current),
    }
}

fn check_installation(license: &License, config: &LicensingConfig) -> Result<(), LicenseFailure> {
    match (license, config.installation_id) {
        (License::Organization(l), Some(actual)) if l.installation_id != actual => {
            Err(LicenseFailure::InstallationMismatch {
                licensed: l.installation_id.to_string(),
                actual: actual.to_string(),
            })
        }
        _ => Ok(()),
    }
}

// ─── Entity ──────────────────────────────────────────────────────────

/// Cross-check a decoded license against the live entity it licenses.
///
/// Runs the version and temporal guards and the installation binding, then
/// compares every field the license's version covers. All mismatching
/// fields are reported together.
pub fn validate_entity_against_license(
    license: &License,
    entity: &EntitySnapshot,
    config: &LicensingConfig,
    now: Timestamp,
) -> Result<LicenseStanding, ValidationError> {
    let standing = check_window(license, now, config).map_err(reject)?;
    check_installation(license, config).map_err(reject)?;

    let mismatched = match (license, entity) {
        (License::Organization(l), EntitySnapshot::Organization(org)) => organization_drift(l, org),
        (License::User(l), EntitySnapshot::User(user)) => user_drift(l, user, l.version),
        _ => vec![fields::LICENSE_TYPE],
    };
    if !mismatched.is_empty() {
        return Err(reject(LicenseFailure::EntitlementMismatch { fields: mismatched }));
    }
    Ok(standing)
}

/// Collects the names of fields whose values differ, skipping fields the
/// license's version predates.
struct Drift {
    version: u32,
    fields: Vec<&'static str>,
}

impl Drift {
    fn check(&mut self, name: &'static str, since: u32, equal: bool) {
        if self.version >= since && !equal {
            self.fields.push(name);
        }
    }
}

fn organization_drift(l: &OrganizationLicense, org: &OrganizationSnapshot) -> Vec<&'static str> {
    let mut d = entitlement_drift(l, org, l.version);
    // Licenses from version 16 on require domain verification to be on.
    d.check(fields::USE_ORGANIZATION_DOMAINS, 16, org.use_organization_domains);
    d.fields
}

/// Claim-carried entitlements, compared unconditionally.
fn claimed_organization_drift(
    claimed: &OrganizationLicense,
    org: &OrganizationSnapshot,
    version: u32,
) -> Vec<&'static str> {
    let mut d = entitlement_drift(claimed, org, version);
    d.check(
        fields::USE_ADMIN_SPONSORED_FAMILIES,
        1,
        org.use_admin_sponsored_families == claimed.use_admin_sponsored_families,
    );
    d.check(
        fields::USE_ORGANIZATION_DOMAINS,
        1,
        org.use_organization_domains == claimed.use_organization_domains,
    );
    d.check(
        fields::USE_AUTOMATIC_USER_CONFIRMATION,
        1,
        org.use_automatic_user_confirmation == claimed.use_automatic_user_confirmation,
    );
    d.fields
}

fn entitlement_drift(l: &OrganizationLicense, org: &OrganizationSnapshot, version: u32) -> Drift {
    let mut d = Drift {
        version,
        fields: Vec::new(),
    };
    d.check(
        fields::LICENSE_KEY,
        1,
        org.license_key.as_deref() == Some(l.license_key.as_str()),
    );
    d.check(fields::ENABLED, 1, org.enabled == l.enabled);
    d.check(fields::PLAN_TYPE, 1, l.plan_type.is_satisfied_by(org.plan_type));
    d.check(fields::SEATS, 1, org.seats == l.seats);
    d.check(fields::MAX_COLLECTIONS, 1, org.max_collections == l.max_collections);
    d.check(fields::USE_GROUPS, 1, org.use_groups == l.use_groups);
    d.check(fields::USE_DIRECTORY, 1, org.use_directory == l.use_directory);
    d.check(fields::USE_TOTP, 1, org.use_totp == l.use_totp);
    d.check(fields::SELF_HOST, 1, org.self_host == l.self_host);
    d.check(fields::NAME, 1, org.name == l.name);
    d.check(fields::USERS_GET_PREMIUM, 2, org.users_get_premium == l.users_get_premium);
    d.check(fields::USE_EVENTS, 3, org.use_events == l.use_events);
    d.check(fields::USE_2FA, 4, org.use_2fa == l.use_2fa);
    d.check(fields::USE_API, 5, org.use_api == l.use_api);
    d.check(fields::USE_POLICIES, 6, org.use_policies == l.use_policies);
    d.check(fields::USE_SSO, 7, org.use_sso == l.use_sso);
    d.check(fields::USE_RESET_PASSWORD, 8, org.use_reset_password == l.use_reset_password);
    d.check(fields::USE_KEY_CONNECTOR, 9, org.use_key_connector == l.use_key_connector);
    d.check(fields::USE_SCIM, 10, org.use_scim == l.use_scim);
    d.check(
        fields::USE_CUSTOM_PERMISSIONS,
        11,
        org.use_custom_permissions == l.use_custom_permissions,
    );
    // ExpirationWithoutGracePeriod (12) is informational and never stored
    // on the entity. The collection-management flags (14, 15) are unused.
    d.check(
        fields::USE_SECRETS_MANAGER,
        13,
        org.use_secrets_manager == l.use_secrets_manager,
    );
    d.check(
        fields::USE_PASSWORD_MANAGER,
        13,
        org.use_password_manager == l.use_password_manager,
    );
    d.check(fields::SM_SEATS, 13, org.sm_seats == l.sm_seats);
    d.check(
        fields::SM_SERVICE_ACCOUNTS,
        13,
        org.sm_service_accounts == l.sm_service_accounts,
    );
    d
}

fn user_drift(l: &UserLicense, user: &UserSnapshot, version: u32) -> Vec<&'static str> {
    let mut d = Drift {
        version,
        fields: Vec::new(),
    };
    d.check(
        fields::LICENSE_KEY,
        1,
        user.license_key.as_deref() == Some(l.license_key.as_str()),
    );
    d.check(fields::PREMIUM, 1, user.premium == l.premium);
    d.check(fields::EMAIL, 1, user.email == l.email);
    d.fields
}

// ─── Claims ──────────────────────────────────────────────────────────

/// Cross-check identity claims embedded elsewhere against a license and
/// the live entity it licenses.
///
/// Checks run in order, stopping at the first failing group:
///
/// 1. `Id`, `LicenseKey` and, for organizations, `InstallationId` must
///    match the license exactly, and the license must be bound to this
///    installation.
/// 2. `LicenseType` must name the license's kind; an organization's
///    `Enabled` and `SelfHost` claims must both be true.
/// 3. The claims `Expires` must lie within the configured tolerance of the
///    license's (skipped when the license never expires), and the claimed
///    validity window must itself hold at `now`.
/// 4. Every entitlement claim must match `entity`, including the
///    claim-only flags. All mismatching fields are reported together.
pub fn validate_claims_against_license(
    license: &License,
    claims: &impl ClaimsSource,
    entity: &EntitySnapshot,
    config: &LicensingConfig,
    now: Timestamp,
) -> Result<(), ValidationError> {
    check_claims(license, claims, config, now).map_err(reject)?;
    check_claimed_entitlements(license, claims, entity).map_err(reject)
}

fn check_claims(
    license: &License,
    claims: &impl ClaimsSource,
    config: &LicensingConfig,
    now: Timestamp,
) -> Result<(), LicenseFailure> {
    let (id, installation) = match license {
        License::Organization(l) => (l.id.0, Some(l.installation_id.0)),
        License::User(l) => (l.id.0, None),
    };
    if from_claims::<Uuid>(claims, fields::ID) != id {
        return Err(LicenseFailure::ClaimsMismatch { field: fields::ID });
    }
    if from_claims::<String>(claims, fields::LICENSE_KEY) != license.license_key() {
        return Err(LicenseFailure::ClaimsMismatch {
            field: fields::LICENSE_KEY,
        });
    }
    if let Some(installation) = installation {
        if from_claims::<Uuid>(claims, fields::INSTALLATION_ID) != installation {
            return Err(LicenseFailure::ClaimsMismatch {
                field: fields::INSTALLATION_ID,
            });
        }
    }
    check_installation(license, config)?;

    let claimed_type: Option<LicenseType> = from_claims(claims, fields::LICENSE_TYPE);
    if claimed_type != Some(license.license_type()) {
        return Err(LicenseFailure::ClaimsMismatch {
            field: fields::LICENSE_TYPE,
        });
    }
    if license.kind() == LicenseKind::Organization {
        let refused: Vec<_> = [fields::ENABLED, fields::SELF_HOST]
            .into_iter()
            .filter(|name| !from_claims::<bool>(claims, name))
            .collect();
        if !refused.is_empty() {
            return Err(LicenseFailure::EntitlementMismatch { fields: refused });
        }
    }

    let issued: Timestamp = from_claims(claims, fields::ISSUED);
    if issued > now {
        return Err(LicenseFailure::NotYetIssued {
            issued: issued.to_iso8601(),
        });
    }

    let claimed: Option<Timestamp> = from_claims(claims, fields::EXPIRES);
    if let Some(expires) = license.expires() {
        let within = claimed.is_some_and(|c| within_tolerance(c, expires, config.claims_tolerance()));
        if !within {
            return Err(LicenseFailure::ClaimsMismatch {
                field: fields::EXPIRES,
            });
        }
    }
    if let Some(claimed) = claimed {
        if claimed < now {
            return Err(LicenseFailure::Expired {
                expires: claimed.to_iso8601(),
            });
        }
        if horizon(now, config).is_some_and(|limit| claimed > limit) {
            return Err(LicenseFailure::ExpirationOutOfRange {
                expires: claimed.to_iso8601(),
            });
        }
    }
    Ok(())
}

/// Compare the entitlements the claims carry with the live entity, gated
/// by the verified license's version.
fn check_claimed_entitlements(
    license: &License,
    claims: &impl ClaimsSource,
    entity: &EntitySnapshot,
) -> Result<(), LicenseFailure> {
    let version = license.version();
    let mismatched = match (license_from_claims(license.kind(), claims), entity) {
        (License::Organization(claimed), EntitySnapshot::Organization(org)) => {
            claimed_organization_drift(&claimed, org, version)
        }
        (License::User(claimed), EntitySnapshot::User(user)) => user_drift(&claimed, user, version),
        _ => vec![fields::LICENSE_TYPE],
    };
    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(LicenseFailure::EntitlementMismatch { fields: mismatched })
    }
}

fn within_tolerance(a: Timestamp, b: Timestamp, tolerance: TimeDelta) -> bool {
    a.since(&b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{to_claims, ClaimsSink};
    use crate::issuance::{issue_organization_license, issue_user_license, IssueParams};
    use crate::plan::PlanType;
    use entl_core::{InstallationId, OrganizationId, UserId};
    use entl_crypto::Ed25519KeyPair;
    use std::collections::BTreeMap;

    fn now() -> Timestamp {
        Timestamp::parse("2026-06-01T00:00:00Z").unwrap()
    }

    fn installation() -> InstallationId {
        InstallationId(Uuid::from_u128(0x789))
    }

    fn key() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed(&[9u8; 32])
    }

    fn config() -> LicensingConfig {
        LicensingConfig {
            installation_id: Some(installation()),
            ..Default::default()
        }
    }

    fn org() -> OrganizationSnapshot {
        OrganizationSnapshot {
            id: OrganizationId(Uuid::from_u128(0x123)),
            name: "Acme".into(),
            license_key: Some("acme-key".into()),
            enabled: true,
            plan_type: PlanType::TeamsAnnually,
            seats: Some(25),
            self_host: true,
            use_groups: true,
            use_sso: true,
            ..Default::default()
        }
    }

    fn params() -> IssueParams {
        IssueParams {
            now: now(),
            installation_id: installation(),
            grace_period_days: 60,
            version: None,
        }
    }

    fn org_license() -> License {
        issue_organization_license(&org(), None, &params(), &key()).unwrap()
    }

    fn failure(result: Result<impl std::fmt::Debug, ValidationError>) -> LicenseFailure {
        result.unwrap_err().failure().cloned().unwrap()
    }

    // ── Token ──

    #[test]
    fn test_token_roundtrip() {
        let issued = org_license();
        let token = issued.token().unwrap().to_string();
        let verified = validate_license_token(&token, &key().public_key()).unwrap();
        assert_eq!(verified, issued);
    }

    #[test]
    fn test_token_with_trailing_newline() {
        let issued = org_license();
        let token = format!("{}\n", issued.token().unwrap());
        let verified = validate_license_token(&token, &key().public_key()).unwrap();
        assert_eq!(verified.token(), issued.token());
    }

    #[test]
    fn test_token_wrong_key() {
        let token = org_license().token().unwrap().to_string();
        let other = Ed25519KeyPair::from_seed(&[10u8; 32]).public_key();
        assert_eq!(
            failure(validate_license_token(&token, &other)),
            LicenseFailure::SignatureInvalid
        );
    }

    #[test]
    fn test_token_garbage() {
        assert!(matches!(
            failure(validate_license_token("not a token", &key().public_key())),
            LicenseFailure::MalformedToken(_)
        ));
    }

    // ── License ──

    #[test]
    fn test_fresh_license_is_current() {
        let l = org_license();
        assert_eq!(
            validate_license(&l, now(), &config()).unwrap(),
            LicenseStanding::Current
        );
    }

    #[test]
    fn test_provisional_license_expires_after_a_week() {
        let l = org_license();
        let later = now().plus_days(8).unwrap();
        assert!(matches!(
            failure(validate_license(&l, later, &config())),
            LicenseFailure::Expired { .. }
        ));
    }

    #[test]
    fn test_refresh_due() {
        let mut l = org_license();
        if let License::Organization(o) = &mut l {
            o.refresh = Some(now().plus_days(1).unwrap());
        }
        let later = now().plus_days(2).unwrap();
        assert_eq!(
            validate_license(&l, later, &config()).unwrap(),
            LicenseStanding::RefreshDue
        );
    }

    #[test]
    fn test_not_yet_issued() {
        let l = org_license();
        let earlier = now().plus_days(-1).unwrap();
        assert!(matches!(
            failure(validate_license(&l, earlier, &config())),
            LicenseFailure::NotYetIssued { .. }
        ));
    }

    #[test]
    fn test_expiration_beyond_horizon() {
        let mut l = org_license();
        if let License::Organization(o) = &mut l {
            o.expires = Some(now().plus_months(12 * 11).unwrap());
        }
        assert!(matches!(
            failure(validate_license(&l, now(), &config())),
            LicenseFailure::ExpirationOutOfRange { .. }
        ));
    }

    #[test]
    fn test_refresh_before_issue() {
        let mut l = org_license();
        if let License::Organization(o) = &mut l {
            o.refresh = Some(now().plus_days(-3).unwrap());
        }
        assert_eq!(
            failure(validate_license(&l, now(), &config())),
            LicenseFailure::RefreshInconsistent
        );
    }

    #[test]
    fn test_version_out_of_range() {
        let mut l = org_license();
        if let License::Organization(o) = &mut l {
            o.version = 17;
        }
        assert_eq!(
            failure(validate_license(&l, now(), &config())),
            LicenseFailure::UnsupportedVersion { version: 17, max: 16 }
        );
    }

    #[test]
    fn test_installation_binding() {
        let l = org_license();
        let elsewhere = LicensingConfig {
            installation_id: Some(InstallationId(Uuid::from_u128(1))),
            ..Default::default()
        };
        assert!(matches!(
            failure(validate_license(&l, now(), &elsewhere)),
            LicenseFailure::InstallationMismatch { .. }
        ));
        // Unbound verifier.
        assert!(validate_license(&l, now(), &LicensingConfig::default()).is_ok());
    }

    #[test]
    fn test_disabled_or_cloud_only_license_refused() {
        let snapshot = OrganizationSnapshot {
            enabled: false,
            self_host: false,
            ..org()
        };
        let l = issue_organization_license(&snapshot, None, &params(), &key()).unwrap();
        assert_eq!(
            failure(validate_license(&l, now(), &config())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["Enabled", "SelfHost"]
            }
        );
    }

    // ── Entity ──

    #[test]
    fn test_matching_entity() {
        let l = org_license();
        let entity = EntitySnapshot::from(org());
        assert!(validate_entity_against_license(&l, &entity, &config(), now()).is_ok());
    }

    #[test]
    fn test_entity_drift_reports_every_field() {
        let l = org_license();
        let entity = EntitySnapshot::from(OrganizationSnapshot {
            seats: Some(26),
            use_sso: false,
            license_key: None,
            ..org()
        });
        assert_eq!(
            failure(validate_entity_against_license(&l, &entity, &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["LicenseKey", "Seats", "UseSso"]
            }
        );
    }

    #[test]
    fn test_entity_fields_gated_by_version() {
        let p = IssueParams {
            version: Some(6),
            ..params()
        };
        let l = issue_organization_license(&org(), None, &p, &key()).unwrap();
        // UseSso arrived in version 7.
        let entity = EntitySnapshot::from(OrganizationSnapshot {
            use_sso: false,
            ..org()
        });
        assert!(validate_entity_against_license(&l, &entity, &config(), now()).is_ok());
    }

    #[test]
    fn test_v16_license_requires_organization_domains() {
        let p = IssueParams {
            version: Some(16),
            ..params()
        };
        let l = issue_organization_license(&org(), None, &p, &key()).unwrap();
        assert_eq!(
            failure(validate_entity_against_license(&l, &entity(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["UseOrganizationDomains"]
            }
        );
        let verified = EntitySnapshot::from(OrganizationSnapshot {
            use_organization_domains: true,
            ..org()
        });
        assert!(validate_entity_against_license(&l, &verified, &config(), now()).is_ok());
        // Version 15 never looks at it.
        assert!(validate_entity_against_license(&org_license(), &verified, &config(), now()).is_ok());
    }

    #[test]
    fn test_families_plan_migration_accepted() {
        let snapshot = OrganizationSnapshot {
            plan_type: PlanType::FamiliesAnnually,
            ..org()
        };
        let l = issue_organization_license(&snapshot, None, &params(), &key()).unwrap();
        let entity = EntitySnapshot::from(OrganizationSnapshot {
            plan_type: PlanType::FamiliesAnnually2025,
            ..org()
        });
        assert!(validate_entity_against_license(&l, &entity, &config(), now()).is_ok());
    }

    #[test]
    fn test_entity_kind_mismatch() {
        let l = org_license();
        let entity = EntitySnapshot::from(UserSnapshot::default());
        assert_eq!(
            failure(validate_entity_against_license(&l, &entity, &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["LicenseType"]
            }
        );
    }

    #[test]
    fn test_user_entity() {
        let user = UserSnapshot {
            id: UserId(Uuid::from_u128(0x55)),
            email: "ada@example.com".into(),
            license_key: Some("ada-key".into()),
            premium: true,
            premium_expiration_date: Some(now().plus_days(20).unwrap()),
            ..Default::default()
        };
        let l = issue_user_license(&user, None, &params(), &key()).unwrap();
        assert!(validate_entity_against_license(&l, &user.clone().into(), &config(), now()).is_ok());

        let drifted = UserSnapshot {
            email: "eve@example.com".into(),
            premium: false,
            ..user
        };
        assert_eq!(
            failure(validate_entity_against_license(&l, &drifted.into(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["Premium", "Email"]
            }
        );
    }

    // ── Claims ──

    fn entity() -> EntitySnapshot {
        org().into()
    }

    fn claims_of(l: &License) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for claim in to_claims(l).iter() {
            map.add_claim(&claim.name, claim.value.clone());
        }
        map
    }

    #[test]
    fn test_claims_of_same_license_match() {
        let l = org_license();
        assert!(validate_claims_against_license(&l, &claims_of(&l), &entity(), &config(), now()).is_ok());
    }

    #[test]
    fn test_claims_identity_mismatch() {
        let l = org_license();
        let mut claims = claims_of(&l);
        claims.insert("LicenseKey".into(), "other".into());
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::ClaimsMismatch {
                field: "LicenseKey"
            }
        );

        let mut claims = claims_of(&l);
        claims.insert(
            "InstallationId".into(),
            Uuid::from_u128(3).hyphenated().to_string(),
        );
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::ClaimsMismatch {
                field: "InstallationId"
            }
        );
    }

    #[test]
    fn test_claims_expiration_tolerance() {
        let l = org_license();
        let expires = l.expires().unwrap();

        let mut claims = claims_of(&l);
        claims.insert(
            "Expires".into(),
            expires.plus(TimeDelta::try_seconds(45).unwrap()).unwrap().to_iso8601(),
        );
        assert!(validate_claims_against_license(&l, &claims, &entity(), &config(), now()).is_ok());

        claims.insert(
            "Expires".into(),
            expires.plus(TimeDelta::try_seconds(120).unwrap()).unwrap().to_iso8601(),
        );
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::ClaimsMismatch { field: "Expires" }
        );
    }

    #[test]
    fn test_claims_expiration_beyond_horizon() {
        let mut l = org_license();
        if let License::Organization(o) = &mut l {
            o.expires = None;
        }
        let mut claims = claims_of(&l);
        claims.insert(
            "Expires".into(),
            now().plus_months(12 * 20).unwrap().to_iso8601(),
        );
        assert!(matches!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::ExpirationOutOfRange { .. }
        ));
    }

    #[test]
    fn test_claims_type_and_hosting_checked() {
        let l = org_license();
        let mut claims = claims_of(&l);
        claims.insert("LicenseType".into(), "User".into());
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::ClaimsMismatch {
                field: "LicenseType"
            }
        );

        let mut claims = claims_of(&l);
        claims.insert("Enabled".into(), "false".into());
        claims.insert("SelfHost".into(), "false".into());
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["Enabled", "SelfHost"]
            }
        );
    }

    #[test]
    fn test_claims_bound_to_installation() {
        let l = org_license();
        let elsewhere = LicensingConfig {
            installation_id: Some(InstallationId(Uuid::from_u128(1))),
            ..Default::default()
        };
        assert!(matches!(
            failure(validate_claims_against_license(&l, &claims_of(&l), &entity(), &elsewhere, now())),
            LicenseFailure::InstallationMismatch { .. }
        ));
    }

    #[test]
    fn test_claimed_entitlements_compared_with_entity() {
        let l = org_license();
        let drifted = EntitySnapshot::from(OrganizationSnapshot {
            seats: Some(26),
            use_groups: false,
            use_admin_sponsored_families: true,
            use_automatic_user_confirmation: true,
            ..org()
        });
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims_of(&l), &drifted, &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec![
                    "Seats",
                    "UseGroups",
                    "UseAdminSponsoredFamilies",
                    "UseAutomaticUserConfirmation"
                ]
            }
        );
    }

    #[test]
    fn test_claim_only_flags_follow_issuance() {
        let snapshot = OrganizationSnapshot {
            use_organization_domains: true,
            ..org()
        };
        let l = issue_organization_license(&snapshot, None, &params(), &key()).unwrap();
        let claims = claims_of(&l);
        assert_eq!(claims.get("UseOrganizationDomains").map(String::as_str), Some("true"));
        assert!(
            validate_claims_against_license(&l, &claims, &snapshot.into(), &config(), now()).is_ok()
        );
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["UseOrganizationDomains"]
            }
        );
    }

    #[test]
    fn test_claims_families_plan_migration_accepted() {
        let snapshot = OrganizationSnapshot {
            plan_type: PlanType::FamiliesAnnually,
            ..org()
        };
        let l = issue_organization_license(&snapshot, None, &params(), &key()).unwrap();
        let migrated = EntitySnapshot::from(OrganizationSnapshot {
            plan_type: PlanType::FamiliesAnnually2025,
            ..org()
        });
        assert!(
            validate_claims_against_license(&l, &claims_of(&l), &migrated, &config(), now()).is_ok()
        );
        let downgraded = EntitySnapshot::from(OrganizationSnapshot {
            plan_type: PlanType::TeamsAnnually,
            ..org()
        });
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims_of(&l), &downgraded, &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["PlanType"]
            }
        );
    }

    #[test]
    fn test_user_claims_against_user_entity() {
        let user = UserSnapshot {
            id: UserId(Uuid::from_u128(0x55)),
            email: "ada@example.com".into(),
            license_key: Some("ada-key".into()),
            premium: true,
            premium_expiration_date: Some(now().plus_days(20).unwrap()),
            ..Default::default()
        };
        let l = issue_user_license(&user, None, &params(), &key()).unwrap();
        let claims = claims_of(&l);
        assert!(
            validate_claims_against_license(&l, &claims, &user.clone().into(), &config(), now()).is_ok()
        );

        let moved = UserSnapshot {
            email: "eve@example.com".into(),
            ..user
        };
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &moved.into(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["Email"]
            }
        );
        assert_eq!(
            failure(validate_claims_against_license(&l, &claims, &entity(), &config(), now())),
            LicenseFailure::EntitlementMismatch {
                fields: vec!["LicenseType"]
            }
        );
    }
}
