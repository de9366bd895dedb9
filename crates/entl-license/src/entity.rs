//! # Entity Snapshots
//!
//! Plain data copies of the live organization or user an issuer licenses
//! and a verifier cross-checks. The repository layer fills these in; this
//! crate never queries storage itself.

use entl_core::{OrganizationId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::license::LicenseKind;
use crate::plan::PlanType;

/// The live configuration of an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizationSnapshot {
    pub id: OrganizationId,
    pub name: String,
    pub billing_email: String,
    pub business_name: Option<String>,
    pub license_key: Option<String>,
    pub enabled: bool,
    pub plan: String,
    pub plan_type: PlanType,
    pub seats: Option<i32>,
    pub max_collections: Option<i16>,
    pub max_storage_gb: Option<i16>,
    pub use_policies: bool,
    pub use_sso: bool,
    pub use_key_connector: bool,
    pub use_scim: bool,
    pub use_groups: bool,
    pub use_events: bool,
    pub use_directory: bool,
    pub use_totp: bool,
    pub use_2fa: bool,
    pub use_api: bool,
    pub use_reset_password: bool,
    pub use_custom_permissions: bool,
    pub use_secrets_manager: bool,
    pub use_password_manager: bool,
    pub self_host: bool,
    pub users_get_premium: bool,
    pub sm_seats: Option<i32>,
    pub sm_service_accounts: Option<i32>,
    pub limit_collection_creation: bool,
    pub limit_collection_deletion: bool,
    pub allow_admin_access_to_all_collection_items: bool,
    pub use_admin_sponsored_families: bool,
    pub use_automatic_user_confirmation: bool,
    pub use_organization_domains: bool,
    pub use_risk_insights: bool,
    /// Expiration currently stored on the organization.
    pub expiration_date: Option<Timestamp>,
}

/// The live configuration of a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserSnapshot {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub license_key: Option<String>,
    pub premium: bool,
    pub max_storage_gb: Option<i16>,
    pub premium_expiration_date: Option<Timestamp>,
}

/// A snapshot of either kind of licensed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntitySnapshot {
    Organization(OrganizationSnapshot),
    User(UserSnapshot),
}

impl EntitySnapshot {
    /// The license kind this entity is licensed with.
    pub fn kind(&self) -> LicenseKind {
        match self {
            Self::Organization(_) => LicenseKind::Organization,
            Self::User(_) => LicenseKind::User,
        }
    }
}

impl From<OrganizationSnapshot> for EntitySnapshot {
    fn from(s: OrganizationSnapshot) -> Self {
        Self::Organization(s)
    }
}

impl From<UserSnapshot> for EntitySnapshot {
    fn from(s: UserSnapshot) -> Self {
        Self::User(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_yaml_defaults() {
        let yaml = "kind: organization\nname: Acme\nplan_type: TeamsAnnually\nseats: 12\nuse_sso: true\n";
        let snapshot: EntitySnapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snapshot.kind(), LicenseKind::Organization);
        let EntitySnapshot::Organization(org) = snapshot else {
            panic!("expected organization");
        };
        assert_eq!(org.seats, Some(12));
        assert!(org.use_sso);
        assert!(!org.enabled);
        assert_eq!(org.plan_type, PlanType::TeamsAnnually);
    }

    #[test]
    fn test_snapshot_rejects_unknown_fields() {
        let yaml = "name: Ada\npremium: true\nsuperuser: true\n";
        assert!(serde_yaml::from_str::<UserSnapshot>(yaml).is_err());
    }
}
