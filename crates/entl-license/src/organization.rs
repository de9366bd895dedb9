//! # Organization License
//!
//! The entitlement record for an organization on a self-hosted
//! installation, and its field table.
//!
//! Format history, by the version that introduced each field:
//!
//! | Version | Fields                                                        |
//! |---------|---------------------------------------------------------------|
//! | 1       | core identity, seats, collections, storage, groups, directory, TOTP |
//! | 2       | `UsersGetPremium`                                             |
//! | 3       | `UseEvents`                                                   |
//! | 4       | `Use2fa`                                                      |
//! | 5       | `UseApi`                                                      |
//! | 6       | `UsePolicies`                                                 |
//! | 7       | `UseSso`                                                      |
//! | 8       | `UseResetPassword`                                            |
//! | 9       | `UseKeyConnector`                                             |
//! | 10      | `UseScim`                                                     |
//! | 11      | `UseCustomPermissions`                                        |
//! | 12      | `ExpirationWithoutGracePeriod`                                |
//! | 13      | Secrets Manager: `UseSecretsManager`, `UsePasswordManager`, `SmSeats`, `SmServiceAccounts` |
//! | 14      | `LimitCollectionCreationDeletion`                             |
//! | 15      | `AllowAdminAccessToAllCollectionItems`                        |
//!
//! The format is frozen at 15. New entitlements travel as claims only:
//! `UseAdminSponsoredFamilies`, `UseAutomaticUserConfirmation`,
//! `UseOrganizationDomains` and `UseRiskInsights` are never encoded.

use entl_core::{CanonicalValue, InstallationId, OrganizationId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::license::LicenseKind;
use crate::plan::{LicenseType, PlanType};
use crate::schema::{
    bool_of, fields, int_of, opt_int, opt_int_of, opt_ts, opt_ts_of, plan_of, text_of, ts_of,
    uuid_of, FieldSpec, FieldType, LicenseSchema,
};

/// Newest organization license format this build issues.
pub const ORGANIZATION_LICENSE_VERSION: u32 = 15;

/// A signed statement of what one organization may use on one installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationLicense {
    pub license_key: String,
    pub installation_id: InstallationId,
    pub id: OrganizationId,
    pub name: String,
    pub billing_email: String,
    /// Empty when the organization has no separate business name.
    pub business_name: String,
    pub enabled: bool,
    pub plan: String,
    pub plan_type: PlanType,
    pub seats: Option<i32>,
    pub max_collections: Option<i16>,
    pub use_policies: bool,
    pub use_sso: bool,
    pub use_key_connector: bool,
    pub use_scim: bool,
    pub use_groups: bool,
    pub use_events: bool,
    pub use_directory: bool,
    pub use_totp: bool,
    #[serde(rename = "Use2fa")]
    pub use_2fa: bool,
    pub use_api: bool,
    pub use_reset_password: bool,
    pub use_secrets_manager: bool,
    pub use_password_manager: bool,
    pub use_custom_permissions: bool,
    pub max_storage_gb: Option<i16>,
    pub self_host: bool,
    pub users_get_premium: bool,
    pub sm_seats: Option<i32>,
    pub sm_service_accounts: Option<i32>,
    pub limit_collection_creation_deletion: bool,
    pub allow_admin_access_to_all_collection_items: bool,
    pub use_admin_sponsored_families: bool,
    pub use_automatic_user_confirmation: bool,
    pub use_organization_domains: bool,
    pub use_risk_insights: bool,
    pub expiration_without_grace_period: Option<Timestamp>,
    pub version: u32,
    pub trial: bool,
    pub issued: Timestamp,
    pub refresh: Option<Timestamp>,
    pub expires: Option<Timestamp>,
    /// Base64 SHA-256 of the hash-only encoding.
    pub hash: Option<String>,
    /// Base64 Ed25519 signature over the full payload.
    pub signature: Option<String>,
    /// Distributable token carrying payload and signature.
    pub token: Option<String>,
}

impl OrganizationLicense {
    /// Always [`LicenseType::Organization`].
    pub fn license_type(&self) -> LicenseType {
        LicenseType::Organization
    }
}

type Spec = FieldSpec<OrganizationLicense>;

/// Field table for organization licenses, in record order.
pub static ORGANIZATION_SCHEMA: LicenseSchema<OrganizationLicense> = LicenseSchema {
    kind: LicenseKind::Organization,
    current_version: ORGANIZATION_LICENSE_VERSION,
    fields: &[
        Spec::new(
            fields::ALLOW_ADMIN_ACCESS_TO_ALL_COLLECTION_ITEMS,
            15,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.allow_admin_access_to_all_collection_items)),
            |l, v| {
                l.allow_admin_access_to_all_collection_items = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::BILLING_EMAIL,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.billing_email.clone())),
            |l, v| {
                l.billing_email = text_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::BUSINESS_NAME,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.business_name.clone())),
            |l, v| {
                l.business_name = text_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::ENABLED,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.enabled)),
            |l, v| {
                l.enabled = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::EXPIRATION_WITHOUT_GRACE_PERIOD,
            12,
            FieldType::Timestamp,
            |l| Some(opt_ts(l.expiration_without_grace_period)),
            |l, v| {
                l.expiration_without_grace_period = opt_ts_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::EXPIRES,
            1,
            FieldType::Timestamp,
            |l| Some(opt_ts(l.expires)),
            |l, v| {
                l.expires = opt_ts_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::HASH,
            1,
            FieldType::Text,
            |l| l.hash.clone().map(CanonicalValue::Text),
            |l, v| {
                l.hash = Some(text_of(v)?);
                Some(())
            },
        )
        .hash_exempt(),
        Spec::new(
            fields::ID,
            1,
            FieldType::Uuid,
            |l| Some(CanonicalValue::Uuid(l.id.0)),
            |l, v| {
                l.id = OrganizationId(uuid_of(v)?);
                Some(())
            },
        ),
        Spec::new(
            fields::INSTALLATION_ID,
            1,
            FieldType::Uuid,
            |l| Some(CanonicalValue::Uuid(l.installation_id.0)),
            |l, v| {
                l.installation_id = InstallationId(uuid_of(v)?);
                Some(())
            },
        ),
        Spec::new(
            fields::ISSUED,
            1,
            FieldType::Timestamp,
            |l| Some(CanonicalValue::Timestamp(l.issued)),
            |l, v| {
                l.issued = ts_of(v)?;
                Some(())
            },
        )
        .hash_exempt(),
        Spec::new(
            fields::LICENSE_KEY,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.license_key.clone())),
            |l, v| {
                l.license_key = text_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::LICENSE_TYPE,
            1,
            FieldType::Kind,
            |l| Some(CanonicalValue::Int(l.license_type() as i64)),
            |l, v| (int_of::<i64>(v)? == l.license_type() as i64).then_some(()),
        )
        .claim_only(),
        Spec::new(
            fields::LIMIT_COLLECTION_CREATION_DELETION,
            14,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.limit_collection_creation_deletion)),
            |l, v| {
                l.limit_collection_creation_deletion = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::MAX_COLLECTIONS,
            1,
            FieldType::Int,
            |l| Some(opt_int(l.max_collections)),
            |l, v| {
                l.max_collections = opt_int_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::MAX_STORAGE_GB,
            1,
            FieldType::Int,
            |l| Some(opt_int(l.max_storage_gb)),
            |l, v| {
                l.max_storage_gb = opt_int_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::NAME,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.name.clone())),
            |l, v| {
                l.name = text_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::PLAN,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.plan.clone())),
            |l, v| {
                l.plan = text_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::PLAN_TYPE,
            1,
            FieldType::Plan,
            |l| Some(CanonicalValue::Int(l.plan_type.discriminant())),
            |l, v| {
                l.plan_type = plan_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::REFRESH,
            1,
            FieldType::Timestamp,
            |l| Some(opt_ts(l.refresh)),
            |l, v| {
                l.refresh = opt_ts_of(v)?;
                Some(())
            },
        )
        .nullable()
        .hash_exempt(),
        Spec::new(
            fields::SEATS,
            1,
            FieldType::Int,
            |l| Some(opt_int(l.seats)),
            |l, v| {
                l.seats = opt_int_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::SELF_HOST,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.self_host)),
            |l, v| {
                l.self_host = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::SIGNATURE,
            1,
            FieldType::Text,
            |l| l.signature.clone().map(CanonicalValue::Text),
            |l, v| {
                l.signature = Some(text_of(v)?);
                Some(())
            },
        )
        .always_exempt(),
        Spec::new(
            fields::SM_SEATS,
            13,
            FieldType::Int,
            |l| Some(opt_int(l.sm_seats)),
            |l, v| {
                l.sm_seats = opt_int_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::SM_SERVICE_ACCOUNTS,
            13,
            FieldType::Int,
            |l| Some(opt_int(l.sm_service_accounts)),
            |l, v| {
                l.sm_service_accounts = opt_int_of(v)?;
                Some(())
            },
        )
        .nullable(),
        Spec::new(
            fields::TOKEN,
            1,
            FieldType::Text,
            |l| l.token.clone().map(CanonicalValue::Text),
            |l, v| {
                l.token = Some(text_of(v)?);
                Some(())
            },
        )
        .always_exempt(),
        Spec::new(
            fields::TRIAL,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.trial)),
            |l, v| {
                l.trial = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_2FA,
            4,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_2fa)),
            |l, v| {
                l.use_2fa = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_ADMIN_SPONSORED_FAMILIES,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_admin_sponsored_families)),
            |l, v| {
                l.use_admin_sponsored_families = bool_of(v)?;
                Some(())
            },
        )
        .claim_only(),
        Spec::new(
            fields::USE_API,
            5,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_api)),
            |l, v| {
                l.use_api = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_AUTOMATIC_USER_CONFIRMATION,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_automatic_user_confirmation)),
            |l, v| {
                l.use_automatic_user_confirmation = bool_of(v)?;
                Some(())
            },
        )
        .claim_only(),
        Spec::new(
            fields::USE_CUSTOM_PERMISSIONS,
            11,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_custom_permissions)),
            |l, v| {
                l.use_custom_permissions = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_DIRECTORY,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_directory)),
            |l, v| {
                l.use_directory = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_EVENTS,
            3,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_events)),
            |l, v| {
                l.use_events = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_GROUPS,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_groups)),
            |l, v| {
                l.use_groups = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_KEY_CONNECTOR,
            9,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_key_connector)),
            |l, v| {
                l.use_key_connector = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_ORGANIZATION_DOMAINS,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_organization_domains)),
            |l, v| {
                l.use_organization_domains = bool_of(v)?;
                Some(())
            },
        )
        .claim_only(),
        Spec::new(
            fields::USE_PASSWORD_MANAGER,
            13,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_password_manager)),
            |l, v| {
                l.use_password_manager = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_POLICIES,
            6,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_policies)),
            |l, v| {
                l.use_policies = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_RESET_PASSWORD,
            8,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_reset_password)),
            |l, v| {
                l.use_reset_password = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_RISK_INSIGHTS,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_risk_insights)),
            |l, v| {
                l.use_risk_insights = bool_of(v)?;
                Some(())
            },
        )
        .claim_only(),
        Spec::new(
            fields::USERS_GET_PREMIUM,
            2,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.users_get_premium)),
            |l, v| {
                l.users_get_premium = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_SCIM,
            10,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_scim)),
            |l, v| {
                l.use_scim = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_SECRETS_MANAGER,
            13,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_secrets_manager)),
            |l, v| {
                l.use_secrets_manager = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_SSO,
            7,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_sso)),
            |l, v| {
                l.use_sso = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::USE_TOTP,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.use_totp)),
            |l, v| {
                l.use_totp = bool_of(v)?;
                Some(())
            },
        ),
        Spec::new(
            fields::VERSION,
            1,
            FieldType::Int,
            |l| Some(CanonicalValue::Int(i64::from(l.version))),
            |l, v| {
                l.version = int_of(v)?;
                Some(())
            },
        ),
    ],
};
