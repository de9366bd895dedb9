//! # License Schema — Per-Field Version and Exemption Table
//!
//! The single source of truth for which fields each license kind has, the
//! format version that introduced each one, and whether it takes part in
//! the signed payload, the integrity hash, or neither.
//!
//! Every consumer walks the same static table: the canonical encoder and
//! decoder, the claims codec, and entity validation. Field names are the
//! constants in [`fields`], so a claim name cannot drift from the record
//! name it mirrors.
//!
//! ## Inclusion Rules
//!
//! - A field is in the full payload iff it is not [`Exemption::Always`] and
//!   `version >= introduced_in`.
//! - A field is in the hash-only encoding iff it is in the full payload and
//!   is not [`Exemption::HashOnly`].
//! - A field is a claim iff it is in the full payload or is
//!   [`Exemption::ClaimOnly`]. Claim-only fields are entitlements added after
//!   the record format was frozen; they are never encoded.

use entl_core::{CanonicalValue, Timestamp, ValueKind};
use uuid::Uuid;

use crate::license::LicenseKind;
use crate::organization::ORGANIZATION_SCHEMA;
use crate::plan::PlanType;
use crate::user::USER_SCHEMA;

/// Canonical field names shared by records, claims, and diagnostics.
pub mod fields {
    pub const ALLOW_ADMIN_ACCESS_TO_ALL_COLLECTION_ITEMS: &str =
        "AllowAdminAccessToAllCollectionItems";
    pub const BILLING_EMAIL: &str = "BillingEmail";
    pub const BUSINESS_NAME: &str = "BusinessName";
    pub const EMAIL: &str = "Email";
    pub const ENABLED: &str = "Enabled";
    pub const EXPIRATION_WITHOUT_GRACE_PERIOD: &str = "ExpirationWithoutGracePeriod";
    pub const EXPIRES: &str = "Expires";
    pub const HASH: &str = "Hash";
    pub const ID: &str = "Id";
    pub const INSTALLATION_ID: &str = "InstallationId";
    pub const ISSUED: &str = "Issued";
    pub const LICENSE_KEY: &str = "LicenseKey";
    pub const LICENSE_TYPE: &str = "LicenseType";
    pub const LIMIT_COLLECTION_CREATION_DELETION: &str = "LimitCollectionCreationDeletion";
    pub const MAX_COLLECTIONS: &str = "MaxCollections";
    pub const MAX_STORAGE_GB: &str = "MaxStorageGb";
    pub const NAME: &str = "Name";
    pub const PLAN: &str = "Plan";
    pub const PLAN_TYPE: &str = "PlanType";
    pub const PREMIUM: &str = "Premium";
    pub const REFRESH: &str = "Refresh";
    pub const SEATS: &str = "Seats";
    pub const SELF_HOST: &str = "SelfHost";
    pub const SIGNATURE: &str = "Signature";
    pub const SM_SEATS: &str = "SmSeats";
    pub const SM_SERVICE_ACCOUNTS: &str = "SmServiceAccounts";
    pub const TOKEN: &str = "Token";
    pub const TRIAL: &str = "Trial";
    pub const USE_2FA: &str = "Use2fa";
    pub const USE_ADMIN_SPONSORED_FAMILIES: &str = "UseAdminSponsoredFamilies";
    pub const USE_API: &str = "UseApi";
    pub const USE_AUTOMATIC_USER_CONFIRMATION: &str = "UseAutomaticUserConfirmation";
    pub const USE_CUSTOM_PERMISSIONS: &str = "UseCustomPermissions";
    pub const USE_DIRECTORY: &str = "UseDirectory";
    pub const USE_EVENTS: &str = "UseEvents";
    pub const USE_GROUPS: &str = "UseGroups";
    pub const USE_KEY_CONNECTOR: &str = "UseKeyConnector";
    pub const USE_ORGANIZATION_DOMAINS: &str = "UseOrganizationDomains";
    pub const USE_PASSWORD_MANAGER: &str = "UsePasswordManager";
    pub const USE_POLICIES: &str = "UsePolicies";
    pub const USE_RESET_PASSWORD: &str = "UseResetPassword";
    pub const USE_RISK_INSIGHTS: &str = "UseRiskInsights";
    pub const USERS_GET_PREMIUM: &str = "UsersGetPremium";
    pub const USE_SCIM: &str = "UseScim";
    pub const USE_SECRETS_MANAGER: &str = "UseSecretsManager";
    pub const USE_SSO: &str = "UseSso";
    pub const USE_TOTP: &str = "UseTotp";
    pub const VERSION: &str = "Version";
}

/// Which encodings a field is kept out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exemption {
    /// Part of both encodings once introduced.
    None,
    /// Signed, but excluded from the integrity hash.
    HashOnly,
    /// Never encoded.
    Always,
    /// Never encoded, but carried as a claim at every version.
    ClaimOnly,
}

/// Selects between the two canonical encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingMode {
    /// The full payload covered by the signature.
    Payload,
    /// The stricter subset covered by the integrity hash.
    Hash,
}

impl EncodingMode {
    /// Map the boolean `for_hash` selector onto a mode.
    pub fn for_hash(for_hash: bool) -> Self {
        if for_hash {
            Self::Hash
        } else {
            Self::Payload
        }
    }
}

/// Logical type of a field, which fixes both its record and claim rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    Text,
    Uuid,
    Timestamp,
    /// `PlanType`: integer in records, name in claims.
    Plan,
    /// `LicenseType`: integer in records, name in claims.
    Kind,
}

impl FieldType {
    /// The record-level value kind used to parse raw text.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Bool => ValueKind::Bool,
            Self::Int | Self::Plan | Self::Kind => ValueKind::Int,
            Self::Text => ValueKind::Text,
            Self::Uuid => ValueKind::Uuid,
            Self::Timestamp => ValueKind::Timestamp,
        }
    }
}

/// Reads a field's current value off a license. `None` means the field is
/// required but unset on this instance.
pub type Getter<L> = fn(&L) -> Option<CanonicalValue>;

/// Writes a typed value onto a license. `None` means the value does not fit
/// the field (wrong variant, out-of-range integer, unknown enum).
pub type Setter<L> = fn(&mut L, CanonicalValue) -> Option<()>;

/// Metadata and accessors for one license field.
pub struct FieldSpec<L> {
    pub name: &'static str,
    pub introduced_in: u32,
    pub exemption: Exemption,
    pub ty: FieldType,
    pub nullable: bool,
    pub get: Getter<L>,
    pub set: Setter<L>,
}

impl<L> Clone for FieldSpec<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for FieldSpec<L> {}

impl<L> std::fmt::Debug for FieldSpec<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("introduced_in", &self.introduced_in)
            .field("exemption", &self.exemption)
            .field("ty", &self.ty)
            .field("nullable", &self.nullable)
            .finish()
    }
}

impl<L> FieldSpec<L> {
    pub(crate) const fn new(
        name: &'static str,
        introduced_in: u32,
        ty: FieldType,
        get: Getter<L>,
        set: Setter<L>,
    ) -> Self {
        Self {
            name,
            introduced_in,
            exemption: Exemption::None,
            ty,
            nullable: false,
            get,
            set,
        }
    }

    pub(crate) const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub(crate) const fn hash_exempt(self) -> Self {
        Self {
            exemption: Exemption::HashOnly,
            ..self
        }
    }

    pub(crate) const fn always_exempt(self) -> Self {
        Self {
            exemption: Exemption::Always,
            ..self
        }
    }

    pub(crate) const fn claim_only(self) -> Self {
        Self {
            exemption: Exemption::ClaimOnly,
            ..self
        }
    }

    /// Whether this field is part of the given encoding at `version`.
    pub fn includes(&self, version: u32, mode: EncodingMode) -> bool {
        if version < self.introduced_in {
            return false;
        }
        match self.exemption {
            Exemption::None => true,
            Exemption::HashOnly => mode == EncodingMode::Payload,
            Exemption::Always | Exemption::ClaimOnly => false,
        }
    }

    /// Whether this field is written as a claim for a license at `version`.
    pub fn is_claim(&self, version: u32) -> bool {
        self.exemption == Exemption::ClaimOnly || self.includes(version, EncodingMode::Payload)
    }
}

/// The complete field table of one license kind.
pub struct LicenseSchema<L: 'static> {
    pub kind: LicenseKind,
    /// Newest format version this build issues.
    pub current_version: u32,
    /// Fields in fixed declaration order, which is also record order.
    pub fields: &'static [FieldSpec<L>],
}

impl<L: 'static> LicenseSchema<L> {
    /// Highest version accepted on input: one release of forward tolerance.
    pub fn max_version(&self) -> u32 {
        self.current_version + 1
    }

    /// Whether `version` lies in `[1, current + 1]`.
    pub fn supports(&self, version: u32) -> bool {
        (1..=self.max_version()).contains(&version)
    }

    /// Look up a field by canonical name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec<L>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields included in `mode` at `version`, in record order.
    pub fn included(
        &self,
        version: u32,
        mode: EncodingMode,
    ) -> impl Iterator<Item = &FieldSpec<L>> + '_ {
        self.fields.iter().filter(move |f| f.includes(version, mode))
    }

    /// Fields carried as claims at `version`, in record order.
    pub fn claims(&self, version: u32) -> impl Iterator<Item = &FieldSpec<L>> + '_ {
        self.fields.iter().filter(move |f| f.is_claim(version))
    }

    /// Field-level inclusion predicate. Unknown names are never included.
    pub fn should_include(&self, name: &str, version: u32, mode: EncodingMode) -> bool {
        self.field(name).is_some_and(|f| f.includes(version, mode))
    }
}

/// Kind-dispatched inclusion predicate: `ShouldInclude(field, version, forHash)`.
pub fn should_include(kind: LicenseKind, field: &str, version: u32, for_hash: bool) -> bool {
    let mode = EncodingMode::for_hash(for_hash);
    match kind {
        LicenseKind::Organization => ORGANIZATION_SCHEMA.should_include(field, version, mode),
        LicenseKind::User => USER_SCHEMA.should_include(field, version, mode),
    }
}

/// Newest issued format version for a kind.
pub fn current_version(kind: LicenseKind) -> u32 {
    match kind {
        LicenseKind::Organization => ORGANIZATION_SCHEMA.current_version,
        LicenseKind::User => USER_SCHEMA.current_version,
    }
}

/// Highest accepted format version for a kind.
pub fn max_version(kind: LicenseKind) -> u32 {
    current_version(kind) + 1
}

// ─── Value conversions used by the accessor tables ───────────────────────

pub(crate) fn bool_of(v: CanonicalValue) -> Option<bool> {
    match v {
        CanonicalValue::Bool(b) => Some(b),
        _ => None,
    }
}

pub(crate) fn text_of(v: CanonicalValue) -> Option<String> {
    match v {
        CanonicalValue::Text(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn uuid_of(v: CanonicalValue) -> Option<Uuid> {
    match v {
        CanonicalValue::Uuid(id) => Some(id),
        _ => None,
    }
}

pub(crate) fn ts_of(v: CanonicalValue) -> Option<Timestamp> {
    match v {
        CanonicalValue::Timestamp(ts) => Some(ts),
        _ => None,
    }
}

pub(crate) fn opt_ts_of(v: CanonicalValue) -> Option<Option<Timestamp>> {
    match v {
        CanonicalValue::Null => Some(None),
        other => ts_of(other).map(Some),
    }
}

pub(crate) fn int_of<T: TryFrom<i64>>(v: CanonicalValue) -> Option<T> {
    match v {
        CanonicalValue::Int(n) => T::try_from(n).ok(),
        _ => None,
    }
}

pub(crate) fn opt_int_of<T: TryFrom<i64>>(v: CanonicalValue) -> Option<Option<T>> {
    match v {
        CanonicalValue::Null => Some(None),
        other => int_of(other).map(Some),
    }
}

pub(crate) fn plan_of(v: CanonicalValue) -> Option<PlanType> {
    int_of::<i64>(v).and_then(PlanType::from_discriminant)
}

pub(crate) fn opt_int<T: Into<i64>>(v: Option<T>) -> CanonicalValue {
    CanonicalValue::from_option(v, |n| CanonicalValue::Int(n.into()))
}

pub(crate) fn opt_ts(v: Option<Timestamp>) -> CanonicalValue {
    CanonicalValue::from_option(v, CanonicalValue::Timestamp)
}
