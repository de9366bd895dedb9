//! # License Union
//!
//! The two license variants share one contract: a key, a format version,
//! the issue/refresh/expiry dates, a trial flag, and the three envelope
//! fields produced by the signing pipeline. [`LicenseRecord`] captures that
//! contract; [`License`] is the tagged union that verifiers hand around
//! before they know which variant a token carries.

use entl_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::organization::OrganizationLicense;
use crate::plan::LicenseType;
use crate::user::UserLicense;

// ─── Kind ────────────────────────────────────────────────────────────

/// Record-header discriminator of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseKind {
    Organization,
    User,
}

impl LicenseKind {
    /// The `<kind>` token in `license:<kind>`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::User => "user",
        }
    }

    /// Reverse of [`LicenseKind::as_str`].
    pub fn from_header(kind: &str) -> Option<Self> {
        match kind {
            "organization" => Some(Self::Organization),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// The claimable license type for this kind.
    pub fn license_type(self) -> LicenseType {
        match self {
            Self::Organization => LicenseType::Organization,
            Self::User => LicenseType::User,
        }
    }
}

impl std::fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Shared Contract ─────────────────────────────────────────────────

/// Fields every license variant carries.
pub trait LicenseRecord {
    fn kind(&self) -> LicenseKind;
    fn license_key(&self) -> &str;
    fn version(&self) -> u32;
    fn issued(&self) -> Timestamp;
    fn refresh(&self) -> Option<Timestamp>;
    fn expires(&self) -> Option<Timestamp>;
    fn trial(&self) -> bool;
    fn hash(&self) -> Option<&str>;
    fn signature(&self) -> Option<&str>;
    fn token(&self) -> Option<&str>;

    fn set_hash(&mut self, hash: Option<String>);
    fn set_signature(&mut self, signature: Option<String>);
    fn set_token(&mut self, token: Option<String>);
}

macro_rules! impl_license_record {
    ($ty:ty, $kind:expr) => {
        impl LicenseRecord for $ty {
            fn kind(&self) -> LicenseKind {
                $kind
            }
            fn license_key(&self) -> &str {
                &self.license_key
            }
            fn version(&self) -> u32 {
                self.version
            }
            fn issued(&self) -> Timestamp {
                self.issued
            }
            fn refresh(&self) -> Option<Timestamp> {
                self.refresh
            }
            fn expires(&self) -> Option<Timestamp> {
                self.expires
            }
            fn trial(&self) -> bool {
                self.trial
            }
            fn hash(&self) -> Option<&str> {
                self.hash.as_deref()
            }
            fn signature(&self) -> Option<&str> {
                self.signature.as_deref()
            }
            fn token(&self) -> Option<&str> {
                self.token.as_deref()
            }
            fn set_hash(&mut self, hash: Option<String>) {
                self.hash = hash;
            }
            fn set_signature(&mut self, signature: Option<String>) {
                self.signature = signature;
            }
            fn set_token(&mut self, token: Option<String>) {
                self.token = token;
            }
        }
    };
}

impl_license_record!(OrganizationLicense, LicenseKind::Organization);
impl_license_record!(UserLicense, LicenseKind::User);

// ─── Union ───────────────────────────────────────────────────────────

/// A license of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Kind", rename_all = "lowercase")]
pub enum License {
    Organization(OrganizationLicense),
    User(UserLicense),
}

impl License {
    fn record(&self) -> &dyn LicenseRecord {
        match self {
            Self::Organization(l) => l,
            Self::User(l) => l,
        }
    }

    fn record_mut(&mut self) -> &mut dyn LicenseRecord {
        match self {
            Self::Organization(l) => l,
            Self::User(l) => l,
        }
    }

    /// The organization variant, if this is one.
    pub fn as_organization(&self) -> Option<&OrganizationLicense> {
        match self {
            Self::Organization(l) => Some(l),
            Self::User(_) => None,
        }
    }

    /// The user variant, if this is one.
    pub fn as_user(&self) -> Option<&UserLicense> {
        match self {
            Self::User(l) => Some(l),
            Self::Organization(_) => None,
        }
    }

    /// Derived license type.
    pub fn license_type(&self) -> LicenseType {
        self.kind().license_type()
    }
}

impl LicenseRecord for License {
    fn kind(&self) -> LicenseKind {
        self.record().kind()
    }
    fn license_key(&self) -> &str {
        self.record().license_key()
    }
    fn version(&self) -> u32 {
        self.record().version()
    }
    fn issued(&self) -> Timestamp {
        self.record().issued()
    }
    fn refresh(&self) -> Option<Timestamp> {
        self.record().refresh()
    }
    fn expires(&self) -> Option<Timestamp> {
        self.record().expires()
    }
    fn trial(&self) -> bool {
        self.record().trial()
    }
    fn hash(&self) -> Option<&str> {
        self.record().hash()
    }
    fn signature(&self) -> Option<&str> {
        self.record().signature()
    }
    fn token(&self) -> Option<&str> {
        self.record().token()
    }
    fn set_hash(&mut self, hash: Option<String>) {
        self.record_mut().set_hash(hash);
    }
    fn set_signature(&mut self, signature: Option<String>) {
        self.record_mut().set_signature(signature);
    }
    fn set_token(&mut self, token: Option<String>) {
        self.record_mut().set_token(token);
    }
}

impl From<OrganizationLicense> for License {
    fn from(l: OrganizationLicense) -> Self {
        Self::Organization(l)
    }
}

impl From<UserLicense> for License {
    fn from(l: UserLicense) -> Self {
        Self::User(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_header_roundtrip() {
        for kind in [LicenseKind::Organization, LicenseKind::User] {
            assert_eq!(LicenseKind::from_header(kind.as_str()), Some(kind));
        }
        assert_eq!(LicenseKind::from_header("Organization"), None);
    }

    #[test]
    fn test_union_dispatches_to_variant() {
        let mut license = License::from(UserLicense {
            license_key: "k".into(),
            version: 1,
            premium: true,
            ..Default::default()
        });
        assert_eq!(license.kind(), LicenseKind::User);
        assert_eq!(license.license_type(), LicenseType::User);
        assert_eq!(license.license_key(), "k");
        assert!(license.as_organization().is_none());

        license.set_signature(Some("sig".into()));
        assert_eq!(license.as_user().and_then(|u| u.signature.as_deref()), Some("sig"));
    }

    #[test]
    fn test_union_serde_is_tagged() {
        let license = License::from(OrganizationLicense {
            version: 15,
            ..Default::default()
        });
        let json = serde_json::to_value(&license).unwrap();
        assert_eq!(json["Kind"], "organization");
        assert_eq!(json["Version"], 15);
        let back: License = serde_json::from_value(json).unwrap();
        assert_eq!(back, license);
    }
}
