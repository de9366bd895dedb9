//! # Plan Catalogue
//!
//! `PlanType` identifies the product tier an organization is billed on.
//! Discriminants are part of the canonical record (`PlanType:11`) and must
//! never be renumbered; names are what claims carry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Product tier of an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PlanType {
    #[default]
    Free = 0,
    FamiliesAnnually2019 = 1,
    TeamsMonthly2019 = 2,
    TeamsAnnually2019 = 3,
    EnterpriseMonthly2019 = 4,
    EnterpriseAnnually2019 = 5,
    Custom = 6,
    FamiliesAnnually = 7,
    TeamsMonthly2020 = 8,
    TeamsAnnually2020 = 9,
    EnterpriseMonthly2020 = 10,
    EnterpriseAnnually2020 = 11,
    TeamsMonthly2023 = 12,
    TeamsAnnually2023 = 13,
    EnterpriseMonthly2023 = 14,
    EnterpriseAnnually2023 = 15,
    TeamsStarter2023 = 16,
    TeamsMonthly = 17,
    TeamsAnnually = 18,
    EnterpriseMonthly = 19,
    EnterpriseAnnually = 20,
    TeamsStarter = 21,
    FamiliesAnnually2025 = 22,
}

impl PlanType {
    /// Every plan, in discriminant order.
    pub const ALL: [PlanType; 23] = [
        Self::Free,
        Self::FamiliesAnnually2019,
        Self::TeamsMonthly2019,
        Self::TeamsAnnually2019,
        Self::EnterpriseMonthly2019,
        Self::EnterpriseAnnually2019,
        Self::Custom,
        Self::FamiliesAnnually,
        Self::TeamsMonthly2020,
        Self::TeamsAnnually2020,
        Self::EnterpriseMonthly2020,
        Self::EnterpriseAnnually2020,
        Self::TeamsMonthly2023,
        Self::TeamsAnnually2023,
        Self::EnterpriseMonthly2023,
        Self::EnterpriseAnnually2023,
        Self::TeamsStarter2023,
        Self::TeamsMonthly,
        Self::TeamsAnnually,
        Self::EnterpriseMonthly,
        Self::EnterpriseAnnually,
        Self::TeamsStarter,
        Self::FamiliesAnnually2025,
    ];

    /// The integer written into canonical records.
    pub fn discriminant(self) -> i64 {
        self as u8 as i64
    }

    /// Look up a plan by its record integer.
    pub fn from_discriminant(n: i64) -> Option<Self> {
        usize::try_from(n).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Returns the plan name used in claims.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::FamiliesAnnually2019 => "FamiliesAnnually2019",
            Self::TeamsMonthly2019 => "TeamsMonthly2019",
            Self::TeamsAnnually2019 => "TeamsAnnually2019",
            Self::EnterpriseMonthly2019 => "EnterpriseMonthly2019",
            Self::EnterpriseAnnually2019 => "EnterpriseAnnually2019",
            Self::Custom => "Custom",
            Self::FamiliesAnnually => "FamiliesAnnually",
            Self::TeamsMonthly2020 => "TeamsMonthly2020",
            Self::TeamsAnnually2020 => "TeamsAnnually2020",
            Self::EnterpriseMonthly2020 => "EnterpriseMonthly2020",
            Self::EnterpriseAnnually2020 => "EnterpriseAnnually2020",
            Self::TeamsMonthly2023 => "TeamsMonthly2023",
            Self::TeamsAnnually2023 => "TeamsAnnually2023",
            Self::EnterpriseMonthly2023 => "EnterpriseMonthly2023",
            Self::EnterpriseAnnually2023 => "EnterpriseAnnually2023",
            Self::TeamsStarter2023 => "TeamsStarter2023",
            Self::TeamsMonthly => "TeamsMonthly",
            Self::TeamsAnnually => "TeamsAnnually",
            Self::EnterpriseMonthly => "EnterpriseMonthly",
            Self::EnterpriseAnnually => "EnterpriseAnnually",
            Self::TeamsStarter => "TeamsStarter",
            Self::FamiliesAnnually2025 => "FamiliesAnnually2025",
        }
    }

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
    }

    /// Whether an entity on `actual` satisfies a license granting `self`.
    ///
    /// Identity, except that a `FamiliesAnnually` license also covers
    /// organizations already migrated to `FamiliesAnnually2025`.
    pub fn is_satisfied_by(self, actual: PlanType) -> bool {
        self == actual
            || (self == Self::FamiliesAnnually && actual == Self::FamiliesAnnually2025)
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlanType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts either the plan name or its record integer.
impl<'de> Deserialize<'de> for PlanType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i64),
            Name(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Code(n) => Self::from_discriminant(n)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown plan type {n}"))),
            Repr::Name(s) => Self::from_name(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown plan type {s:?}"))),
        }
    }
}

/// Which license variant a record belongs to. Derived, never encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseType {
    #[default]
    User = 0,
    Organization = 1,
}

impl LicenseType {
    /// Every license type, in discriminant order.
    pub const ALL: [LicenseType; 2] = [Self::User, Self::Organization];

    /// Returns the name used in claims.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Organization => "Organization",
        }
    }

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
