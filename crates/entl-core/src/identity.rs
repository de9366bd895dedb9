//! # Identifier Newtypes
//!
//! Newtype wrappers for the identifiers a license binds to. These prevent
//! passing an installation id where an organization id is expected, which
//! would otherwise type-check since all three are bare UUIDs on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub Uuid);

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

/// Unique identifier for a self-hosted installation.
///
/// Organization licenses are bound to exactly one installation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(pub Uuid);

macro_rules! uuid_newtype {
    ($name:ident) => {
        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }
    };
}

uuid_newtype!(OrganizationId);
uuid_newtype!(UserId);
uuid_newtype!(InstallationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_lowercase_hyphenated() {
        let id = InstallationId(Uuid::parse_str("78900000-0000-0000-0000-000000000ABC").unwrap());
        assert_eq!(id.to_string(), "78900000-0000-0000-0000-000000000abc");
    }

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(OrganizationId::new(), OrganizationId::new());
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
