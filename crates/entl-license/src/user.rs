//! # User License
//!
//! Premium entitlement for a single user account. The format has had one
//! revision; every field dates from version 1.

use entl_core::{CanonicalValue, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::license::LicenseKind;
use crate::plan::LicenseType;
use crate::schema::{
    bool_of, fields, int_of, opt_int, opt_int_of, opt_ts, opt_ts_of, text_of, ts_of, uuid_of,
    FieldSpec, FieldType, LicenseSchema,
};

/// Newest user license format this build issues.
pub const USER_LICENSE_VERSION: u32 = 1;

/// A signed statement that one user account has premium features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserLicense {
    pub license_key: String,
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub premium: bool,
    pub max_storage_gb: Option<i16>,
    pub version: u32,
    pub trial: bool,
    pub issued: Timestamp,
    pub refresh: Option<Timestamp>,
    pub expires: Option<Timestamp>,
    pub hash: Option<String>,
    pub signature: Option<String>,
    pub token: Option<String>,
}

impl UserLicense {
    /// Always [`LicenseType::User`].
    pub fn license_type(&self) -> LicenseType {
        LicenseType::User
    }
}

type Spec = FieldSpec<UserLicense>;

/// Field table for user licenses, in record order.
pub static USER_SCHEMA: LicenseSchema<UserLicense> = LicenseSchema {
    kind: LicenseKind::User,
    current_version: USER_LICENSE_VERSION,
    fields: &[
        Spec::new(
            fields::EMAIL,
            1,
            FieldType::Text,
            |l| Some(CanonicalValue::Text(l.email.clone())),
            |l, v| {
                l.email = text_of(v)?;
                Some(())
            },
        ),
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
                l.id = UserId(uuid_of(v)?);
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
            fields::PREMIUM,
            1,
            FieldType::Bool,
            |l| Some(CanonicalValue::Bool(l.premium)),
            |l, v| {
                l.premium = bool_of(v)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EncodingMode;

    #[test]
    fn test_hash_fields() {
        let names: Vec<_> = USER_SCHEMA
            .included(1, EncodingMode::Hash)
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec!["Email", "Expires", "Id", "LicenseKey", "MaxStorageGb", "Name", "Premium", "Trial", "Version"]
        );
    }

    #[test]
    fn test_payload_adds_hash_exempt_fields() {
        let names: Vec<_> = USER_SCHEMA
            .included(2, EncodingMode::Payload)
            .map(|f| f.name)
            .collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&fields::ISSUED));
        assert!(!names.contains(&fields::SIGNATURE));
    }

    #[test]
    fn test_license_type_setter_rejects_other_kind() {
        let mut l = UserLicense::default();
        let spec = USER_SCHEMA.field(fields::LICENSE_TYPE).unwrap();
        assert!((spec.set)(&mut l, CanonicalValue::Int(0)).is_some());
        assert!((spec.set)(&mut l, CanonicalValue::Int(1)).is_none());
    }
}
