//! # License Errors
//!
//! Three families:
//!
//! - [`EncodeError`]: a hard fault. The schema says a field is included but
//!   the instance has no value for it, or the caller asked for a version the
//!   schema does not know. This is a programming error, never bad input.
//! - [`DecodeError`]: the record bytes are not a well-formed license.
//! - [`LicenseFailure`]: an expected rejection returned by the validation
//!   commands, classified by [`FailureClass`] so messaging can differ.

use std::path::PathBuf;

use entl_core::{CanonicalizationError, TemporalError};
use thiserror::Error;

use crate::license::LicenseKind;

// ─── Encoding ────────────────────────────────────────────────────────

/// Failure to produce canonical bytes from a license instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field required at this version has no value on the instance.
    #[error("field {field} is required at version {version} but has no value")]
    MissingField {
        /// Canonical field name.
        field: &'static str,
        /// Encoding version.
        version: u32,
    },

    /// The requested version is outside the schema's accepted range.
    #[error("cannot encode {kind} license at version {version}: accepted range is 1..={max}")]
    VersionOutOfRange {
        kind: LicenseKind,
        version: u32,
        max: u32,
    },

    /// The record writer rejected a name or kind.
    #[error(transparent)]
    Record(#[from] CanonicalizationError),
}

// ─── Decoding ────────────────────────────────────────────────────────

/// Failure to turn record bytes back into a typed license.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes do not follow the record grammar.
    #[error("malformed record: {0}")]
    Record(#[from] CanonicalizationError),

    /// The header names a kind this build does not know.
    #[error("unknown license kind {0:?}")]
    UnknownKind(String),

    /// The declared version is outside `[1, current + 1]`.
    #[error("unsupported {kind} license version {version}: accepted range is 1..={max}")]
    UnsupportedVersion {
        kind: LicenseKind,
        version: u32,
        max: u32,
    },

    /// The record has no `Version` field, or it is not a positive integer.
    #[error("record has no usable Version field")]
    MissingVersion,

    /// A field name that the schema does not define for this kind.
    #[error("unknown field {0}")]
    UnknownField(String),

    /// The same field appears twice.
    #[error("duplicate field {0}")]
    DuplicateField(String),

    /// A known field that is not part of the payload at the declared version.
    #[error("field {field} is not part of a version {version} record")]
    FieldNotAtVersion { field: String, version: u32 },

    /// The value parsed but does not fit the field (range, enum, kind).
    #[error("field {field}: value {raw:?} is out of range")]
    InvalidValue { field: String, raw: String },

    /// A field required at the declared version is absent.
    #[error("field {field} is required at version {version} but absent")]
    MissingField { field: &'static str, version: u32 },
}

// ─── Validation ──────────────────────────────────────────────────────

/// Broad class of a rejection, used to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The license is not authentic ("this license is invalid").
    Cryptographic,
    /// The software is too old for the license ("please update").
    Compatibility,
    /// The license is outside its validity window ("your license expired").
    Temporal,
    /// The entity is configured beyond what the license grants.
    Entitlement,
}

/// Why a license was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseFailure {
    /// The token cannot be split or its parts cannot be decoded.
    #[error("malformed license token: {0}")]
    MalformedToken(String),

    /// The declared format version is outside `[1, current + 1]`.
    #[error("unsupported license version {version} (this build accepts up to {max})")]
    UnsupportedVersion { version: u32, max: u32 },

    /// The signature does not verify, or the payload is not the canonical
    /// encoding of the license it decodes to.
    #[error("license signature is invalid")]
    SignatureInvalid,

    /// The recomputed digest differs from the embedded `Hash`.
    #[error("license hash does not match its contents")]
    HashMismatch,

    /// `Expires` has passed.
    #[error("license expired at {expires}")]
    Expired { expires: String },

    /// `Issued` lies in the future.
    #[error("license is not valid until {issued}")]
    NotYetIssued { issued: String },

    /// `Expires` lies implausibly far in the future.
    #[error("license expiration {expires} is beyond the allowed horizon")]
    ExpirationOutOfRange { expires: String },

    /// `Refresh` precedes `Issued`.
    #[error("license refresh date precedes its issue date")]
    RefreshInconsistent,

    /// The license is bound to another installation.
    #[error("license belongs to installation {licensed}, not {actual}")]
    InstallationMismatch { licensed: String, actual: String },

    /// The live entity differs from the license on these fields.
    #[error("entity does not match license on: {}", .fields.join(", "))]
    EntitlementMismatch { fields: Vec<&'static str> },

    /// A claims identity disagrees with the license on this field.
    #[error("claims do not match license on {field}")]
    ClaimsMismatch { field: &'static str },
}

impl LicenseFailure {
    /// The messaging class of this failure.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MalformedToken(_) | Self::SignatureInvalid | Self::HashMismatch => {
                FailureClass::Cryptographic
            }
            Self::UnsupportedVersion { .. } => FailureClass::Compatibility,
            Self::Expired { .. }
            | Self::NotYetIssued { .. }
            | Self::ExpirationOutOfRange { .. }
            | Self::RefreshInconsistent => FailureClass::Temporal,
            Self::InstallationMismatch { .. }
            | Self::EntitlementMismatch { .. }
            | Self::ClaimsMismatch { .. } => FailureClass::Entitlement,
        }
    }

    /// Short stable name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::SignatureInvalid => "signature_invalid",
            Self::HashMismatch => "hash_mismatch",
            Self::Expired { .. } => "expired",
            Self::NotYetIssued { .. } => "not_yet_issued",
            Self::ExpirationOutOfRange { .. } => "expiration_out_of_range",
            Self::RefreshInconsistent => "refresh_inconsistent",
            Self::InstallationMismatch { .. } => "installation_mismatch",
            Self::EntitlementMismatch { .. } => "entitlement_mismatch",
            Self::ClaimsMismatch { .. } => "claims_mismatch",
        }
    }
}

/// Outcome of a validation command that did not accept the license.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The license was rejected for an expected reason.
    #[error(transparent)]
    Rejected(#[from] LicenseFailure),

    /// A schema/instance inconsistency surfaced while re-encoding.
    #[error("internal encoding fault: {0}")]
    Fault(#[from] EncodeError),
}

impl ValidationError {
    /// The rejection, if this is one.
    pub fn failure(&self) -> Option<&LicenseFailure> {
        match self {
            Self::Rejected(f) => Some(f),
            Self::Fault(_) => None,
        }
    }
}

// ─── Issuance ────────────────────────────────────────────────────────

/// Failure to issue or refresh a license.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Date arithmetic left the representable range.
    #[error(transparent)]
    Temporal(#[from] TemporalError),
}

// ─── Configuration ───────────────────────────────────────────────────

/// Failure to load licensing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes_are_distinct() {
        assert_eq!(LicenseFailure::SignatureInvalid.class(), FailureClass::Cryptographic);
        assert_eq!(LicenseFailure::HashMismatch.class(), FailureClass::Cryptographic);
        assert_eq!(
            LicenseFailure::UnsupportedVersion { version: 17, max: 16 }.class(),
            FailureClass::Compatibility
        );
        assert_eq!(
            LicenseFailure::Expired { expires: "x".into() }.class(),
            FailureClass::Temporal
        );
        assert_eq!(
            LicenseFailure::EntitlementMismatch { fields: vec!["Seats"] }.class(),
            FailureClass::Entitlement
        );
    }

    #[test]
    fn test_entitlement_mismatch_lists_fields() {
        let f = LicenseFailure::EntitlementMismatch {
            fields: vec!["Seats", "UseSso"],
        };
        assert_eq!(f.to_string(), "entity does not match license on: Seats, UseSso");
        assert_eq!(f.kind(), "entitlement_mismatch");
    }

    #[test]
    fn test_validation_error_exposes_failure() {
        let e = ValidationError::from(LicenseFailure::HashMismatch);
        assert_eq!(e.failure(), Some(&LicenseFailure::HashMismatch));
        let fault = ValidationError::from(EncodeError::MissingField {
            field: "Hash",
            version: 1,
        });
        assert!(fault.failure().is_none());
    }
}
