//! # entl-license — Signed Entitlement Licenses
//!
//! Everything between an entity snapshot and a verified, trusted license.
//!
//! ## Pipeline
//!
//! - **Schema** (`schema.rs`, `organization.rs`, `user.rs`): one static
//!   field table per license kind, in record order, carrying each field's
//!   introduction version and exemption class. The encoder, decoder and
//!   claims codec all walk the same table.
//!
//! - **Encoding** (`encoder.rs`): deterministic canonical records, in
//!   payload mode (signed) or hash mode (digested), plus the decoder.
//!
//! - **Hash and token** (`hasher.rs`, `token.rs`): SHA-256 over the hash
//!   encoding; Ed25519 over the payload; `payload.signature` framing.
//!
//! - **Claims** (`claims.rs`): `(name, value)` string pairs for identity
//!   stores, with best-effort typed reads.
//!
//! - **Expiration** (`expiration.rs`): pure date arithmetic deciding
//!   `Expires`, `Refresh` and the deadline without grace.
//!
//! - **Issuance** (`issuance.rs`) and **validation** (`validation.rs`): the
//!   commands built on the above.
//!
//! ## Crate Policy
//!
//! - Bytes are only ever hashed or signed as `CanonicalBytes`.
//! - Expected rejections are values (`LicenseFailure`), never panics.
//! - Nothing here performs I/O except `LicensingConfig::load`.

pub mod claims;
pub mod config;
pub mod encoder;
pub mod entity;
pub mod error;
pub mod expiration;
pub mod hasher;
pub mod issuance;
pub mod license;
pub mod organization;
pub mod plan;
pub mod schema;
pub mod token;
pub mod user;
pub mod validation;

pub use claims::{
    from_claims, license_from_claims, to_claims, write_claims, Claim, ClaimSet, ClaimsSink,
    ClaimsSource, FromClaim,
};
pub use config::LicensingConfig;
pub use encoder::{decode, decode_exact, encode, hash_bytes, payload_bytes};
pub use entity::{EntitySnapshot, OrganizationSnapshot, UserSnapshot};
pub use error::{
    ConfigError, DecodeError, EncodeError, FailureClass, IssueError, LicenseFailure,
    ValidationError,
};
pub use expiration::{ExpirationContext, LicenseDates, SubscriptionSnapshot};
pub use hasher::{compute_hash, verify_hash};
pub use issuance::{issue_organization_license, issue_user_license, refresh_license, IssueParams};
pub use license::{License, LicenseKind, LicenseRecord};
pub use organization::{OrganizationLicense, ORGANIZATION_LICENSE_VERSION};
pub use plan::{LicenseType, PlanType};
pub use schema::{current_version, max_version, should_include, EncodingMode, Exemption};
pub use token::{sign_license, split_token};
pub use user::{UserLicense, USER_LICENSE_VERSION};
pub use validation::{
    validate_claims_against_license, validate_entity_against_license, validate_license,
    validate_license_token, LicenseStanding,
};
