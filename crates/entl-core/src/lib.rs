//! # entl-core — Foundational Types for Entitlement Licensing
//!
//! The leaf of the workspace. It defines the primitives whose guarantees the
//! rest of the stack leans on:
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that is hashed or
//!    signed is produced by [`RecordWriter`], with fixed per-type value rules
//!    and caller-controlled field order. No raw `Vec<u8>` is ever signed.
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** The license hash
//!    cannot be computed over an ad-hoc serialization.
//!
//! 3. **UTC-only timestamps** truncated to seconds, so dates survive the
//!    epoch-seconds round trip through a record unchanged.
//!
//! 4. **Identifier newtypes** for organizations, users, and installations.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `entl-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::{
    parse_record, CanonicalBytes, CanonicalValue, ParsedRecord, RawField, RecordWriter, ValueKind,
};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, TemporalError};
pub use identity::{InstallationId, OrganizationId, UserId};
pub use temporal::Timestamp;
