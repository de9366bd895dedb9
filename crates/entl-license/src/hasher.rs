//! # License Hasher
//!
//! SHA-256 over the hash-only encoding, carried in the `Hash` field as
//! standard base64. The signature is the real tamper guard; the hash
//! catches encoder drift between issuer and verifier.

use entl_core::{sha256_digest, ContentDigest};

use crate::encoder::hash_bytes;
use crate::error::EncodeError;
use crate::license::{License, LicenseRecord};

/// Digest of the hash-only encoding at the license's own version.
pub fn compute_digest(license: &License) -> Result<ContentDigest, EncodeError> {
    Ok(sha256_digest(&hash_bytes(license)?))
}

/// The `Hash` field value for `license`.
pub fn compute_hash(license: &License) -> Result<String, EncodeError> {
    compute_digest(license).map(|d| d.to_base64())
}

/// Whether the embedded `Hash` equals the recomputed digest.
///
/// A missing or undecodable `Hash` never matches. The comparison is
/// constant-time in the digest bytes.
pub fn verify_hash(license: &License) -> Result<bool, EncodeError> {
    let expected = compute_digest(license)?;
    Ok(license
        .hash()
        .and_then(ContentDigest::from_base64)
        .is_some_and(|embedded| embedded.ct_eq(&expected)))
}
