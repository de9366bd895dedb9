//! # Content Digest — License Integrity Hash
//!
//! ## Security Invariant
//!
//! `ContentDigest` can only be computed from `CanonicalBytes`, so every
//! license hash is taken over a record produced by the canonical writer.
//! This is enforced by the signature of [`sha256_digest()`].
//!
//! Digest comparison goes through [`ContentDigest::ct_eq()`], which runs in
//! time independent of where the first differing byte sits.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::canonical::CanonicalBytes;

/// A SHA-256 digest of a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Return the raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as standard base64 with padding, the form stored in a
    /// license's `Hash` field.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse the `Hash` field form. Returns `None` unless the input decodes
    /// to exactly 32 bytes.
    pub fn from_base64(s: &str) -> Option<Self> {
        let bytes = STANDARD.decode(s.trim()).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &ContentDigest) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, not raw `&[u8]`.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalValue, RecordWriter};

    fn user_record(premium: bool) -> CanonicalBytes {
        let mut w = RecordWriter::new("user").unwrap();
        w.field("Premium", &CanonicalValue::Bool(premium)).unwrap();
        w.finish()
    }

    #[test]
    fn test_sha256_digest_deterministic() {
        assert_eq!(sha256_digest(&user_record(true)), sha256_digest(&user_record(true)));
    }

    #[test]
    fn test_different_inputs_different_digests() {
        assert_ne!(sha256_digest(&user_record(true)), sha256_digest(&user_record(false)));
    }

    #[test]
    fn test_known_sha256_vector() {
        // hashlib.sha256(b"license:user").hexdigest()
        let cb = RecordWriter::new("user").unwrap().finish();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "2ece41dbbe817a3d106230f748664cc8d885a7c20643511db509e8311091e50d"
        );
    }

    #[test]
    fn test_base64_roundtrip() {
        let d = sha256_digest(&user_record(true));
        let b64 = d.to_base64();
        assert_eq!(b64.len(), 44);
        assert!(b64.ends_with('='));
        assert_eq!(ContentDigest::from_base64(&b64), Some(d));
    }

    #[test]
    fn test_from_base64_rejects_wrong_length() {
        assert_eq!(ContentDigest::from_base64("AAAA"), None);
        assert_eq!(ContentDigest::from_base64("not base64!"), None);
    }

    #[test]
    fn test_ct_eq() {
        let a = sha256_digest(&user_record(true));
        let b = sha256_digest(&user_record(false));
        assert!(a.ct_eq(&a));
        assert!(!a.ct_eq(&b));
    }

    #[test]
    fn test_display_prefix() {
        let s = sha256_digest(&user_record(true)).to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }
}
