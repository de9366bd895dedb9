//! # Ed25519 Signing and Verification
//!
//! Key generation, license signing, and signature verification.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. An issuer cannot sign anything
//!   other than a record produced by the canonical writer.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize`; the only way out is [`Ed25519KeyPair::to_seed_hex()`]
//!   for writing a key file.
//! - [`verify_bytes()`] exists for one purpose: checking a signature over the
//!   payload exactly as it arrived in a token, *before* anything is parsed
//!   out of it. Verification uses the strict dalek check, which rejects
//!   small-order keys and non-canonical `S` values.
//!
//! ## Encodings
//!
//! - Public keys and key files use lowercase hex.
//! - Signatures use standard base64, the form stored in a license's
//!   `Signature` field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::Signer;
use entl_core::CanonicalBytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;

/// An Ed25519 public key (32 bytes) for signature verification.
///
/// Serializes as a hex-encoded string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// An Ed25519 signature (64 bytes).
///
/// Serializes as a standard base64 string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Parse a public key from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        Ok(Self(hex_to_array::<32>(hex).map_err(CryptoError::KeyError)?))
    }

    /// Convert to an `ed25519_dalek::VerifyingKey` for verification operations.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Create a signature from a slice, rejecting anything but 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as standard base64 with padding.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse the standard base64 form.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::Decode(format!("signature base64: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let b64 = String::deserialize(deserializer)?;
        Self::from_base64(&b64).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Create a key pair from raw 32-byte private key seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Load a key pair from the hex seed stored in a key file.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let seed = hex_to_array::<32>(hex).map_err(CryptoError::KeyError)?;
        Ok(Self::from_seed(&seed))
    }

    /// Render the private seed as hex for writing a key file.
    pub fn to_seed_hex(&self) -> String {
        bytes_to_hex(&self.signing_key.to_bytes())
    }

    /// Get the public key from this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    ///
    /// You cannot sign raw `&[u8]`: a license signature always covers a
    /// record the verifier can rebuild from the decoded license.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        let sig = self.signing_key.sign(data.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over canonical bytes.
pub fn verify(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    verifying_key: &ed25519_dalek::VerifyingKey,
) -> Result<(), CryptoError> {
    verify_message(data.as_bytes(), signature, verifying_key)
}

/// Convenience verification using `Ed25519PublicKey` instead of dalek key.
pub fn verify_with_public_key(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    verify(data, signature, &vk)
}

/// Verify a signature over payload bytes exactly as received.
///
/// Used on token payloads before they are parsed, so that any bit flip is
/// reported as a signature failure rather than whatever parse error the
/// corrupted bytes would happen to trigger.
pub fn verify_bytes(
    payload: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    verify_message(payload, signature, &vk)
}

fn verify_message(
    message: &[u8],
    signature: &Ed25519Signature,
    verifying_key: &ed25519_dalek::VerifyingKey,
) -> Result<(), CryptoError> {
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify_strict(message, &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Hex utilities (no external hex crate dependency)
// ---------------------------------------------------------------------------

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes_to_hex(&bytes[..bytes.len().min(4)])
}

fn hex_to_array<const N: usize>(hex: &str) -> Result<[u8; N], String> {
    let hex = hex.trim();
    if hex.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, hex.len()));
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        let pair = hex
            .get(2 * i..2 * i + 2)
            .ok_or_else(|| format!("invalid hex at position {}", 2 * i))?;
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|e| format!("invalid hex at position {}: {e}", 2 * i))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entl_core::{CanonicalValue, RecordWriter};

    fn record(name: &str) -> CanonicalBytes {
        let mut w = RecordWriter::new("user").unwrap();
        w.field("Name", &CanonicalValue::Text(name.to_string())).unwrap();
        w.finish()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let canonical = record("alice");
        let sig = kp.sign(&canonical);
        let vk = kp.public_key().to_verifying_key().unwrap();
        verify(&canonical, &sig, &vk).expect("valid signature should verify");
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let canonical = record("alice");
        let sig = kp1.sign(&canonical);
        let result = verify_with_public_key(&canonical, &sig, &kp2.public_key());
        assert!(matches!(result, Err(CryptoError::VerificationFailed(_))));
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&record("original"));
        assert!(verify_with_public_key(&record("tampered"), &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn test_verify_bytes_matches_canonical_verify() {
        let kp = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let canonical = record("bob");
        let sig = kp.sign(&canonical);
        verify_bytes(canonical.as_bytes(), &sig, &kp.public_key()).unwrap();

        let mut flipped = canonical.as_bytes().to_vec();
        flipped[3] ^= 0x01;
        assert!(verify_bytes(&flipped, &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn test_deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = Ed25519KeyPair::from_seed(&seed);
        let kp2 = Ed25519KeyPair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.sign(&record("x")), kp2.sign(&record("x")));
    }

    #[test]
    fn test_seed_hex_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let hex = kp.to_seed_hex();
        assert_eq!(hex.len(), 64);
        let kp2 = Ed25519KeyPair::from_seed_hex(&format!("{hex}\n")).unwrap();
        assert_eq!(kp.public_key(), kp2.public_key());
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = Ed25519KeyPair::generate().public_key();
        let hex = pk.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Ed25519PublicKey::from_hex(&hex).unwrap(), pk);
    }

    #[test]
    fn test_signature_base64_roundtrip() {
        let sig = Ed25519KeyPair::generate().sign(&record("y"));
        let b64 = sig.to_base64();
        assert_eq!(b64.len(), 88);
        assert_eq!(Ed25519Signature::from_base64(&b64).unwrap(), sig);
    }

    #[test]
    fn test_signature_from_slice_rejects_wrong_length() {
        assert_eq!(
            Ed25519Signature::from_slice(&[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength(63))
        );
    }

    #[test]
    fn test_serde_forms() {
        let kp = Ed25519KeyPair::generate();
        let pk_json = serde_json::to_string(&kp.public_key()).unwrap();
        assert_eq!(pk_json.len(), 64 + 2);
        let sig = kp.sign(&record("z"));
        let sig_json = serde_json::to_string(&sig).unwrap();
        assert_eq!(sig_json.len(), 88 + 2);
        let back: Ed25519Signature = serde_json::from_str(&sig_json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(Ed25519PublicKey::from_hex("not-hex").is_err());
        assert!(Ed25519PublicKey::from_hex("aabb").is_err());
        assert!(Ed25519PublicKey::from_hex(&"zz".repeat(32)).is_err());
        assert!(Ed25519KeyPair::from_seed_hex(&"é".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
    }
}
