//! # entl-crypto — Cryptographic Primitives
//!
//! Ed25519 signing and verification for entitlement licenses. The issuer
//! holds an [`Ed25519KeyPair`]; every verifier holds only the matching
//! [`Ed25519PublicKey`].
//!
//! ## Crate Policy
//!
//! - Depends only on `entl-core` internally.
//! - Signing accepts only `&CanonicalBytes`.
//! - No mocking of cryptographic operations in tests.

pub mod ed25519;
pub mod error;

pub use ed25519::{
    verify, verify_bytes, verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey,
    Ed25519Signature,
};
pub use error::CryptoError;
