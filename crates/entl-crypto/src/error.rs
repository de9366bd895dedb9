//! # Cryptographic Error Types
//!
//! Structured errors for key handling and signature verification.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Key material could not be parsed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Text encoding (hex or base64) could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}
