//! # License Token
//!
//! Issuance side of the signing pipeline, plus the token framing shared
//! with verification.
//!
//! ```text
//! token = base64url_nopad(payload) "." base64url_nopad(signature)
//! ```
//!
//! `payload` is the full canonical encoding at the license's own version,
//! byte for byte as signed. Verification re-encodes the decoded license
//! and requires the same bytes, so the framing never needs to carry
//! anything else.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use entl_core::CanonicalBytes;
use entl_crypto::{Ed25519KeyPair, Ed25519Signature};

use crate::encoder::payload_bytes;
use crate::error::{EncodeError, LicenseFailure};
use crate::hasher::compute_hash;
use crate::license::{License, LicenseRecord};

/// Separates the payload and signature parts of a token.
pub const TOKEN_SEPARATOR: char = '.';

/// Join a signed payload and its signature into a token.
pub fn assemble_token(payload: &CanonicalBytes, signature: &Ed25519Signature) -> String {
    format!(
        "{}{TOKEN_SEPARATOR}{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(signature.as_bytes())
    )
}

/// The two decoded parts of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts {
    /// Payload bytes exactly as they were signed.
    pub payload: Vec<u8>,
    pub signature: Ed25519Signature,
}

/// Split a token and decode both parts.
///
/// Surrounding whitespace is ignored, since tokens usually arrive from a
/// file with a trailing newline.
pub fn split_token(token: &str) -> Result<TokenParts, LicenseFailure> {
    let token = token.trim();
    let (payload, signature) = token
        .split_once(TOKEN_SEPARATOR)
        .ok_or_else(|| LicenseFailure::MalformedToken("missing separator".into()))?;
    if payload.is_empty() || signature.contains(TOKEN_SEPARATOR) {
        return Err(LicenseFailure::MalformedToken("expected exactly two parts".into()));
    }
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| LicenseFailure::MalformedToken(format!("payload: {e}")))?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| LicenseFailure::MalformedToken(format!("signature: {e}")))?;
    let signature = Ed25519Signature::from_slice(&signature)
        .map_err(|e| LicenseFailure::MalformedToken(e.to_string()))?;
    Ok(TokenParts { payload, signature })
}

/// Compute `Hash`, sign the payload, and attach `Signature` and `Token`.
///
/// Any previous envelope is discarded first, so re-signing after a
/// refresh yields the same result as signing a fresh instance.
pub fn sign_license(license: &mut License, key: &Ed25519KeyPair) -> Result<(), EncodeError> {
    license.set_hash(None);
    license.set_signature(None);
    license.set_token(None);

    let hash = compute_hash(license)?;
    license.set_hash(Some(hash));
    let payload = payload_bytes(license)?;
    let signature = key.sign(&payload);

    license.set_signature(Some(signature.to_base64()));
    license.set_token(Some(assemble_token(&payload, &signature)));
    tracing::debug!(
        kind = %license.kind(),
        version = license.version(),
        license_key = license.license_key(),
        "license signed"
    );
    Ok(())
}
