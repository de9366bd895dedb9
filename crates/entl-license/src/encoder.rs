//! # Canonical Encoder and Decoder
//!
//! Walks a license's schema table in declaration order, keeps the fields
//! the inclusion rule selects for `(version, mode)`, and writes them through
//! [`RecordWriter`]. The same table drives decoding, so the two directions
//! cannot disagree on names, order, or value types.
//!
//! ## Decoding Modes
//!
//! - [`decode`] is tolerant: fields introduced after the declared version
//!   are rejected, but included fields that are absent keep their defaults.
//!   This is what lets a record written at an older version be read back.
//! - [`decode_exact`] additionally requires every field the declared version
//!   includes in the payload. Token verification uses it.

use entl_core::{parse_record, CanonicalBytes, CanonicalValue, ParsedRecord, RecordWriter};

use crate::error::{DecodeError, EncodeError};
use crate::license::{License, LicenseKind, LicenseRecord};
use crate::organization::ORGANIZATION_SCHEMA;
use crate::schema::{fields, EncodingMode, LicenseSchema};
use crate::user::USER_SCHEMA;

// ─── Encoding ────────────────────────────────────────────────────────

/// Encode `license` with the fields `schema` includes at `version`.
pub fn encode_with<L: 'static>(
    schema: &LicenseSchema<L>,
    license: &L,
    version: u32,
    mode: EncodingMode,
) -> Result<CanonicalBytes, EncodeError> {
    if !schema.supports(version) {
        return Err(EncodeError::VersionOutOfRange {
            kind: schema.kind,
            version,
            max: schema.max_version(),
        });
    }
    let mut writer = RecordWriter::new(schema.kind.as_str())?;
    for spec in schema.included(version, mode) {
        let value = (spec.get)(license).ok_or(EncodeError::MissingField {
            field: spec.name,
            version,
        })?;
        writer.field(spec.name, &value)?;
    }
    Ok(writer.finish())
}

/// Encode a license of either kind at `version`.
pub fn encode(
    license: &License,
    version: u32,
    mode: EncodingMode,
) -> Result<CanonicalBytes, EncodeError> {
    match license {
        License::Organization(l) => encode_with(&ORGANIZATION_SCHEMA, l, version, mode),
        License::User(l) => encode_with(&USER_SCHEMA, l, version, mode),
    }
}

/// The signed payload of a license at its own declared version.
pub fn payload_bytes(license: &License) -> Result<CanonicalBytes, EncodeError> {
    encode(license, license.version(), EncodingMode::Payload)
}

/// The hash-only encoding of a license at its own declared version.
pub fn hash_bytes(license: &License) -> Result<CanonicalBytes, EncodeError> {
    encode(license, license.version(), EncodingMode::Hash)
}

// ─── Decoding ────────────────────────────────────────────────────────

/// Decode record bytes, tolerating absent version-gated fields.
pub fn decode(bytes: &[u8]) -> Result<License, DecodeError> {
    decode_record(bytes, false)
}

/// Decode record bytes, requiring every field the declared version includes.
pub fn decode_exact(bytes: &[u8]) -> Result<License, DecodeError> {
    decode_record(bytes, true)
}

fn decode_record(bytes: &[u8], exact: bool) -> Result<License, DecodeError> {
    let record = parse_record(bytes)?;
    let kind = LicenseKind::from_header(&record.kind)
        .ok_or_else(|| DecodeError::UnknownKind(record.kind.clone()))?;
    Ok(match kind {
        LicenseKind::Organization => {
            License::Organization(decode_with(&ORGANIZATION_SCHEMA, &record, exact)?)
        }
        LicenseKind::User => License::User(decode_with(&USER_SCHEMA, &record, exact)?),
    })
}

/// Decode a parsed record against one schema.
pub fn decode_with<L: Default + 'static>(
    schema: &LicenseSchema<L>,
    record: &ParsedRecord,
    exact: bool,
) -> Result<L, DecodeError> {
    let version = declared_version(record)?;
    if !schema.supports(version) {
        return Err(DecodeError::UnsupportedVersion {
            kind: schema.kind,
            version,
            max: schema.max_version(),
        });
    }

    let mut license = L::default();
    let mut seen: Vec<&'static str> = Vec::with_capacity(record.fields.len());
    for raw in &record.fields {
        let spec = schema
            .field(&raw.name)
            .ok_or_else(|| DecodeError::UnknownField(raw.name.clone()))?;
        if seen.contains(&spec.name) {
            return Err(DecodeError::DuplicateField(raw.name.clone()));
        }
        if !spec.includes(version, EncodingMode::Payload) {
            return Err(DecodeError::FieldNotAtVersion {
                field: raw.name.clone(),
                version,
            });
        }
        let value = CanonicalValue::parse(spec.name, &raw.value, spec.ty.value_kind(), spec.nullable)?;
        (spec.set)(&mut license, value).ok_or_else(|| DecodeError::InvalidValue {
            field: raw.name.clone(),
            raw: raw.value.clone(),
        })?;
        seen.push(spec.name);
    }

    if exact {
        if let Some(missing) = schema
            .included(version, EncodingMode::Payload)
            .find(|spec| !seen.contains(&spec.name))
        {
            return Err(DecodeError::MissingField {
                field: missing.name,
                version,
            });
        }
    }
    Ok(license)
}

/// The `Version` value, read before anything else so that every other
/// field can be checked against it.
fn declared_version(record: &ParsedRecord) -> Result<u32, DecodeError> {
    let raw = record.get(fields::VERSION).ok_or(DecodeError::MissingVersion)?;
    let n: i64 = raw.value.parse().map_err(|_| DecodeError::MissingVersion)?;
    if n < 0 {
        return Err(DecodeError::MissingVersion);
    }
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}
