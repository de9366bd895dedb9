//! # Canonical Records — Deterministic License Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are hashed or signed anywhere in the licensing stack, together with
//! the record grammar those bytes follow:
//!
//! ```text
//! license:<kind>|<Name>:<value>|<Name>:<value>|...
//! ```
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is [`RecordWriter::finish()`], which renders every value with
//! a fixed per-type rule. Any function that hashes or signs must accept
//! `&CanonicalBytes`, so a license can never be signed over an ad-hoc
//! serialization that a verifier would fail to reproduce.
//!
//! ## Value Rules
//!
//! | Kind        | Rendering                                     |
//! |-------------|-----------------------------------------------|
//! | `Bool`      | `true` / `false`                              |
//! | `Int`       | decimal, leading `-` for negatives            |
//! | `Text`      | UTF-8 verbatim, `\` and `\|` backslash-escaped |
//! | `Uuid`      | lowercase hyphenated                          |
//! | `Timestamp` | Unix epoch seconds                            |
//! | `Null`      | empty value (`Name:`)                         |
//!
//! Field order is the caller's declaration order; the writer never sorts.
//! Names are restricted to ASCII alphanumerics so the first `:` of a segment
//! always terminates the name.

use uuid::Uuid;

use crate::error::CanonicalizationError;
use crate::temporal::Timestamp;

/// Leading token of every record header.
pub const RECORD_PREFIX: &str = "license";

const FIELD_SEPARATOR: char = '|';
const NAME_SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// Bytes produced exclusively by [`RecordWriter`].
///
/// # Invariants
///
/// - The only constructor is [`RecordWriter::finish()`].
/// - The content is valid UTF-8 and parses back with [`parse_record()`].
/// - Every value was rendered by [`CanonicalValue`]'s fixed rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Access the canonical bytes for digest or signature computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The record as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// ─── Values ──────────────────────────────────────────────────────────────

/// The wire type of a record field, used to parse raw value text back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Text,
    Uuid,
    Timestamp,
}

impl ValueKind {
    /// Returns the type name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Text => "text",
            Self::Uuid => "uuid",
            Self::Timestamp => "epoch timestamp",
        }
    }
}

/// A single typed field value inside a canonical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    /// An absent nullable value.
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    Timestamp(Timestamp),
}

impl CanonicalValue {
    /// Wrap an optional value, mapping `None` to [`CanonicalValue::Null`].
    pub fn from_option<T>(value: Option<T>, wrap: impl FnOnce(T) -> Self) -> Self {
        value.map_or(Self::Null, wrap)
    }

    /// Returns true for [`CanonicalValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn write_into(&self, out: &mut String) {
        match self {
            Self::Null => {}
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Int(n) => out.push_str(&n.to_string()),
            Self::Text(s) => escape_into(s, out),
            Self::Uuid(id) => out.push_str(&id.hyphenated().to_string()),
            Self::Timestamp(ts) => out.push_str(&ts.epoch_secs().to_string()),
        }
    }

    /// Parse unescaped value text as `kind`.
    ///
    /// An empty value is [`CanonicalValue::Null`] when `nullable` is set.
    /// Text values are never null: an empty text value is the empty string.
    pub fn parse(
        field: &str,
        raw: &str,
        kind: ValueKind,
        nullable: bool,
    ) -> Result<Self, CanonicalizationError> {
        if kind == ValueKind::Text {
            return Ok(Self::Text(raw.to_string()));
        }
        if raw.is_empty() && nullable {
            return Ok(Self::Null);
        }
        let invalid = || CanonicalizationError::InvalidValue {
            field: field.to_string(),
            raw: raw.to_string(),
            expected: kind.as_str(),
        };
        match kind {
            ValueKind::Bool => match raw {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::Int => raw.parse::<i64>().map(Self::Int).map_err(|_| invalid()),
            ValueKind::Uuid => Uuid::parse_str(raw).map(Self::Uuid).map_err(|_| invalid()),
            ValueKind::Timestamp => raw
                .parse::<i64>()
                .ok()
                .and_then(|secs| Timestamp::from_epoch_secs(secs).ok())
                .map(Self::Timestamp)
                .ok_or_else(invalid),
            ValueKind::Text => Ok(Self::Text(raw.to_string())),
        }
    }
}

// ─── Writer ──────────────────────────────────────────────────────────────

/// Incremental builder for a canonical record.
#[derive(Debug)]
pub struct RecordWriter {
    buf: String,
}

impl RecordWriter {
    /// Start a record of the given kind (`organization`, `user`, ...).
    pub fn new(kind: &str) -> Result<Self, CanonicalizationError> {
        if kind.is_empty() || !kind.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(CanonicalizationError::InvalidKind(kind.to_string()));
        }
        let mut buf = String::with_capacity(512);
        buf.push_str(RECORD_PREFIX);
        buf.push(NAME_SEPARATOR);
        buf.push_str(kind);
        Ok(Self { buf })
    }

    /// Append one field. Fields are emitted in call order.
    pub fn field(
        &mut self,
        name: &str,
        value: &CanonicalValue,
    ) -> Result<(), CanonicalizationError> {
        if !is_valid_name(name) {
            return Err(CanonicalizationError::InvalidFieldName(name.to_string()));
        }
        self.buf.push(FIELD_SEPARATOR);
        self.buf.push_str(name);
        self.buf.push(NAME_SEPARATOR);
        value.write_into(&mut self.buf);
        Ok(())
    }

    /// Seal the record.
    pub fn finish(self) -> CanonicalBytes {
        CanonicalBytes(self.buf)
    }
}

// ─── Parser ──────────────────────────────────────────────────────────────

/// One `Name:value` segment with the value unescaped but not yet typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub value: String,
}

/// A record split into its kind and raw fields, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub kind: String,
    pub fields: Vec<RawField>,
}

impl ParsedRecord {
    /// First field with the given name.
    pub fn get(&self, name: &str) -> Option<&RawField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Split record bytes into kind and raw fields.
///
/// This is purely syntactic. Typing values and checking which fields are
/// allowed is the schema owner's job.
pub fn parse_record(bytes: &[u8]) -> Result<ParsedRecord, CanonicalizationError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CanonicalizationError::InvalidUtf8)?;
    let mut segments = split_segments(text)?.into_iter();

    let header = segments.next().ok_or(CanonicalizationError::MissingHeader)?;
    let kind = header
        .strip_prefix(RECORD_PREFIX)
        .and_then(|rest| rest.strip_prefix(NAME_SEPARATOR))
        .ok_or(CanonicalizationError::MissingHeader)?;
    if kind.is_empty() || !kind.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(CanonicalizationError::InvalidKind(kind.to_string()));
    }

    let mut fields = Vec::new();
    for segment in segments {
        let (name, escaped) = segment
            .split_once(NAME_SEPARATOR)
            .ok_or_else(|| CanonicalizationError::MissingSeparator(segment.to_string()))?;
        if !is_valid_name(name) {
            return Err(CanonicalizationError::InvalidFieldName(name.to_string()));
        }
        let value = unescape(name, escaped)?;
        fields.push(RawField {
            name: name.to_string(),
            value,
        });
    }

    Ok(ParsedRecord {
        kind: kind.to_string(),
        fields,
    })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        if c == ESCAPE || c == FIELD_SEPARATOR {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Split on unescaped separators, keeping escapes in place.
fn split_segments(text: &str) -> Result<Vec<&str>, CanonicalizationError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == ESCAPE {
            if chars.next().is_none() {
                return Err(CanonicalizationError::InvalidEscape(
                    text[start..].split(NAME_SEPARATOR).next().unwrap_or("").to_string(),
                ));
            }
        } else if c == FIELD_SEPARATOR {
            segments.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    segments.push(&text[start..]);
    Ok(segments)
}

fn unescape(field: &str, escaped: &str) -> Result<String, CanonicalizationError> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next() {
                Some(next @ (ESCAPE | FIELD_SEPARATOR)) => out.push(next),
                _ => return Err(CanonicalizationError::InvalidEscape(field.to_string())),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, CanonicalValue)]) -> CanonicalBytes {
        let mut w = RecordWriter::new("organization").unwrap();
        for (name, value) in fields {
            w.field(name, value).unwrap();
        }
        w.finish()
    }

    #[test]
    fn test_writer_renders_every_kind() {
        let id = Uuid::parse_str("12300000-0000-0000-0000-000000000456").unwrap();
        let cb = record(&[
            ("BusinessName", CanonicalValue::Null),
            ("Enabled", CanonicalValue::Bool(true)),
            ("Expires", CanonicalValue::Timestamp(Timestamp::from_epoch_secs(1_740_787_200).unwrap())),
            ("Id", CanonicalValue::Uuid(id)),
            ("Name", CanonicalValue::Text("myOrg".into())),
            ("Seats", CanonicalValue::Int(-10)),
        ]);
        assert_eq!(
            cb.as_str(),
            "license:organization|BusinessName:|Enabled:true|Expires:1740787200\
             |Id:12300000-0000-0000-0000-000000000456|Name:myOrg|Seats:-10"
        );
    }

    #[test]
    fn test_empty_record_is_header_only() {
        let cb = RecordWriter::new("user").unwrap().finish();
        assert_eq!(cb.as_bytes(), b"license:user");
        let parsed = parse_record(cb.as_bytes()).unwrap();
        assert_eq!(parsed.kind, "user");
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn test_text_escaping() {
        let cb = record(&[("Name", CanonicalValue::Text(r"a|b\c:d".into()))]);
        assert_eq!(cb.as_str(), r"license:organization|Name:a\|b\\c:d");
        let parsed = parse_record(cb.as_bytes()).unwrap();
        assert_eq!(parsed.fields[0].value, r"a|b\c:d");
    }

    #[test]
    fn test_invalid_kind_rejected() {
        assert!(RecordWriter::new("").is_err());
        assert!(RecordWriter::new("Org").is_err());
        assert!(RecordWriter::new("a|b").is_err());
    }

    #[test]
    fn test_invalid_field_name_rejected() {
        let mut w = RecordWriter::new("user").unwrap();
        assert!(w.field("", &CanonicalValue::Null).is_err());
        assert!(w.field("Na:me", &CanonicalValue::Null).is_err());
        assert!(w.field("Na|me", &CanonicalValue::Null).is_err());
    }

    #[test]
    fn test_parse_missing_header() {
        assert_eq!(
            parse_record(b"licence:user|A:1"),
            Err(CanonicalizationError::MissingHeader)
        );
        assert_eq!(parse_record(b""), Err(CanonicalizationError::MissingHeader));
    }

    #[test]
    fn test_parse_missing_separator() {
        assert!(matches!(
            parse_record(b"license:user|Premium"),
            Err(CanonicalizationError::MissingSeparator(_))
        ));
        assert!(matches!(
            parse_record(b"license:user||Premium:true"),
            Err(CanonicalizationError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_parse_dangling_escape() {
        assert!(matches!(
            parse_record(b"license:user|Name:abc\\"),
            Err(CanonicalizationError::InvalidEscape(_))
        ));
        assert!(matches!(
            parse_record(b"license:user|Name:a\\b"),
            Err(CanonicalizationError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        assert_eq!(
            parse_record(&[b'l', 0xff, 0xfe]),
            Err(CanonicalizationError::InvalidUtf8)
        );
    }

    #[test]
    fn test_value_parse_rules() {
        use CanonicalValue as V;
        assert_eq!(V::parse("A", "true", ValueKind::Bool, false), Ok(V::Bool(true)));
        assert!(V::parse("A", "True", ValueKind::Bool, false).is_err());
        assert_eq!(V::parse("A", "", ValueKind::Int, true), Ok(V::Null));
        assert!(V::parse("A", "", ValueKind::Int, false).is_err());
        assert_eq!(V::parse("A", "", ValueKind::Text, true), Ok(V::Text(String::new())));
        assert_eq!(
            V::parse("A", "1740787200", ValueKind::Timestamp, false),
            Ok(V::Timestamp(Timestamp::from_epoch_secs(1_740_787_200).unwrap()))
        );
        assert!(V::parse("A", "not-a-uuid", ValueKind::Uuid, false).is_err());
    }
}
