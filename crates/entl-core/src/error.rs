//! # Error Types
//!
//! Errors raised by the leaf primitives. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations; higher crates wrap
//! them in their own enums rather than flattening them into strings.

use thiserror::Error;

/// Error while writing or parsing a canonical license record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// The record kind is empty or contains characters outside `[a-z]`.
    #[error("invalid record kind {0:?}: must be non-empty lowercase ASCII")]
    InvalidKind(String),

    /// A field name is empty or contains characters outside `[A-Za-z0-9]`.
    #[error("invalid field name {0:?}: must be non-empty ASCII alphanumeric")]
    InvalidFieldName(String),

    /// The record does not start with `license:<kind>`.
    #[error("record header missing or malformed")]
    MissingHeader,

    /// The record bytes are not valid UTF-8.
    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    /// A field segment has no `:` separating name from value.
    #[error("field segment {0:?} has no name/value separator")]
    MissingSeparator(String),

    /// A value ends with an unpaired escape character or escapes an
    /// unexpected character.
    #[error("invalid escape sequence in value of field {0}")]
    InvalidEscape(String),

    /// A raw value could not be parsed as the expected type.
    #[error("field {field}: cannot parse {raw:?} as {expected}")]
    InvalidValue {
        /// Field whose value failed to parse.
        field: String,
        /// The raw (unescaped) value text.
        raw: String,
        /// Human-readable name of the expected type.
        expected: &'static str,
    },
}

/// Error in timestamp construction or arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalError {
    /// The input string is not a valid RFC 3339 timestamp.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Parse {
        /// The rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Timestamp must use the `Z` suffix.
    #[error("timestamp must use Z suffix (UTC only), got: {0:?}")]
    NotUtc(String),

    /// The epoch value or arithmetic result is outside the representable range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}
