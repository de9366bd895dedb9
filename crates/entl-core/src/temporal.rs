//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds precision.
//!
//! ## Security Invariant
//!
//! License dates enter the canonical record as Unix epoch seconds. Any
//! sub-second component would be silently dropped by the encoder and make a
//! decoded license compare unequal to the one that was signed, so the
//! truncation happens at construction and nowhere else.
//!
//! Claims carry dates as `YYYY-MM-DDTHH:MM:SSZ`. The strict parser rejects
//! offsets other than `Z`; the lenient parser converts them.
//!
//! Every constructor and every shift keeps the year within `1..=9999`, the
//! range the four-digit claim form can express.

use chrono::{DateTime, Datelike, Months, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TemporalError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time, truncated.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-seconds.
///
/// All of them fail with [`TemporalError::OutOfRange`] outside years
/// 1 through 9999.
/// - [`Timestamp::from_epoch_secs()`]: from the canonical record form.
/// - [`Timestamp::parse()`]: from an ISO8601 string, rejecting non-UTC offsets.
///
/// `Default` is the Unix epoch, which is also what claim parsing falls back
/// to for an unreadable date.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "DateTime<Utc>")]
pub struct Timestamp(DateTime<Utc>);

/// Years a timestamp may fall in.
const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Result<Self, TemporalError> {
        if !YEARS.contains(&dt.year()) {
            return Err(TemporalError::OutOfRange(format!("year {} in {dt}", dt.year())));
        }
        Ok(Self(truncate_to_seconds(dt)))
    }

    /// Parse a timestamp from an RFC 3339 string with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`TemporalError::NotUtc`] for any explicit offset (including
    /// `+00:00`) and [`TemporalError::Parse`] for malformed input.
    pub fn parse(s: &str) -> Result<Self, TemporalError> {
        if !s.ends_with('Z') {
            return Err(TemporalError::NotUtc(s.to_string()));
        }
        Self::parse_lenient(s)
    }

    /// Parse a timestamp from an RFC 3339 string, accepting any timezone
    /// offset and converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, TemporalError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| TemporalError::Parse {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_utc(dt.with_timezone(&Utc))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TemporalError> {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| TemporalError::OutOfRange(format!("unix timestamp {secs}")))
            .and_then(Self::from_utc)
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Shift by a signed number of whole days.
    pub fn plus_days(&self, days: i64) -> Result<Self, TemporalError> {
        let delta = TimeDelta::try_days(days)
            .ok_or_else(|| TemporalError::OutOfRange(format!("{days} days")))?;
        self.plus(delta)
    }

    /// Shift by an arbitrary signed duration.
    pub fn plus(&self, delta: TimeDelta) -> Result<Self, TemporalError> {
        self.0
            .checked_add_signed(delta)
            .ok_or_else(|| TemporalError::OutOfRange(format!("{} + {delta}", self.to_iso8601())))
            .and_then(Self::from_utc)
    }

    /// Shift forward by calendar months, clamping the day to the end of a
    /// shorter target month (Jan 31 + 1 month = Feb 28/29).
    pub fn plus_months(&self, months: u32) -> Result<Self, TemporalError> {
        self.0
            .checked_add_months(Months::new(months))
            .ok_or_else(|| {
                TemporalError::OutOfRange(format!("{} + {months} months", self.to_iso8601()))
            })
            .and_then(Self::from_utc)
    }

    /// Signed duration `self - earlier`.
    pub fn since(&self, earlier: &Timestamp) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = TemporalError;

    fn try_from(dt: DateTime<Utc>) -> Result<Self, Self::Error> {
        Self::from_utc(dt)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
