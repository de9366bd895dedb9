//! # Claims Codec
//!
//! Maps a license onto a flat list of `(name, value)` string claims and
//! back. The field set and names come from the same schema table as the
//! canonical encoder: the payload fields at the license's own version, plus
//! the claim-only fields (`LicenseType` and the entitlements added after
//! the record format was frozen).
//!
//! ## Claim Rendering
//!
//! | Field type  | Claim value                             |
//! |-------------|-----------------------------------------|
//! | bool        | `true` / `false`                        |
//! | integer     | decimal                                 |
//! | text        | verbatim                                |
//! | UUID        | lowercase hyphenated                    |
//! | timestamp   | `YYYY-MM-DDTHH:MM:SSZ`                  |
//! | `PlanType`  | plan name                               |
//! | `LicenseType` | `Organization` / `User`               |
//! | absent      | empty string                            |
//!
//! ## Reading Claims
//!
//! Reading is best-effort. The claims store may have been written by a
//! different license version, so an absent or unparseable claim yields the
//! type's default value and never an error. The set of readable types is
//! closed: see the [`FromClaim`] implementations.

use std::collections::{BTreeMap, HashMap};

use chrono::TimeDelta;
use entl_core::{CanonicalValue, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::license::{License, LicenseKind};
use crate::organization::{OrganizationLicense, ORGANIZATION_SCHEMA};
use crate::plan::{LicenseType, PlanType};
use crate::schema::{Exemption, FieldSpec, FieldType, LicenseSchema};
use crate::user::{UserLicense, USER_SCHEMA};

// ─── Claim Stores ────────────────────────────────────────────────────

/// Read access to a named-claim store.
pub trait ClaimsSource {
    /// Value of the first claim called `name`.
    fn claim(&self, name: &str) -> Option<&str>;
}

/// Write access to a named-claim store.
pub trait ClaimsSink {
    fn add_claim(&mut self, name: &str, value: String);
}

/// One named string claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

/// An ordered list of claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop every claim called `name`.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|c| c.name != name);
    }

    pub fn into_vec(self) -> Vec<Claim> {
        self.0
    }
}

impl ClaimsSource for ClaimSet {
    fn claim(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|c| c.name == name).map(|c| c.value.as_str())
    }
}

impl ClaimsSink for ClaimSet {
    fn add_claim(&mut self, name: &str, value: String) {
        self.0.push(Claim {
            name: name.to_string(),
            value,
        });
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ClaimsSource for HashMap<String, String> {
    fn claim(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ClaimsSource for BTreeMap<String, String> {
    fn claim(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ClaimsSink for BTreeMap<String, String> {
    fn add_claim(&mut self, name: &str, value: String) {
        self.entry(name.to_string()).or_insert(value);
    }
}

// ─── Writing ─────────────────────────────────────────────────────────

/// Write one claim per claimed field of `license`, in record order.
pub fn write_claims(license: &License, sink: &mut impl ClaimsSink) {
    match license {
        License::Organization(l) => write_with(&ORGANIZATION_SCHEMA, l, l.version, sink),
        License::User(l) => write_with(&USER_SCHEMA, l, l.version, sink),
    }
}

/// The claims of `license` as an ordered list.
pub fn to_claims(license: &License) -> ClaimSet {
    let mut claims = ClaimSet::new();
    write_claims(license, &mut claims);
    claims
}

fn write_with<L: 'static>(
    schema: &LicenseSchema<L>,
    license: &L,
    version: u32,
    sink: &mut impl ClaimsSink,
) {
    for spec in schema.claims(version) {
        let value = (spec.get)(license).unwrap_or(CanonicalValue::Null);
        sink.add_claim(spec.name, render(spec.ty, value));
    }
}

fn render(ty: FieldType, value: CanonicalValue) -> String {
    match value {
        CanonicalValue::Null => String::new(),
        CanonicalValue::Bool(b) => b.to_string(),
        CanonicalValue::Int(n) => match ty {
            FieldType::Plan => PlanType::from_discriminant(n)
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| n.to_string()),
            FieldType::Kind => LicenseType::ALL
                .iter()
                .find(|t| **t as i64 == n)
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| n.to_string()),
            _ => n.to_string(),
        },
        CanonicalValue::Text(s) => s,
        CanonicalValue::Uuid(id) => id.hyphenated().to_string(),
        CanonicalValue::Timestamp(ts) => ts.to_iso8601(),
    }
}

// ─── Reading ─────────────────────────────────────────────────────────

/// A type that can be read back from a claim string.
///
/// `raw` is `None` when the claim is absent. Implementations return their
/// default on absence or parse failure.
pub trait FromClaim: Sized {
    fn from_claim(raw: Option<&str>) -> Self;
}

/// Read the claim `name` from `source` as `T`.
pub fn from_claims<T: FromClaim>(source: &impl ClaimsSource, name: &str) -> T {
    T::from_claim(source.claim(name))
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

impl FromClaim for String {
    fn from_claim(raw: Option<&str>) -> Self {
        raw.unwrap_or_default().to_string()
    }
}

impl FromClaim for bool {
    fn from_claim(raw: Option<&str>) -> Self {
        present(raw).is_some_and(|s| s.eq_ignore_ascii_case("true"))
    }
}

impl FromClaim for f64 {
    fn from_claim(raw: Option<&str>) -> Self {
        present(raw).and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromClaim for Uuid {
    fn from_claim(raw: Option<&str>) -> Self {
        present(raw)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_default()
    }
}

impl FromClaim for Timestamp {
    fn from_claim(raw: Option<&str>) -> Self {
        Option::<Timestamp>::from_claim(raw).unwrap_or_default()
    }
}

impl FromClaim for Option<Timestamp> {
    fn from_claim(raw: Option<&str>) -> Self {
        present(raw).and_then(|s| Timestamp::parse_lenient(s).ok())
    }
}

impl FromClaim for TimeDelta {
    fn from_claim(raw: Option<&str>) -> Self {
        present(raw).and_then(parse_duration).unwrap_or_else(TimeDelta::zero)
    }
}

macro_rules! int_claim {
    ($($t:ty),*) => {$(
        impl FromClaim for $t {
            fn from_claim(raw: Option<&str>) -> Self {
                Option::<$t>::from_claim(raw).unwrap_or_default()
            }
        }

        impl FromClaim for Option<$t> {
            fn from_claim(raw: Option<&str>) -> Self {
                present(raw).and_then(|s| s.parse().ok())
            }
        }
    )*};
}

int_claim!(i16, i32, i64, u32);

macro_rules! enum_claim {
    ($($t:ty),*) => {$(
        impl FromClaim for $t {
            fn from_claim(raw: Option<&str>) -> Self {
                Option::<$t>::from_claim(raw).unwrap_or_default()
            }
        }

        impl FromClaim for Option<$t> {
            fn from_claim(raw: Option<&str>) -> Self {
                present(raw).and_then(<$t>::from_name)
            }
        }
    )*};
}

enum_claim!(PlanType, LicenseType);

// ─── Durations ───────────────────────────────────────────────────────

/// Render a duration as `[-][d.]hh:mm:ss[.fffffff]`.
pub fn format_duration(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let delta = delta.abs();
    let secs = delta.num_seconds();
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (h, m, s) = (rem / 3_600, rem % 3_600 / 60, rem % 60);
    let ticks = delta.subsec_nanos() / 100;

    let mut out = String::from(sign);
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{h:02}:{m:02}:{s:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

/// Parse `[-][d.]hh:mm:ss[.fffffff]`.
pub fn parse_duration(s: &str) -> Option<TimeDelta> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let mut parts = s.split(':');
    let (head, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (d.parse::<i64>().ok()?, h),
        None => (0, head),
    };
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    let (seconds, fraction) = match seconds.split_once('.') {
        Some((s, f)) => (s, Some(f)),
        None => (seconds, None),
    };
    let seconds: i64 = seconds.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }
    let nanos = match fraction {
        Some(f) if !f.is_empty() && f.len() <= 7 && f.bytes().all(|b| b.is_ascii_digit()) => {
            let ticks: i64 = format!("{f:0<7}").parse().ok()?;
            ticks * 100
        }
        Some(_) => return None,
        None => 0,
    };

    let total = TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(if negative { -total } else { total })
}

// ─── Reconstruction ──────────────────────────────────────────────────

/// Rebuild a license of `kind` from claims, best-effort.
///
/// Absent claims leave the default. `Signature` and `Token` are never read
/// from claims. The result is not signed and must not be trusted on its own.
pub fn license_from_claims(kind: LicenseKind, source: &impl ClaimsSource) -> License {
    match kind {
        LicenseKind::Organization => {
            License::Organization(reconstruct_with::<OrganizationLicense>(&ORGANIZATION_SCHEMA, source))
        }
        LicenseKind::User => License::User(reconstruct_with::<UserLicense>(&USER_SCHEMA, source)),
    }
}

fn reconstruct_with<L: Default + 'static>(
    schema: &LicenseSchema<L>,
    source: &impl ClaimsSource,
) -> L {
    let mut license = L::default();
    for spec in schema.fields.iter().filter(|f| f.exemption != Exemption::Always) {
        let Some(raw) = source.claim(spec.name) else {
            continue;
        };
        if (spec.set)(&mut license, claim_value(spec, raw)).is_none() {
            tracing::trace!(field = spec.name, "claim value out of range, keeping default");
        }
    }
    license
}

fn claim_value<L>(spec: &FieldSpec<L>, raw: &str) -> CanonicalValue {
    let raw = Some(raw);
    let absent = present(raw).is_none();
    match spec.ty {
        FieldType::Text => CanonicalValue::Text(String::from_claim(raw)),
        _ if absent && spec.nullable => CanonicalValue::Null,
        FieldType::Bool => CanonicalValue::Bool(bool::from_claim(raw)),
        FieldType::Int => CanonicalValue::Int(i64::from_claim(raw)),
        FieldType::Uuid => CanonicalValue::Uuid(Uuid::from_claim(raw)),
        FieldType::Timestamp => CanonicalValue::Timestamp(Timestamp::from_claim(raw)),
        FieldType::Plan => CanonicalValue::Int(PlanType::from_claim(raw).discriminant()),
        FieldType::Kind => CanonicalValue::Int(LicenseType::from_claim(raw) as i64),
    }
}
