//! # Expiration Policy
//!
//! Pure date arithmetic that decides when a freshly issued license expires,
//! when it should be refreshed, and the renewal deadline without the
//! self-host grace window. Nothing here reads a clock: `now` is an input,
//! so every rule is testable against fixed instants.
//!
//! ## Rules
//!
//! Fresh expiration:
//!
//! 1. No subscription: the entity's own expiration for a `Custom` plan that
//!    has one, otherwise `now + 7 days`.
//! 2. Trialing: the trial end.
//! 3. Entity expiration already passed: unchanged, never extended.
//! 4. Billing period over 180 days: period end plus the grace period.
//! 5. Otherwise: prior expiration plus 11 months, or `now + 1 year`.
//!
//! Fresh refresh collapses onto the expiration when there is no
//! subscription, during a trial, or once the entity has lapsed. Otherwise it
//! is `now + 30 days` for long billing periods or distant expirations, and
//! the expiration itself for anything closer.

use chrono::TimeDelta;
use entl_core::{TemporalError, Timestamp};
use serde::{Deserialize, Serialize};

use crate::plan::PlanType;

/// Provisional validity for an entity with no subscription.
pub const PROVISIONAL_PERIOD_DAYS: i64 = 7;
/// Billing periods longer than this are treated as annual.
pub const ANNUAL_PERIOD_THRESHOLD_DAYS: i64 = 180;
/// Distance of the next refresh for long-lived licenses.
pub const REFRESH_INTERVAL_DAYS: i64 = 30;
/// Extension applied to a prior expiration on short billing periods.
pub const MONTHLY_EXTENSION_MONTHS: u32 = 11;
/// Validity when a short billing period has no prior expiration.
pub const FALLBACK_VALIDITY_MONTHS: u32 = 12;
/// Default self-host grace period.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 60;

/// Billing state of an entity's subscription at issuance time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubscriptionSnapshot {
    /// Informational; whether the entity is trialing depends on `trial_end`.
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    pub period_start: Option<Timestamp>,
    pub period_end: Option<Timestamp>,
}

impl SubscriptionSnapshot {
    /// Length of the current billing period, if both ends are known.
    pub fn period_duration(&self) -> Option<TimeDelta> {
        Some(self.period_end?.since(&self.period_start?))
    }

    /// Whether the billing period is longer than 180 days.
    pub fn is_annual(&self) -> bool {
        self.period_duration()
            .zip(TimeDelta::try_days(ANNUAL_PERIOD_THRESHOLD_DAYS))
            .is_some_and(|(period, threshold)| period > threshold)
    }

    /// Whether the trial is still running at `now`: it ends strictly after.
    pub fn is_trialing(&self, now: Timestamp) -> bool {
        self.trial_end.is_some_and(|end| end > now)
    }
}

/// Everything the policy looks at, captured at one instant.
#[derive(Debug, Clone, Copy)]
pub struct ExpirationContext<'a> {
    pub now: Timestamp,
    pub plan_type: PlanType,
    /// The expiration currently stored on the entity.
    pub expiration: Option<Timestamp>,
    pub subscription: Option<&'a SubscriptionSnapshot>,
    pub grace_period_days: i64,
}

/// The three dates a fresh license carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDates {
    pub expires: Timestamp,
    pub refresh: Timestamp,
    pub expiration_without_grace_period: Timestamp,
}

impl ExpirationContext<'_> {
    /// Whether the subscription is in its trial window.
    pub fn is_trialing(&self) -> bool {
        self.subscription.is_some_and(|s| s.is_trialing(self.now))
    }

    /// Whether the stored expiration has already passed. An entity with no
    /// stored expiration has not lapsed.
    pub fn has_lapsed(&self) -> bool {
        self.expiration.is_some_and(|e| e < self.now)
    }

    /// Expiration for a license issued at `now`.
    pub fn fresh_expiration(&self) -> Result<Timestamp, TemporalError> {
        let Some(sub) = self.subscription else {
            return match self.expiration {
                Some(expiration) if self.plan_type == PlanType::Custom => Ok(expiration),
                _ => self.now.plus_days(PROVISIONAL_PERIOD_DAYS),
            };
        };

        if self.is_trialing() {
            if let Some(trial_end) = sub.trial_end {
                return Ok(trial_end);
            }
        }
        if let Some(expiration) = self.expiration.filter(|_| self.has_lapsed()) {
            return Ok(expiration);
        }
        if let Some(period_end) = sub.period_end.filter(|_| sub.is_annual()) {
            return period_end.plus_days(self.grace_period_days);
        }
        match self.expiration {
            Some(expiration) => expiration.plus_months(MONTHLY_EXTENSION_MONTHS),
            None => self.now.plus_months(FALLBACK_VALIDITY_MONTHS),
        }
    }

    /// Refresh date for a license issued at `now`.
    pub fn fresh_refresh(&self) -> Result<Timestamp, TemporalError> {
        let expires = self.fresh_expiration()?;
        self.refresh_for(expires)
    }

    fn refresh_for(&self, expires: Timestamp) -> Result<Timestamp, TemporalError> {
        let Some(sub) = self.subscription else {
            return Ok(expires);
        };
        if self.is_trialing() || self.has_lapsed() {
            return Ok(expires);
        }
        let interval = TimeDelta::try_days(REFRESH_INTERVAL_DAYS)
            .ok_or_else(|| TemporalError::OutOfRange("refresh interval".into()))?;
        if sub.is_annual() || expires.since(&self.now) > interval {
            self.now.plus(interval)
        } else {
            Ok(expires)
        }
    }

    /// The renewal deadline without the self-host grace period.
    pub fn fresh_expiration_without_grace(&self) -> Result<Timestamp, TemporalError> {
        let expires = self.fresh_expiration()?;
        Ok(self.without_grace_for(expires))
    }

    fn without_grace_for(&self, expires: Timestamp) -> Timestamp {
        match self.subscription {
            Some(sub) if !self.is_trialing() && !self.has_lapsed() && sub.is_annual() => {
                sub.period_end.unwrap_or(expires)
            }
            _ => expires,
        }
    }

    /// All three dates, computed from one fresh expiration.
    pub fn dates(&self) -> Result<LicenseDates, TemporalError> {
        let expires = self.fresh_expiration()?;
        Ok(LicenseDates {
            expires,
            refresh: self.refresh_for(expires)?,
            expiration_without_grace_period: self.without_grace_for(expires),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::parse("2026-03-01T12:00:00Z").unwrap()
    }

    fn days(n: i64) -> Timestamp {
        now().plus_days(n).unwrap()
    }

    fn ctx(sub: Option<&SubscriptionSnapshot>, expiration: Option<Timestamp>) -> ExpirationContext<'_> {
        ExpirationContext {
            now: now(),
            plan_type: PlanType::TeamsMonthly,
            expiration,
            subscription: sub,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }

    fn monthly() -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            period_start: Some(days(-10)),
            period_end: Some(days(20)),
            ..Default::default()
        }
    }

    #[test]
    fn test_custom_plan_keeps_its_expiration() {
        let mut c = ctx(None, Some(days(90)));
        c.plan_type = PlanType::Custom;
        assert_eq!(c.fresh_expiration().unwrap(), days(90));
        c.plan_type = PlanType::EnterpriseAnnually;
        assert_eq!(c.fresh_expiration().unwrap(), days(7));
    }

    #[test]
    fn test_custom_plan_without_expiration_is_provisional() {
        let mut c = ctx(None, None);
        c.plan_type = PlanType::Custom;
        assert_eq!(c.fresh_expiration().unwrap(), days(7));
        assert_eq!(c.fresh_refresh().unwrap(), days(7));
    }

    #[test]
    fn test_monthly_extends_prior_expiration_by_eleven_months() {
        let sub = monthly();
        let c = ctx(Some(&sub), Some(days(20)));
        let expected = days(20).plus_months(11).unwrap();
        assert_eq!(c.fresh_expiration().unwrap(), expected);
        // Far away, so refresh in 30 days.
        assert_eq!(c.fresh_refresh().unwrap(), days(30));
        assert_eq!(c.fresh_expiration_without_grace().unwrap(), expected);
    }

    #[test]
    fn test_monthly_without_prior_expiration_is_one_year() {
        let sub = monthly();
        let c = ctx(Some(&sub), None);
        assert_eq!(c.fresh_expiration().unwrap(), now().plus_months(12).unwrap());
    }

    #[test]
    fn test_refresh_at_expiration_when_close() {
        let sub = SubscriptionSnapshot {
            trial_start: Some(days(-30)),
            trial_end: Some(days(-1)),
            ..monthly()
        };
        let c = ExpirationContext {
            grace_period_days: 0,
            ..ctx(Some(&sub), None)
        };
        let expires = c.fresh_expiration().unwrap();
        let refresh = c.refresh_for(days(12)).unwrap();
        assert!(expires > days(300));
        assert_eq!(refresh, days(12));
    }

    #[test]
    fn test_trial_depends_on_end_only() {
        let sub = SubscriptionSnapshot {
            trial_start: Some(days(2)),
            trial_end: Some(days(16)),
            ..Default::default()
        };
        assert!(sub.is_trialing(now()));
        assert!(sub.is_trialing(days(3)));
        assert!(!sub.is_trialing(days(16)));
        assert!(!SubscriptionSnapshot::default().is_trialing(now()));

        let open_start = SubscriptionSnapshot {
            trial_end: Some(days(1)),
            ..Default::default()
        };
        assert!(open_start.is_trialing(now()));
    }

    #[test]
    fn test_period_helpers() {
        let annual = SubscriptionSnapshot {
            period_start: Some(days(-325)),
            period_end: Some(days(40)),
            ..Default::default()
        };
        assert_eq!(annual.period_duration(), TimeDelta::try_days(365));
        assert!(annual.is_annual());
        assert!(!monthly().is_annual());
        assert!(!SubscriptionSnapshot::default().is_annual());
    }

    #[test]
    fn test_dates_are_consistent_with_individual_rules() {
        let sub = monthly();
        let c = ctx(Some(&sub), Some(days(3)));
        let dates = c.dates().unwrap();
        assert_eq!(dates.expires, c.fresh_expiration().unwrap());
        assert_eq!(dates.refresh, c.fresh_refresh().unwrap());
        assert_eq!(
            dates.expiration_without_grace_period,
            c.fresh_expiration_without_grace().unwrap()
        );
    }
}
