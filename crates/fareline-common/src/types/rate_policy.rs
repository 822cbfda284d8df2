//! Rate policies and surge schedules
//!
//! A [`RatePolicy`] is the rate table of one ride class:
//!
//! ```text
//! Fare = round((BaseFee + Distance × PerMileRate) × Surge(t), 2)
//! ```
//!
//! Surge never discounts: every multiplier a policy can produce must be at
//! least 1.0, and policies that break this are refused at registration.

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{FareError, Result};
use crate::{CURRENCY_DECIMALS, SURGE_PROBE_EPOCH, SURGE_PROBE_HOURS};

/// Surge rule supplied as code
pub type SurgeFn = Arc<dyn Fn(DateTime<Utc>) -> Decimal + Send + Sync>;

/// Time-of-day surge window (UTC hours)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeWindow {
    /// First hour covered (0-23)
    pub start_hour: u32,
    /// Hour the window ends, exclusive (1-24). Smaller than `start_hour`
    /// when the window wraps midnight.
    pub end_hour: u32,
    /// Multiplier applied inside the window
    pub multiplier: Decimal,
}

impl SurgeWindow {
    pub fn new(start_hour: u32, end_hour: u32, multiplier: Decimal) -> Self {
        Self {
            start_hour,
            end_hour,
            multiplier,
        }
    }

    /// Whether the given hour of day falls inside the window
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    fn validate(&self) -> Result<()> {
        if self.start_hour > 23 || self.end_hour > 24 {
            return Err(FareError::invalid_policy(format!(
                "surge window hours out of range: {}-{}",
                self.start_hour, self.end_hour
            )));
        }
        if self.start_hour == self.end_hour {
            return Err(FareError::invalid_policy(format!(
                "surge window {}-{} is empty",
                self.start_hour, self.end_hour
            )));
        }
        check_multiplier(self.multiplier)
    }
}

/// Custom surge rule with a name for logs and debugging
#[derive(Clone)]
pub struct CustomSurge {
    pub name: String,
    pub rule: SurgeFn,
}

impl std::fmt::Debug for CustomSurge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomSurge")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Surge multiplier as a function of request time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurgeSchedule {
    /// No surge (multiplier 1.0)
    #[default]
    Off,
    /// Constant multiplier
    Flat { multiplier: Decimal },
    /// Time-of-day windows; the highest matching multiplier wins
    Windows { windows: Vec<SurgeWindow> },
    /// Arbitrary rule; cannot be serialized
    #[serde(skip)]
    Custom(CustomSurge),
}

impl SurgeSchedule {
    pub fn flat(multiplier: Decimal) -> Self {
        SurgeSchedule::Flat { multiplier }
    }

    pub fn windows(windows: Vec<SurgeWindow>) -> Self {
        SurgeSchedule::Windows { windows }
    }

    pub fn custom<F>(name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(DateTime<Utc>) -> Decimal + Send + Sync + 'static,
    {
        SurgeSchedule::Custom(CustomSurge {
            name: name.into(),
            rule: Arc::new(rule),
        })
    }

    /// Raw multiplier at the given time, unchecked
    pub fn multiplier_at(&self, at: DateTime<Utc>) -> Decimal {
        match self {
            SurgeSchedule::Off => Decimal::ONE,
            SurgeSchedule::Flat { multiplier } => *multiplier,
            SurgeSchedule::Windows { windows } => {
                let hour = at.hour();
                windows
                    .iter()
                    .filter(|w| w.contains(hour))
                    .map(|w| w.multiplier)
                    .fold(Decimal::ONE, Decimal::max)
            }
            SurgeSchedule::Custom(custom) => (custom.rule)(at),
        }
    }

    /// Reject schedules that could discount below base pricing.
    ///
    /// Declarative schedules are checked exhaustively. Custom rules are
    /// probed at every hour of a reference week.
    pub fn validate(&self) -> Result<()> {
        match self {
            SurgeSchedule::Off => Ok(()),
            SurgeSchedule::Flat { multiplier } => check_multiplier(*multiplier),
            SurgeSchedule::Windows { windows } => windows.iter().try_for_each(SurgeWindow::validate),
            SurgeSchedule::Custom(custom) => {
                let epoch = DateTime::<Utc>::from_timestamp(SURGE_PROBE_EPOCH, 0)
                    .ok_or_else(|| FareError::invalid_policy("surge probe epoch out of range"))?;
                (0..SURGE_PROBE_HOURS).try_for_each(|hour| {
                    let at = epoch + Duration::hours(hour);
                    check_multiplier((custom.rule)(at)).map_err(|_| {
                        FareError::invalid_policy(format!(
                            "custom surge '{}' returned {} at {}",
                            custom.name,
                            (custom.rule)(at),
                            at.to_rfc3339()
                        ))
                    })
                })
            }
        }
    }
}

impl PartialEq for SurgeSchedule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SurgeSchedule::Off, SurgeSchedule::Off) => true,
            (SurgeSchedule::Flat { multiplier: a }, SurgeSchedule::Flat { multiplier: b }) => a == b,
            (SurgeSchedule::Windows { windows: a }, SurgeSchedule::Windows { windows: b }) => a == b,
            (SurgeSchedule::Custom(a), SurgeSchedule::Custom(b)) => Arc::ptr_eq(&a.rule, &b.rule),
            _ => false,
        }
    }
}

fn check_multiplier(multiplier: Decimal) -> Result<()> {
    if multiplier < Decimal::ONE {
        return Err(FareError::invalid_policy(format!(
            "surge multiplier {} is below 1.0",
            multiplier
        )));
    }
    Ok(())
}

/// Rate table of a single ride class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePolicy {
    /// Flat fee charged on every ride
    pub base_fee: Decimal,
    /// Charge per mile travelled
    pub per_mile_rate: Decimal,
    /// Time-dependent surge
    #[serde(default)]
    pub surge: SurgeSchedule,
}

impl RatePolicy {
    pub fn new(base_fee: Decimal, per_mile_rate: Decimal) -> Self {
        Self {
            base_fee,
            per_mile_rate,
            surge: SurgeSchedule::Off,
        }
    }

    /// Flat-rate class: the base fee regardless of distance
    pub fn flat(base_fee: Decimal) -> Self {
        Self::new(base_fee, Decimal::ZERO)
    }

    pub fn with_surge(mut self, surge: SurgeSchedule) -> Self {
        self.surge = surge;
        self
    }

    /// Validate the policy before it enters a registry
    pub fn validate(&self) -> Result<()> {
        if self.base_fee < Decimal::ZERO {
            return Err(FareError::invalid_policy(format!(
                "base fee must be non-negative, got {}",
                self.base_fee
            )));
        }
        if self.base_fee.normalize().scale() > CURRENCY_DECIMALS {
            return Err(FareError::invalid_policy(format!(
                "base fee {} has more than {} decimal places",
                self.base_fee, CURRENCY_DECIMALS
            )));
        }
        if self.per_mile_rate < Decimal::ZERO {
            return Err(FareError::invalid_policy(format!(
                "per-mile rate must be non-negative, got {}",
                self.per_mile_rate
            )));
        }
        self.surge.validate()
    }

    /// Checked surge multiplier for a request time
    pub fn surge_multiplier(&self, at: DateTime<Utc>) -> Result<Decimal> {
        let multiplier = self.surge.multiplier_at(at);
        check_multiplier(multiplier)?;
        Ok(multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_policy_validation() {
        assert!(RatePolicy::new(dec!(2.0), dec!(1.5)).validate().is_ok());
        assert!(RatePolicy::flat(dec!(4.50)).validate().is_ok());
        assert!(RatePolicy::new(dec!(0), dec!(0)).validate().is_ok());

        assert!(RatePolicy::new(dec!(-1), dec!(1.5)).validate().is_err());
        assert!(RatePolicy::new(dec!(2), dec!(-0.5)).validate().is_err());
        assert!(RatePolicy::new(dec!(2.005), dec!(1.5)).validate().is_err());
        // Trailing zeros are not extra precision
        assert!(RatePolicy::new(dec!(2.000), dec!(1.5)).validate().is_ok());
    }

    #[test]
    fn test_flat_surge_below_one_rejected() {
        let policy = RatePolicy::new(dec!(2), dec!(1.5)).with_surge(SurgeSchedule::flat(dec!(0.5)));
        let err = policy.validate().unwrap_err();
        assert_eq!(err.code(), "invalid_policy");
    }

    #[test]
    fn test_custom_surge_probed() {
        let discounting = SurgeSchedule::custom("half-price", |_| dec!(0.5));
        assert!(discounting.validate().is_err());

        // Only discounts at 3am: still caught by the hourly probe
        let sneaky = SurgeSchedule::custom("night-discount", |at| {
            if at.hour() == 3 {
                dec!(0.9)
            } else {
                dec!(1.2)
            }
        });
        assert!(sneaky.validate().is_err());

        let honest = SurgeSchedule::custom("weekend", |_| dec!(1.3));
        assert!(honest.validate().is_ok());
    }

    #[test]
    fn test_window_multiplier() {
        let schedule = SurgeSchedule::windows(vec![
            SurgeWindow::new(7, 10, dec!(1.5)),
            SurgeWindow::new(9, 11, dec!(1.8)),
            SurgeWindow::new(22, 2, dec!(1.25)),
        ]);
        assert!(schedule.validate().is_ok());

        assert_eq!(schedule.multiplier_at(at_hour(6)), dec!(1));
        assert_eq!(schedule.multiplier_at(at_hour(7)), dec!(1.5));
        // Overlap takes the highest multiplier
        assert_eq!(schedule.multiplier_at(at_hour(9)), dec!(1.8));
        assert_eq!(schedule.multiplier_at(at_hour(10)), dec!(1.8));
        assert_eq!(schedule.multiplier_at(at_hour(11)), dec!(1));
        // Wraps midnight
        assert_eq!(schedule.multiplier_at(at_hour(23)), dec!(1.25));
        assert_eq!(schedule.multiplier_at(at_hour(1)), dec!(1.25));
        assert_eq!(schedule.multiplier_at(at_hour(2)), dec!(1));
    }

    #[test]
    fn test_invalid_windows() {
        let empty = SurgeSchedule::windows(vec![SurgeWindow::new(5, 5, dec!(1.5))]);
        assert!(empty.validate().is_err());

        let out_of_range = SurgeSchedule::windows(vec![SurgeWindow::new(24, 2, dec!(1.5))]);
        assert!(out_of_range.validate().is_err());

        let discount = SurgeSchedule::windows(vec![SurgeWindow::new(1, 4, dec!(0.8))]);
        assert!(discount.validate().is_err());
    }

    #[test]
    fn test_policy_json() {
        let policy = RatePolicy::new(dec!(5.0), dec!(3.0)).with_surge(SurgeSchedule::flat(dec!(1.2)));
        let json = serde_json::to_string(&policy).unwrap();
        let parsed: RatePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);

        let without_surge: RatePolicy =
            serde_json::from_str(r#"{"base_fee": "2.0", "per_mile_rate": "1.5"}"#).unwrap();
        assert_eq!(without_surge.surge, SurgeSchedule::Off);
    }

    #[test]
    fn test_custom_surge_not_serializable() {
        let policy = RatePolicy::new(dec!(2), dec!(1)).with_surge(SurgeSchedule::custom("x", |_| dec!(1)));
        assert!(serde_json::to_string(&policy).is_err());
    }
}
