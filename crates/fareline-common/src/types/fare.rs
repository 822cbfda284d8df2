//! Fare breakdowns
//!
//! A [`FareBreakdown`] itemizes a computed fare. Its components always add up
//! to the total:
//!
//! ```text
//! Total = BaseFee + DistanceComponent + SurgeAdjustment
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ride::RideClassId;
use crate::CURRENCY_DECIMALS;

/// Round to currency precision, half-up, at a fixed scale.
///
/// Amounts in the pricing core are never negative, so rounding midpoints
/// away from zero is the same as rounding them up. The result always
/// carries exactly `CURRENCY_DECIMALS` places, so equal amounts encode
/// identically ("23.00", never "23" or "23.0").
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_DECIMALS);
    rounded
}

/// Immutable itemized fare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareBreakdown {
    /// Ride this fare belongs to
    pub ride_id: String,

    /// Ride class that priced it
    pub ride_class: RideClassId,

    /// Base fee applied
    pub base_fee: Decimal,

    /// Distance × per-mile rate, at currency precision
    pub distance_component: Decimal,

    /// Surge multiplier in effect at request time
    pub surge_multiplier: Decimal,

    /// Amount added by surge (zero without surge)
    pub surge_adjustment: Decimal,

    /// Final fare
    pub total: Decimal,

    /// Registry version of the policy snapshot used (for audit)
    pub policy_version: u64,
}

impl FareBreakdown {
    /// Sum of the itemized components
    pub fn components_total(&self) -> Decimal {
        self.base_fee + self.distance_component + self.surge_adjustment
    }

    pub fn has_surge(&self) -> bool {
        self.surge_multiplier > Decimal::ONE
    }

    /// BLAKE3 digest of the canonical JSON encoding.
    ///
    /// Lets a downstream store prove a fare was not altered after it left
    /// the engine.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

impl std::fmt::Display for FareBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] base ${:.2} + distance ${:.2} + surge ${:.2} (x{}) = ${:.2}",
            self.ride_id,
            self.ride_class,
            self.base_fee,
            self.distance_component,
            self.surge_adjustment,
            self.surge_multiplier.normalize(),
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> FareBreakdown {
        FareBreakdown {
            ride_id: "R100".to_string(),
            ride_class: RideClassId::new("standard"),
            base_fee: dec!(2.0),
            distance_component: dec!(15.75),
            surge_multiplier: dec!(1),
            surge_adjustment: dec!(0),
            total: dec!(17.75),
            policy_version: 1,
        }
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_currency(dec!(4.995)), dec!(5.00));
        assert_eq!(round_currency(dec!(4.994)), dec!(4.99));
        assert_eq!(round_currency(dec!(0.125)), dec!(0.13));
        assert_eq!(round_currency(dec!(17.75)), dec!(17.75));
    }

    #[test]
    fn test_round_fixed_scale() {
        assert_eq!(round_currency(dec!(23)).to_string(), "23.00");
        assert_eq!(round_currency(dec!(23.0)).to_string(), "23.00");
        assert_eq!(round_currency(dec!(23.6)).to_string(), "23.60");
        assert_eq!(round_currency(dec!(0.125)).to_string(), "0.13");
    }

    #[test]
    fn test_components_add_up() {
        let fare = sample();
        assert_eq!(fare.components_total(), fare.total);
        assert!(!fare.has_surge());
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let mut altered = sample();
        altered.total = dec!(17.76);
        assert_ne!(a.fingerprint().unwrap(), altered.fingerprint().unwrap());
    }

    #[test]
    fn test_display() {
        let line = sample().to_string();
        assert!(line.starts_with("R100 [standard]"));
        assert!(line.ends_with("= $17.75"));
    }
}
