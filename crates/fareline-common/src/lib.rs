//! # Fareline Common
//!
//! Shared types and errors for the Fareline fare-computation core.
//!
//! ## Core Types
//!
//! - [`RideRequest`]: immutable input to fare computation
//! - [`RatePolicy`]: base fee, per-mile rate and surge schedule of a ride class
//! - [`FareBreakdown`]: itemized, immutable fare result
//! - [`FareError`]: every failure the pricing core reports
//!
//! ## Fare Formula
//!
//! ```text
//! Total = round_half_up((BaseFee + Distance × PerMileRate) × Surge(t), 2)
//! ```

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{FailureResponse, FareError, Result};
pub use types::{
    fare::{round_currency, FareBreakdown},
    rate_policy::{CustomSurge, RatePolicy, SurgeFn, SurgeSchedule, SurgeWindow},
    ride::{RideClassId, RideRequest},
};

/// Fareline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decimal places of currency amounts
pub const CURRENCY_DECIMALS: u32 = 2;

/// Start of the reference week custom surge rules are probed over
/// (2024-01-01T00:00:00Z, a Monday)
pub const SURGE_PROBE_EPOCH: i64 = 1_704_067_200;

/// Hourly probes per custom surge rule (one week)
pub const SURGE_PROBE_HOURS: i64 = 7 * 24;
