//! # Fareline Pricing
//!
//! Ride-class registry, fare engine and ride ledger.
//!
//! ## Fare Formula
//!
//! ```text
//! Total = round_half_up((BaseFee + Distance × PerMileRate) × Surge(t), 2)
//! ```
//!
//! Where:
//! - BaseFee, PerMileRate: rate policy of the ride class, looked up by value
//! - Surge(t): time-dependent multiplier ≥ 1.0 (never a discount)
//!
//! Adding a ride class is a registration, not a code change.

pub mod config;
pub mod ledger;
pub mod pricing;

use fareline_common::{FareBreakdown, FareError, RatePolicy, Result, RideClassId, RideRequest};
use std::sync::Arc;
use tracing::info;

pub use config::{FarelineConfig, RateTable};
pub use ledger::{FareLedger, FareRecord, RideLedger};
pub use pricing::{FareEngine, FareStage, PolicyEntry, RegistrySnapshot, RideClassRegistry};

/// Ride class of the built-in standard tier
pub const STANDARD_CLASS: &str = "standard";

/// Ride class of the built-in premium tier
pub const PREMIUM_CLASS: &str = "premium";

/// Fareline service: the API an outer dispatch layer talks to
#[derive(Debug, Clone)]
pub struct FareService {
    registry: Arc<RideClassRegistry>,
    ledger: Option<Arc<RideLedger>>,
    engine: FareEngine,
}

impl FareService {
    /// Build a service over an injected registry
    pub fn new(registry: Arc<RideClassRegistry>, ledger: Option<Arc<RideLedger>>) -> Self {
        let mut engine = FareEngine::new(registry.clone());
        if let Some(ledger) = &ledger {
            engine = engine.with_ledger(ledger.clone());
        }

        Self {
            registry,
            ledger,
            engine,
        }
    }

    /// Build a service from configuration
    pub fn from_config(config: &FarelineConfig) -> Result<Self> {
        let table = config.rate_table()?;
        let registry = Arc::new(RideClassRegistry::with_policies(table.into_policies())?);
        let ledger = config.enable_ledger.then(|| Arc::new(RideLedger::new()));

        info!(
            classes = ?registry.classes(),
            ledger = config.enable_ledger,
            "Fare service initialized"
        );
        Ok(Self::new(registry, ledger))
    }

    /// Register or replace a ride class
    pub fn register_ride_class(
        &self,
        ride_class: impl Into<RideClassId>,
        policy: RatePolicy,
    ) -> Result<()> {
        self.registry.register(ride_class.into(), policy).map(|_| ())
    }

    /// Price a ride and record the result
    pub fn compute_fare(&self, request: &RideRequest) -> Result<FareBreakdown> {
        self.engine.process(request)
    }

    /// Price a ride without recording it
    pub fn quote(&self, request: &RideRequest) -> Result<FareBreakdown> {
        self.engine.quote(request)
    }

    /// Previously computed fare of a ride
    pub fn get_fare_record(&self, ride_id: &str) -> Result<FareBreakdown> {
        self.ledger
            .as_ref()
            .and_then(|ledger| ledger.lookup(ride_id))
            .map(|record| record.breakdown)
            .ok_or_else(|| FareError::NotFound {
                ride_id: ride_id.to_string(),
            })
    }

    pub fn registry(&self) -> &Arc<RideClassRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> Option<&Arc<RideLedger>> {
        self.ledger.as_ref()
    }
}
