//! Fare engine
//!
//! Drives each request through a fixed pipeline:
//!
//! ```text
//! Received -> Validated -> PolicyResolved -> Computed -> Finalized
//!     \__________\______________\______________\______-> Rejected
//! ```
//!
//! Computation is pure, so a rejection is permanent for that input. The
//! engine never retries; a corrected request is a new run.

use fareline_common::{FareBreakdown, Result, RideRequest};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::policy::compute_fare;
use super::registry::RideClassRegistry;
use crate::ledger::FareLedger;

/// Lifecycle stage of one fare request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareStage {
    Received,
    Validated,
    PolicyResolved,
    Computed,
    Finalized,
    Rejected,
}

impl FareStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FareStage::Finalized | FareStage::Rejected)
    }

    /// Whether the pipeline may move from this stage to `next`
    pub fn can_transition_to(&self, next: FareStage) -> bool {
        use FareStage::*;
        match (self, next) {
            (Received, Validated) => true,
            (Validated, PolicyResolved) => true,
            (PolicyResolved, Computed) => true,
            (Computed, Finalized) => true,
            (current, Rejected) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for FareStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FareStage::Received => write!(f, "received"),
            FareStage::Validated => write!(f, "validated"),
            FareStage::PolicyResolved => write!(f, "policy_resolved"),
            FareStage::Computed => write!(f, "computed"),
            FareStage::Finalized => write!(f, "finalized"),
            FareStage::Rejected => write!(f, "rejected"),
        }
    }
}

/// Tracks one request through the pipeline
struct FareRun<'a> {
    ride_id: &'a str,
    stage: FareStage,
}

impl<'a> FareRun<'a> {
    fn start(ride_id: &'a str) -> Self {
        debug!(ride_id, stage = %FareStage::Received, "Fare request received");
        Self {
            ride_id,
            stage: FareStage::Received,
        }
    }

    fn advance(&mut self, next: FareStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal fare stage transition {} -> {}",
            self.stage,
            next
        );
        debug!(ride_id = self.ride_id, from = %self.stage, to = %next, "Fare stage transition");
        self.stage = next;
    }

    /// Record the outcome of a step, moving to `Rejected` on failure
    fn check<T>(&mut self, step: Result<T>, next: FareStage) -> Result<T> {
        match step {
            Ok(value) => {
                self.advance(next);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    ride_id = self.ride_id,
                    stage = %self.stage,
                    code = err.code(),
                    error = %err,
                    "Fare request rejected"
                );
                self.advance(FareStage::Rejected);
                Err(err)
            }
        }
    }
}

/// Validates, prices and (optionally) records ride fares
#[derive(Clone)]
pub struct FareEngine {
    registry: Arc<RideClassRegistry>,
    ledger: Option<Arc<dyn FareLedger>>,
}

impl FareEngine {
    /// Create an engine over a registry, without a ledger
    pub fn new(registry: Arc<RideClassRegistry>) -> Self {
        Self {
            registry,
            ledger: None,
        }
    }

    /// Append every finalized fare to a ledger
    pub fn with_ledger(mut self, ledger: Arc<dyn FareLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn registry(&self) -> &Arc<RideClassRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> Option<&Arc<dyn FareLedger>> {
        self.ledger.as_ref()
    }

    /// Price a ride and append the result to the ledger, if one is attached
    #[instrument(skip(self, request), fields(ride_id = %request.ride_id, ride_class = %request.ride_class))]
    pub fn process(&self, request: &RideRequest) -> Result<FareBreakdown> {
        self.run(request, true)
    }

    /// Price a ride without recording it
    #[instrument(skip(self, request), fields(ride_id = %request.ride_id, ride_class = %request.ride_class))]
    pub fn quote(&self, request: &RideRequest) -> Result<FareBreakdown> {
        self.run(request, false)
    }

    fn run(&self, request: &RideRequest, record: bool) -> Result<FareBreakdown> {
        let mut run = FareRun::start(&request.ride_id);

        run.check(request.validate(), FareStage::Validated)?;
        let entry = run.check(
            self.registry.resolve(request.ride_class.as_str()),
            FareStage::PolicyResolved,
        )?;
        let fare = run.check(compute_fare(request, &entry), FareStage::Computed)?;

        let recorded = match (&self.ledger, record) {
            (Some(ledger), true) => ledger.record(&request.ride_id, fare.clone()).map(|_| ()),
            _ => Ok(()),
        };
        run.check(recorded, FareStage::Finalized)?;

        debug!(
            ride_id = %fare.ride_id,
            total = %fare.total,
            policy_version = fare.policy_version,
            "Fare finalized"
        );
        Ok(fare)
    }
}

impl std::fmt::Debug for FareEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FareEngine")
            .field("registry", &self.registry)
            .field("ledger", &self.ledger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RideLedger;
    use fareline_common::{FareError, RatePolicy};
    use rust_decimal_macros::dec;

    fn registry() -> Arc<RideClassRegistry> {
        Arc::new(
            RideClassRegistry::with_policies([
                ("standard".into(), RatePolicy::new(dec!(2.0), dec!(1.5))),
                ("premium".into(), RatePolicy::new(dec!(5.0), dec!(3.0))),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_stage_transitions() {
        use FareStage::*;

        assert!(Received.can_transition_to(Validated));
        assert!(Validated.can_transition_to(PolicyResolved));
        assert!(PolicyResolved.can_transition_to(Computed));
        assert!(Computed.can_transition_to(Finalized));
        assert!(Received.can_transition_to(Rejected));
        assert!(Computed.can_transition_to(Rejected));

        assert!(!Received.can_transition_to(Computed));
        assert!(!Finalized.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Validated));
        assert!(Finalized.is_terminal());
    }

    #[test]
    fn test_process_without_ledger() {
        let engine = FareEngine::new(registry());
        let request = RideRequest::new("R100", "Downtown", "Airport", dec!(10.5), "standard");

        let fare = engine.process(&request).unwrap();
        assert_eq!(fare.total, dec!(17.75));
        assert_eq!(fare.ride_class.as_str(), "standard");
    }

    #[test]
    fn test_process_records_to_ledger() {
        let ledger = Arc::new(RideLedger::new());
        let engine = FareEngine::new(registry()).with_ledger(ledger.clone());
        let request = RideRequest::new("R101", "Mall", "University", dec!(6.2), "premium");

        let fare = engine.process(&request).unwrap();
        let stored = ledger.lookup("R101").unwrap();
        assert_eq!(stored.breakdown, fare);

        // Second run of the same ride is refused and leaves the record alone
        let err = engine.process(&request).unwrap_err();
        assert_eq!(
            err,
            FareError::DuplicateRide {
                ride_id: "R101".to_string()
            }
        );
        assert_eq!(ledger.lookup("R101").unwrap().record_id, stored.record_id);
    }

    #[test]
    fn test_quote_does_not_record() {
        let ledger = Arc::new(RideLedger::new());
        let engine = FareEngine::new(registry()).with_ledger(ledger.clone());
        let request = RideRequest::new("R102", "Home", "Office", dec!(3.4), "standard");

        let quoted = engine.quote(&request).unwrap();
        assert!(ledger.lookup("R102").is_none());

        let processed = engine.process(&request).unwrap();
        assert_eq!(quoted, processed);
    }

    #[test]
    fn test_errors_surface_unchanged() {
        let engine = FareEngine::new(registry());

        let unknown = RideRequest::new("R200", "A", "B", dec!(1), "Lux");
        assert_eq!(
            engine.process(&unknown).unwrap_err(),
            FareError::UnknownRideClass {
                ride_class: "Lux".to_string()
            }
        );

        let negative = RideRequest::new("R201", "A", "B", dec!(-1), "standard");
        assert_eq!(engine.process(&negative).unwrap_err().code(), "invalid_request");
    }

    #[test]
    fn test_invalid_request_checked_before_class() {
        let engine = FareEngine::new(registry());
        let request = RideRequest::new("R202", "", "B", dec!(1), "Lux");
        assert_eq!(engine.process(&request).unwrap_err().code(), "invalid_request");
    }
}
