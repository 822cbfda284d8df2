//! Ride ledger
//!
//! Append-only record of finalized fares keyed by ride ID. The ledger is the
//! single owner of a fare once it is finalized; everything else refers to it
//! by ride ID.
//!
//! - [`FareLedger`]: storage seam
//! - [`RideLedger`]: in-memory implementation backed by DashMap

pub mod memory;

pub use memory::RideLedger;

use chrono::{DateTime, Utc};
use fareline_common::{FareBreakdown, Result, RideClassId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stored form of a finalized fare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareRecord {
    /// Ledger-assigned record ID
    pub record_id: Uuid,
    /// The fare, exactly as the engine produced it
    pub breakdown: FareBreakdown,
    pub recorded_at: DateTime<Utc>,
}

impl FareRecord {
    pub fn new(breakdown: FareBreakdown) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            breakdown,
            recorded_at: Utc::now(),
        }
    }

    pub fn ride_id(&self) -> &str {
        &self.breakdown.ride_id
    }
}

/// Append-only fare storage
pub trait FareLedger: Send + Sync {
    /// Store a fare. Fails with `DuplicateRide` if the ride already has one,
    /// leaving the stored record unchanged.
    fn record(&self, ride_id: &str, breakdown: FareBreakdown) -> Result<FareRecord>;

    /// Recorded fare of a ride
    fn lookup(&self, ride_id: &str) -> Option<FareRecord>;

    /// All records, sorted by ride ID
    fn records(&self) -> Vec<FareRecord>;

    /// Number of recorded rides
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of every recorded total
    fn total_fares(&self) -> Decimal {
        self.records().iter().map(|r| r.breakdown.total).sum()
    }

    /// Recorded totals per ride class
    fn totals_by_class(&self) -> BTreeMap<RideClassId, Decimal> {
        let mut totals = BTreeMap::new();
        for record in self.records() {
            *totals
                .entry(record.breakdown.ride_class.clone())
                .or_insert(Decimal::ZERO) += record.breakdown.total;
        }
        totals
    }
}
