//! In-memory ride ledger using DashMap
//!
//! Insert-if-absent goes through DashMap's entry API, which holds the shard
//! lock for the key: of several concurrent writes to one ride ID exactly one
//! succeeds, while writes to different IDs proceed independently.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fareline_common::{FareBreakdown, FareError, Result};
use tracing::{debug, info, instrument, warn};

use super::{FareLedger, FareRecord};

/// In-memory ledger
#[derive(Debug, Default)]
pub struct RideLedger {
    records: DashMap<String, FareRecord>,
}

impl RideLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl FareLedger for RideLedger {
    #[instrument(skip(self, breakdown), fields(total = %breakdown.total))]
    fn record(&self, ride_id: &str, breakdown: FareBreakdown) -> Result<FareRecord> {
        if breakdown.ride_id != ride_id {
            return Err(FareError::invalid_request(format!(
                "breakdown belongs to ride {}, not {}",
                breakdown.ride_id, ride_id
            )));
        }

        match self.records.entry(ride_id.to_string()) {
            Entry::Occupied(_) => {
                warn!("Duplicate fare record refused");
                Err(FareError::DuplicateRide {
                    ride_id: ride_id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                let record = FareRecord::new(breakdown);
                slot.insert(record.clone());
                info!(record_id = %record.record_id, "Recorded fare");
                Ok(record)
            }
        }
    }

    fn lookup(&self, ride_id: &str) -> Option<FareRecord> {
        let found = self.records.get(ride_id).map(|entry| entry.value().clone());
        debug!(ride_id, hit = found.is_some(), "Ledger lookup");
        found
    }

    fn records(&self) -> Vec<FareRecord> {
        let mut records: Vec<_> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.ride_id().cmp(b.ride_id()));
        records
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
