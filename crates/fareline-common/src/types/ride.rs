//! Ride requests and ride-class identifiers
//!
//! A [`RideRequest`] is the immutable input to fare computation. Locations are
//! opaque descriptors here; geocoding happens upstream.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::error::{FareError, Result};

/// Named pricing tier (e.g. "standard", "premium")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideClassId(String);

impl RideClassId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers can never resolve
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for RideClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RideClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RideClassId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RideClassId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Request for fare computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRequest {
    /// Unique ride identifier
    pub ride_id: String,

    /// Pickup location descriptor
    pub pickup_location: String,

    /// Dropoff location descriptor
    pub dropoff_location: String,

    /// Trip distance in miles
    pub distance_miles: Decimal,

    /// Requested ride class
    pub ride_class: RideClassId,

    /// Request timestamp (drives surge pricing)
    pub requested_at: DateTime<Utc>,
}

impl RideRequest {
    /// Create a new ride request stamped with the current time
    pub fn new(
        ride_id: impl Into<String>,
        pickup_location: impl Into<String>,
        dropoff_location: impl Into<String>,
        distance_miles: Decimal,
        ride_class: impl Into<RideClassId>,
    ) -> Self {
        Self {
            ride_id: ride_id.into(),
            pickup_location: pickup_location.into(),
            dropoff_location: dropoff_location.into(),
            distance_miles,
            ride_class: ride_class.into(),
            requested_at: Utc::now(),
        }
    }

    /// Set the request timestamp
    pub fn at(mut self, requested_at: DateTime<Utc>) -> Self {
        self.requested_at = requested_at;
        self
    }

    /// Check the shape of the request.
    ///
    /// Distance must be non-negative and every identifier non-blank. Whether
    /// the ride class exists is the registry's concern, not this one.
    pub fn validate(&self) -> Result<()> {
        if self.ride_id.trim().is_empty() {
            return Err(FareError::invalid_request("ride_id must not be empty"));
        }
        if self.pickup_location.trim().is_empty() {
            return Err(FareError::invalid_request(format!(
                "ride {}: pickup_location must not be empty",
                self.ride_id
            )));
        }
        if self.dropoff_location.trim().is_empty() {
            return Err(FareError::invalid_request(format!(
                "ride {}: dropoff_location must not be empty",
                self.ride_id
            )));
        }
        if self.ride_class.is_blank() {
            return Err(FareError::invalid_request(format!(
                "ride {}: ride_class must not be empty",
                self.ride_id
            )));
        }
        if self.distance_miles < Decimal::ZERO {
            return Err(FareError::invalid_request(format!(
                "ride {}: distance must be non-negative, got {}",
                self.ride_id, self.distance_miles
            )));
        }
        Ok(())
    }
}
