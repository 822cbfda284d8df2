//! Fare policy evaluation
//!
//! Pure computation of a [`FareBreakdown`] from a ride request and a policy
//! snapshot. Nothing here reads the clock or shared state, so the same
//! inputs always produce the same breakdown.

use fareline_common::{round_currency, FareBreakdown, FareError, Result, RideRequest};

use super::registry::PolicyEntry;

/// Compute the fare of a ride under a policy snapshot.
///
/// ```text
/// DistanceComponent = Distance × PerMileRate
/// RawTotal          = BaseFee + DistanceComponent
/// Total             = round_half_up(RawTotal × Surge(requested_at), 2)
/// ```
pub fn compute_fare(request: &RideRequest, entry: &PolicyEntry) -> Result<FareBreakdown> {
    request.validate()?;

    let policy = &entry.policy;
    let distance_raw = request
        .distance_miles
        .checked_mul(policy.per_mile_rate)
        .ok_or_else(|| overflow(request))?;
    let raw_total = policy
        .base_fee
        .checked_add(distance_raw)
        .ok_or_else(|| overflow(request))?;

    let surge_multiplier = policy.surge_multiplier(request.requested_at)?;
    let total = round_currency(
        raw_total
            .checked_mul(surge_multiplier)
            .ok_or_else(|| overflow(request))?,
    );

    // Components are itemized at currency precision; whatever surge adds on
    // top of them is the adjustment, so the items always sum to the total.
    let base_fee = round_currency(policy.base_fee);
    let distance_component = round_currency(distance_raw);
    let surge_adjustment = total - base_fee - distance_component;

    Ok(FareBreakdown {
        ride_id: request.ride_id.clone(),
        ride_class: entry.ride_class.clone(),
        base_fee,
        distance_component,
        surge_multiplier,
        surge_adjustment,
        total,
        policy_version: entry.version,
    })
}

fn overflow(request: &RideRequest) -> FareError {
    FareError::invalid_request(format!("ride {}: fare calculation overflow", request.ride_id))
}
