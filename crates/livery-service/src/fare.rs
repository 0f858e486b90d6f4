//! Derived total fare of mission-based events.

use rust_decimal::Decimal;

use livery_core::model::{Event, Mission, Pricing};
use livery_core::money::{CURRENCY_SCALE, fits_column};
use livery_db::Mutation;

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Sums mission fares, counting a missing fare as zero.
///
/// The result has at least [`CURRENCY_SCALE`] fractional digits.
///
/// ## Errors
/// Returns `ServiceError::ValidationError` if the total does not fit a stored
/// amount.
pub fn sum_fares<'a>(missions: impl IntoIterator<Item = &'a Mission>) -> ServiceResult<Decimal> {
    let mut total = missions
        .into_iter()
        .filter_map(|mission| mission.fare)
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .filter(|total| fits_column(*total))
        .ok_or_else(|| {
            ServiceError::ValidationError(
                "total fare exceeds the largest storable amount".into(),
            )
        })?;
    if total.scale() < CURRENCY_SCALE {
        total.rescale(CURRENCY_SCALE);
    }
    Ok(total)
}

/// ## Summary
/// Recomputes the total fare of `event` from its missions.
///
/// Returns `None` for fixed-price events, whose price is never derived.
///
/// ## Errors
/// Fails as [`sum_fares`] does.
pub fn recompute(event: &Event, missions: &[Mission]) -> ServiceResult<Option<Decimal>> {
    match event.pricing {
        Pricing::MissionBased { .. } => sum_fares(missions).map(Some),
        Pricing::FixedPrice { .. } => Ok(None),
    }
}

/// ## Summary
/// Plans the write that brings the stored total in line with `missions`.
///
/// Returns `None` when the event is fixed-price or its total is already correct.
///
/// ## Errors
/// Fails as [`sum_fares`] does.
pub fn plan_update(
    event: &Event,
    missions: &[Mission],
) -> ServiceResult<Option<(Decimal, Mutation)>> {
    let Some(total) = recompute(event, missions)? else {
        return Ok(None);
    };
    if event.pricing.total_fare() == Some(total) {
        return Ok(None);
    }
    Ok(Some((
        total,
        Mutation::SetEventTotalFare {
            event_id: event.id,
            total_fare: total,
        },
    )))
}
