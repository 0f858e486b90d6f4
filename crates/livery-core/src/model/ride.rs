use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::status::RideStatus;

/// A single passenger transport leg.
///
/// `mission_id` is a reference, not ownership: removing the mission detaches
/// the ride instead of deleting it, and booking-originated rides never have one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: Uuid,
    pub mission_id: Option<Uuid>,
    pub passenger_name: String,
    pub chauffeur_id: Option<Uuid>,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: Option<DateTime<Utc>>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub status: RideStatus,
    pub fare: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub mission_id: Option<Uuid>,
    pub passenger_name: String,
    pub chauffeur_id: Option<Uuid>,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: Option<DateTime<Utc>>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub fare: Option<Decimal>,
}

impl NewRide {
    /// ## Summary
    /// Validates the payload and builds a `SCHEDULED` ride.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` for missing addresses or passenger,
    /// or a drop-off before the pickup.
    pub fn into_ride(self, id: Uuid, now: DateTime<Utc>) -> CoreResult<Ride> {
        if self.passenger_name.trim().is_empty() {
            return Err(CoreError::ValidationError("passenger name is required".into()));
        }
        if self.pickup_address.trim().is_empty() || self.dropoff_address.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "pickup and drop-off addresses are required".into(),
            ));
        }
        if let Some(dropoff) = self.dropoff_time
            && dropoff < self.pickup_time
        {
            return Err(CoreError::ValidationError(
                "drop-off time precedes pickup time".into(),
            ));
        }

        Ok(Ride {
            id,
            mission_id: self.mission_id,
            passenger_name: self.passenger_name,
            chauffeur_id: self.chauffeur_id,
            pickup_time: self.pickup_time,
            dropoff_time: self.dropoff_time,
            pickup_address: self.pickup_address,
            dropoff_address: self.dropoff_address,
            status: RideStatus::Scheduled,
            fare: self.fare,
            created_at: now,
            updated_at: now,
        })
    }
}
