use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::Ride;

use crate::db::schema;
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::ride)]
#[diesel(check_for_backend(Pg))]
pub struct RideRow {
    pub id: Uuid,
    pub mission_id: Option<Uuid>,
    pub passenger_name: String,
    pub chauffeur_id: Option<Uuid>,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: Option<DateTime<Utc>>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub status: String,
    pub fare: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ride> for RideRow {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id,
            mission_id: ride.mission_id,
            passenger_name: ride.passenger_name.clone(),
            chauffeur_id: ride.chauffeur_id,
            pickup_time: ride.pickup_time,
            dropoff_time: ride.dropoff_time,
            pickup_address: ride.pickup_address.clone(),
            dropoff_address: ride.dropoff_address.clone(),
            status: ride.status.as_str().to_string(),
            fare: ride.fare,
            created_at: ride.created_at,
            updated_at: ride.updated_at,
        }
    }
}

impl TryFrom<RideRow> for Ride {
    type Error = DbError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row
                .status
                .parse()
                .map_err(|err| DbError::corrupt("ride", row.id, err))?,
            id: row.id,
            mission_id: row.mission_id,
            passenger_name: row.passenger_name,
            chauffeur_id: row.chauffeur_id,
            pickup_time: row.pickup_time,
            dropoff_time: row.dropoff_time,
            pickup_address: row.pickup_address,
            dropoff_address: row.dropoff_address,
            fare: row.fare,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
