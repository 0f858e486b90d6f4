use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::{Event, Pricing, PricingType};
use livery_core::window::TimeWindow;

use crate::db::schema;
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::event)]
#[diesel(check_for_backend(Pg))]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub client_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub location: Option<String>,
    pub pricing_type: String,
    pub fixed_price: Option<Decimal>,
    pub total_fare: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            client_id: event.client_id,
            start_date: event.window.start(),
            end_date: event.window.end(),
            status: event.status.as_str().to_string(),
            location: event.location.clone(),
            pricing_type: event.pricing_type().as_str().to_string(),
            fixed_price: event.pricing.fixed_price(),
            total_fare: event.pricing.total_fare(),
            notes: event.notes.clone(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: livery_core::error::CoreError| DbError::corrupt("event", row.id, reason);
        let pricing_type: PricingType = row.pricing_type.parse().map_err(corrupt)?;
        Ok(Self {
            id: row.id,
            status: row.status.parse().map_err(corrupt)?,
            window: TimeWindow::new(row.start_date, row.end_date).map_err(corrupt)?,
            pricing: Pricing::from_parts(pricing_type, row.fixed_price, row.total_fare)
                .map_err(corrupt)?,
            title: row.title,
            client_id: row.client_id,
            location: row.location,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
