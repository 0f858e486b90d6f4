use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::Mission;
use livery_core::window::TimeWindow;

use crate::db::schema;
use crate::error::DbError;

#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable, AsChangeset,
)]
#[diesel(table_name = schema::mission)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct MissionRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub fare: Option<Decimal>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Mission> for MissionRow {
    fn from(mission: &Mission) -> Self {
        Self {
            id: mission.id,
            event_id: mission.event_id,
            title: mission.title.clone(),
            description: mission.description.clone(),
            start_date: mission.window.start(),
            end_date: mission.window.end(),
            status: mission.status.as_str().to_string(),
            fare: mission.fare,
            location: mission.location.clone(),
            notes: mission.notes.clone(),
            created_at: mission.created_at,
            updated_at: mission.updated_at,
        }
    }
}

impl TryFrom<MissionRow> for Mission {
    type Error = DbError;

    fn try_from(row: MissionRow) -> Result<Self, Self::Error> {
        let corrupt =
            |reason: livery_core::error::CoreError| DbError::corrupt("mission", row.id, reason);
        Ok(Self {
            id: row.id,
            status: row.status.parse().map_err(corrupt)?,
            window: TimeWindow::new(row.start_date, row.end_date).map_err(corrupt)?,
            event_id: row.event_id,
            title: row.title,
            description: row.description,
            fare: row.fare,
            location: row.location,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
