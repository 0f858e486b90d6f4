use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use livery_core::model::{ResourceAssignment, ResourceRef};
use livery_core::window::TimeWindow;

use crate::db::schema;
use crate::error::DbError;

/// One row per binding; exactly one of the three resource columns is set.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::resource_assignment)]
#[diesel(check_for_backend(Pg))]
pub struct ResourceAssignmentRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub mission_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResourceAssignmentRow {
    fn resource(&self) -> Result<ResourceRef, DbError> {
        match (self.vehicle_id, self.venue_id, self.team_id) {
            (Some(id), None, None) => Ok(ResourceRef::Vehicle(id)),
            (None, Some(id), None) => Ok(ResourceRef::Venue(id)),
            (None, None, Some(id)) => Ok(ResourceRef::Team(id)),
            _ => Err(DbError::corrupt(
                "resource_assignment",
                self.id,
                "expected exactly one resource column",
            )),
        }
    }
}

impl From<&ResourceAssignment> for ResourceAssignmentRow {
    fn from(assignment: &ResourceAssignment) -> Self {
        let (vehicle_id, venue_id, team_id) = match assignment.resource {
            ResourceRef::Vehicle(id) => (Some(id), None, None),
            ResourceRef::Venue(id) => (None, Some(id), None),
            ResourceRef::Team(id) => (None, None, Some(id)),
        };
        Self {
            id: assignment.id,
            event_id: assignment.event_id,
            mission_id: assignment.mission_id,
            vehicle_id,
            venue_id,
            team_id,
            start_time: assignment.window.start(),
            end_time: assignment.window.end(),
            status: assignment.status.as_str().to_string(),
            notes: assignment.notes.clone(),
            created_at: assignment.created_at,
        }
    }
}

impl TryFrom<ResourceAssignmentRow> for ResourceAssignment {
    type Error = DbError;

    fn try_from(row: ResourceAssignmentRow) -> Result<Self, Self::Error> {
        let resource = row.resource()?;
        let corrupt = |reason: livery_core::error::CoreError| {
            DbError::corrupt("resource_assignment", row.id, reason)
        };
        Ok(Self {
            id: row.id,
            status: row.status.parse().map_err(corrupt)?,
            window: TimeWindow::new(row.start_time, row.end_time).map_err(corrupt)?,
            event_id: row.event_id,
            mission_id: row.mission_id,
            resource,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
