use diesel::{pg::Pg, prelude::*};
use uuid::Uuid;

use livery_core::model::Participant;

use crate::db::schema;
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::participant)]
#[diesel(check_for_backend(Pg))]
pub struct ParticipantRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
}

impl From<&Participant> for ParticipantRow {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            event_id: participant.event_id,
            user_id: participant.user_id,
            role: participant.role.clone(),
            status: participant.status.as_str().to_string(),
        }
    }
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = DbError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row
                .status
                .parse()
                .map_err(|err| DbError::corrupt("participant", row.id, err))?,
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            role: row.role,
        })
    }
}
