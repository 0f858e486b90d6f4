use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::status::ParticipantStatus;

/// A person invited to an event. Carried opaquely apart from cloning and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: ParticipantStatus,
}
