use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::assignment::ResourceAssignment;
use crate::model::event::Event;
use crate::model::mission::Mission;
use crate::model::participant::Participant;
use crate::model::ride::Ride;

/// An event with everything loaded beneath it.
///
/// `rides` holds only rides attached to one of `missions`; `assignments` holds
/// both event-level and mission-level bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubtree {
    pub event: Event,
    pub missions: Vec<Mission>,
    pub rides: Vec<Ride>,
    #[serde(rename = "resourceAssignments")]
    pub assignments: Vec<ResourceAssignment>,
    pub participants: Vec<Participant>,
}

impl EventSubtree {
    /// A freshly created event with no children.
    #[must_use]
    pub const fn bare(event: Event) -> Self {
        Self {
            event,
            missions: Vec::new(),
            rides: Vec::new(),
            assignments: Vec::new(),
            participants: Vec::new(),
        }
    }

    #[must_use]
    pub fn mission_ids(&self) -> Vec<Uuid> {
        self.missions.iter().map(|mission| mission.id).collect()
    }

    pub fn rides_of(&self, mission_id: Uuid) -> impl Iterator<Item = &Ride> {
        self.rides
            .iter()
            .filter(move |ride| ride.mission_id == Some(mission_id))
    }
}
