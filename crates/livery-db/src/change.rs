//! Batched writes applied inside a single transaction.
//!
//! Planning code builds a [`ChangeSet`] from an in-memory subtree and hands it
//! to [`StoreTransaction::apply`](crate::store::StoreTransaction::apply) in one
//! call. Bulk mutations address children through their parent ids so a cascade
//! is one statement per level rather than one per row.

use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::{
    AssignmentStatus, Event, EventStatus, Mission, MissionStatus, Participant, ResourceAssignment,
    ResourceRef, Ride, RideStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    InsertEvent(Event),
    SetEventStatus {
        event_id: Uuid,
        status: EventStatus,
    },
    SetEventTotalFare {
        event_id: Uuid,
        total_fare: Decimal,
    },
    DeleteEvent {
        event_id: Uuid,
    },

    InsertMission(Mission),
    UpdateMission(Mission),
    SetMissionStatus {
        mission_id: Uuid,
        status: MissionStatus,
    },
    /// Every mission of the event, whatever its current status.
    SetMissionStatusForEvent {
        event_id: Uuid,
        status: MissionStatus,
    },
    DeleteMission {
        mission_id: Uuid,
    },
    DeleteMissionsForEvent {
        event_id: Uuid,
    },

    InsertRide(Ride),
    SetRideStatus {
        ride_id: Uuid,
        status: RideStatus,
    },
    /// Every ride whose `mission_id` is one of `mission_ids`.
    SetRideStatusForMissions {
        mission_ids: Vec<Uuid>,
        status: RideStatus,
    },
    /// Clears `mission_id` on every ride attached to one of `mission_ids`.
    DetachRides {
        mission_ids: Vec<Uuid>,
    },

    InsertParticipant(Participant),
    DeleteParticipantsForEvent {
        event_id: Uuid,
    },

    InsertAssignment(ResourceAssignment),
    SetAssignmentStatus {
        assignment_ids: Vec<Uuid>,
        status: AssignmentStatus,
    },
    /// Event-level and mission-level assignments of the event.
    DeleteAssignmentsForEvent {
        event_id: Uuid,
    },
    DeleteAssignmentsForMission {
        mission_id: Uuid,
    },

    RegisterResource {
        resource: ResourceRef,
        name: String,
    },
}

/// Ordered list of mutations; applied front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn extend(&mut self, other: Self) -> &mut Self {
        self.mutations.extend(other.mutations);
        self
    }

    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

impl From<Vec<Mutation>> for ChangeSet {
    fn from(mutations: Vec<Mutation>) -> Self {
        Self { mutations }
    }
}

impl IntoIterator for ChangeSet {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}
