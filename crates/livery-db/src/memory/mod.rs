//! In-process store backed by ordered maps.
//!
//! One transaction runs at a time: `begin` waits on a store-wide mutex for at
//! most the configured lock timeout, so event and resource locks are implied.
//! Writes go to a private copy of the tables that replaces the shared tables on
//! commit. Referential checks mirror the PostgreSQL foreign keys so that a
//! cascade applied in the wrong order fails the same way on both backends.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use livery_core::error::CoreError;
use livery_core::model::{
    Event, EventSubtree, Mission, Participant, Pricing, ResourceAssignment, ResourceRef, Ride,
};

use crate::change::{ChangeSet, Mutation};
use crate::error::{DbError, DbResult};
use crate::store::{Store, StoreTransaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    events: BTreeMap<Uuid, Event>,
    missions: BTreeMap<Uuid, Mission>,
    rides: BTreeMap<Uuid, Ride>,
    participants: BTreeMap<Uuid, Participant>,
    assignments: BTreeMap<Uuid, ResourceAssignment>,
    resources: BTreeMap<ResourceRef, String>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    lock_timeout: Duration,
}

impl MemoryStore {
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            lock_timeout,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> DbResult<MemoryTransaction> {
        let guard = tokio::time::timeout(self.lock_timeout, Arc::clone(&self.tables).lock_owned())
            .await
            .map_err(|_| DbError::LockTimeout {
                what: "memory store".to_string(),
                waited_ms: u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX),
            })?;
        tracing::trace!("Memory transaction started");
        Ok(MemoryTransaction {
            guard,
            working: None,
        })
    }
}

/// Holds the store-wide lock until committed, rolled back or dropped.
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Option<Tables>,
}

impl MemoryTransaction {
    fn view(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.guard)
    }
}

impl StoreTransaction for MemoryTransaction {
    async fn lock_event(&mut self, event_id: Uuid) -> DbResult<bool> {
        Ok(self.view().events.contains_key(&event_id))
    }

    async fn lock_resources(&mut self, _resources: &[ResourceRef]) -> DbResult<()> {
        Ok(())
    }

    async fn event(&mut self, event_id: Uuid) -> DbResult<Option<Event>> {
        Ok(self.view().events.get(&event_id).cloned())
    }

    async fn event_subtree(&mut self, event_id: Uuid) -> DbResult<Option<EventSubtree>> {
        let tables = self.view();
        let Some(event) = tables.events.get(&event_id).cloned() else {
            return Ok(None);
        };

        let mut missions: Vec<Mission> = tables
            .missions
            .values()
            .filter(|mission| mission.event_id == event_id)
            .cloned()
            .collect();
        missions.sort_by_key(|mission| (mission.window.start(), mission.id));

        let rides = tables
            .rides
            .values()
            .filter(|ride| {
                ride.mission_id
                    .is_some_and(|mission_id| missions.iter().any(|m| m.id == mission_id))
            })
            .cloned()
            .collect();
        let assignments = tables
            .assignments
            .values()
            .filter(|assignment| assignment.event_id == event_id)
            .cloned()
            .collect();
        let participants = tables
            .participants
            .values()
            .filter(|participant| participant.event_id == event_id)
            .cloned()
            .collect();

        Ok(Some(EventSubtree {
            event,
            missions,
            rides,
            assignments,
            participants,
        }))
    }

    async fn mission(&mut self, mission_id: Uuid) -> DbResult<Option<Mission>> {
        Ok(self.view().missions.get(&mission_id).cloned())
    }

    async fn ride(&mut self, ride_id: Uuid) -> DbResult<Option<Ride>> {
        Ok(self.view().rides.get(&ride_id).cloned())
    }

    async fn assignment(&mut self, assignment_id: Uuid) -> DbResult<Option<ResourceAssignment>> {
        Ok(self.view().assignments.get(&assignment_id).cloned())
    }

    async fn assignments_for_resource(
        &mut self,
        resource: ResourceRef,
    ) -> DbResult<Vec<ResourceAssignment>> {
        Ok(self
            .view()
            .assignments
            .values()
            .filter(|assignment| assignment.resource == resource)
            .cloned()
            .collect())
    }

    async fn resource_exists(&mut self, resource: ResourceRef) -> DbResult<bool> {
        Ok(self.view().resources.contains_key(&resource))
    }

    async fn apply(&mut self, changes: &ChangeSet) -> DbResult<()> {
        let mut next = self.view().clone();
        for mutation in changes.mutations() {
            next.apply(mutation)?;
        }
        tracing::trace!(mutations = changes.len(), "Applied change set");
        self.working = Some(next);
        Ok(())
    }

    async fn commit(mut self) -> DbResult<()> {
        if let Some(working) = self.working.take() {
            *self.guard = working;
        }
        tracing::trace!("Memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        tracing::trace!("Memory transaction rolled back");
        Ok(())
    }
}

fn violation(kind: DatabaseErrorKind, message: String) -> DbError {
    DbError::DatabaseError(DieselError::DatabaseError(kind, Box::new(message)))
}

fn missing(table: &str, id: Uuid) -> DbError {
    violation(
        DatabaseErrorKind::ForeignKeyViolation,
        format!("{table} {id} does not exist"),
    )
}

fn still_referenced(table: &str, id: Uuid, by: &str) -> DbError {
    violation(
        DatabaseErrorKind::ForeignKeyViolation,
        format!("{table} {id} is still referenced from {by}"),
    )
}

fn insert_unique<V>(map: &mut BTreeMap<Uuid, V>, table: &str, id: Uuid, value: V) -> DbResult<()> {
    if map.contains_key(&id) {
        return Err(violation(
            DatabaseErrorKind::UniqueViolation,
            format!("duplicate {table} id {id}"),
        ));
    }
    map.insert(id, value);
    Ok(())
}

impl Tables {
    fn apply(&mut self, mutation: &Mutation) -> DbResult<()> {
        let now = Utc::now();
        match mutation {
            Mutation::InsertEvent(event) => {
                insert_unique(&mut self.events, "event", event.id, event.clone())?;
            }
            Mutation::SetEventStatus { event_id, status } => {
                let event = self.event_mut(*event_id)?;
                event.status = *status;
                event.updated_at = now;
            }
            Mutation::SetEventTotalFare {
                event_id,
                total_fare,
            } => {
                let event = self.event_mut(*event_id)?;
                let Pricing::MissionBased { total_fare: total } = &mut event.pricing else {
                    return Err(DbError::CoreError(CoreError::InvariantViolation(
                        "total fare written to a fixed-price event",
                    )));
                };
                *total = *total_fare;
                event.updated_at = now;
            }
            Mutation::DeleteEvent { event_id } => {
                if self.missions.values().any(|m| m.event_id == *event_id) {
                    return Err(still_referenced("event", *event_id, "mission"));
                }
                if self.assignments.values().any(|a| a.event_id == *event_id) {
                    return Err(still_referenced("event", *event_id, "resource_assignment"));
                }
                if self.participants.values().any(|p| p.event_id == *event_id) {
                    return Err(still_referenced("event", *event_id, "participant"));
                }
                self.events.remove(event_id);
            }

            Mutation::InsertMission(mission) => {
                if !self.events.contains_key(&mission.event_id) {
                    return Err(missing("event", mission.event_id));
                }
                insert_unique(&mut self.missions, "mission", mission.id, mission.clone())?;
            }
            Mutation::UpdateMission(mission) => {
                let stored = self.mission_mut(mission.id)?;
                *stored = mission.clone();
            }
            Mutation::SetMissionStatus { mission_id, status } => {
                let mission = self.mission_mut(*mission_id)?;
                mission.status = *status;
                mission.updated_at = now;
            }
            Mutation::SetMissionStatusForEvent { event_id, status } => {
                for mission in self
                    .missions
                    .values_mut()
                    .filter(|mission| mission.event_id == *event_id)
                {
                    mission.status = *status;
                    mission.updated_at = now;
                }
            }
            Mutation::DeleteMission { mission_id } => {
                self.delete_mission(*mission_id)?;
            }
            Mutation::DeleteMissionsForEvent { event_id } => {
                let ids: Vec<Uuid> = self
                    .missions
                    .values()
                    .filter(|mission| mission.event_id == *event_id)
                    .map(|mission| mission.id)
                    .collect();
                for mission_id in ids {
                    self.delete_mission(mission_id)?;
                }
            }

            Mutation::InsertRide(ride) => {
                if let Some(mission_id) = ride.mission_id
                    && !self.missions.contains_key(&mission_id)
                {
                    return Err(missing("mission", mission_id));
                }
                insert_unique(&mut self.rides, "ride", ride.id, ride.clone())?;
            }
            Mutation::SetRideStatus { ride_id, status } => {
                let ride = self
                    .rides
                    .get_mut(ride_id)
                    .ok_or(DbError::DatabaseError(DieselError::NotFound))?;
                ride.status = *status;
                ride.updated_at = now;
            }
            Mutation::SetRideStatusForMissions {
                mission_ids,
                status,
            } => {
                for ride in self.rides_of_mut(mission_ids) {
                    ride.status = *status;
                    ride.updated_at = now;
                }
            }
            Mutation::DetachRides { mission_ids } => {
                for ride in self.rides_of_mut(mission_ids) {
                    ride.mission_id = None;
                    ride.updated_at = now;
                }
            }

            Mutation::InsertParticipant(participant) => {
                if !self.events.contains_key(&participant.event_id) {
                    return Err(missing("event", participant.event_id));
                }
                insert_unique(
                    &mut self.participants,
                    "participant",
                    participant.id,
                    participant.clone(),
                )?;
            }
            Mutation::DeleteParticipantsForEvent { event_id } => {
                self.participants
                    .retain(|_, participant| participant.event_id != *event_id);
            }

            Mutation::InsertAssignment(assignment) => {
                if !self.events.contains_key(&assignment.event_id) {
                    return Err(missing("event", assignment.event_id));
                }
                if let Some(mission_id) = assignment.mission_id
                    && !self.missions.contains_key(&mission_id)
                {
                    return Err(missing("mission", mission_id));
                }
                if !self.resources.contains_key(&assignment.resource) {
                    return Err(missing(
                        assignment.resource.kind().as_str(),
                        assignment.resource.id(),
                    ));
                }
                insert_unique(
                    &mut self.assignments,
                    "resource_assignment",
                    assignment.id,
                    assignment.clone(),
                )?;
            }
            Mutation::SetAssignmentStatus {
                assignment_ids,
                status,
            } => {
                for assignment in self
                    .assignments
                    .values_mut()
                    .filter(|assignment| assignment_ids.contains(&assignment.id))
                {
                    assignment.status = *status;
                }
            }
            Mutation::DeleteAssignmentsForEvent { event_id } => {
                self.assignments
                    .retain(|_, assignment| assignment.event_id != *event_id);
            }
            Mutation::DeleteAssignmentsForMission { mission_id } => {
                self.assignments
                    .retain(|_, assignment| assignment.mission_id != Some(*mission_id));
            }

            Mutation::RegisterResource { resource, name } => {
                self.resources.insert(*resource, name.clone());
            }
        }
        Ok(())
    }

    fn event_mut(&mut self, event_id: Uuid) -> DbResult<&mut Event> {
        self.events
            .get_mut(&event_id)
            .ok_or(DbError::DatabaseError(DieselError::NotFound))
    }

    fn mission_mut(&mut self, mission_id: Uuid) -> DbResult<&mut Mission> {
        self.missions
            .get_mut(&mission_id)
            .ok_or(DbError::DatabaseError(DieselError::NotFound))
    }

    fn rides_of_mut<'a>(&'a mut self, mission_ids: &'a [Uuid]) -> impl Iterator<Item = &'a mut Ride> {
        self.rides.values_mut().filter(move |ride| {
            ride.mission_id
                .is_some_and(|mission_id| mission_ids.contains(&mission_id))
        })
    }

    fn delete_mission(&mut self, mission_id: Uuid) -> DbResult<()> {
        if self.rides.values().any(|r| r.mission_id == Some(mission_id)) {
            return Err(still_referenced("mission", mission_id, "ride"));
        }
        if self
            .assignments
            .values()
            .any(|a| a.mission_id == Some(mission_id))
        {
            return Err(still_referenced("mission", mission_id, "resource_assignment"));
        }
        self.missions.remove(&mission_id);
        Ok(())
    }
}
