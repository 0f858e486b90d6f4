//! PostgreSQL implementation of the storage collaborator.
//!
//! A [`PgTransaction`] owns a pooled connection with an open transaction. Event
//! locks are row locks (`SELECT ... FOR UPDATE`); resource locks are
//! transaction-scoped advisory locks keyed by [`ResourceRef::lock_key`]. Both
//! wait at most `lock_timeout`, set with `SET LOCAL` when the transaction opens.
//!
//! A transaction dropped before `commit` leaves its connection marked as in a
//! transaction, so the pool discards it and the server rolls it back.

use std::time::Duration;

use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use uuid::Uuid;

use livery_core::model::{
    Event, EventSubtree, Mission, Participant, PricingType, ResourceAssignment, ResourceRef, Ride,
};

use crate::change::{ChangeSet, Mutation};
use crate::db::connection::{DbConnection, DbPool};
use crate::db::query;
use crate::db::schema::{event, mission, participant, resource_assignment, ride, team, vehicle, venue};
use crate::error::{DbError, DbResult};
use crate::model::{EventRow, MissionRow, ParticipantRow, ResourceAssignmentRow, RideRow};
use crate::store::{Store, StoreTransaction};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    lock_timeout: Duration,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    #[must_use]
    pub const fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Store for PgStore {
    type Tx = PgTransaction;

    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> DbResult<PgTransaction> {
        let mut conn = self.pool.get_owned().await?;
        AnsiTransactionManager::begin_transaction(&mut *conn).await?;
        diesel::sql_query(format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *conn)
        .await?;

        tracing::trace!("Transaction started");
        Ok(PgTransaction { conn })
    }
}

pub struct PgTransaction {
    conn: DbConnection,
}

fn decode<R, T>(rows: Vec<R>) -> DbResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Single-row writes must hit their row.
fn expect_one(affected: usize) -> DbResult<()> {
    if affected == 0 {
        return Err(DbError::DatabaseError(diesel::result::Error::NotFound));
    }
    Ok(())
}

impl PgTransaction {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }

    async fn load_event(&mut self, event_id: Uuid) -> DbResult<Option<Event>> {
        query::event::by_id(event_id)
            .select(EventRow::as_select())
            .first::<EventRow>(self.conn())
            .await
            .optional()?
            .map(Event::try_from)
            .transpose()
    }

    async fn apply_one(&mut self, mutation: &Mutation) -> DbResult<()> {
        let now = Utc::now();
        let conn = self.conn();
        match mutation {
            Mutation::InsertEvent(row) => {
                diesel::insert_into(event::table)
                    .values(EventRow::from(row))
                    .execute(conn)
                    .await?;
            }
            Mutation::SetEventStatus { event_id, status } => {
                let affected = diesel::update(event::table.find(*event_id))
                    .set((event::status.eq(status.as_str()), event::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
                expect_one(affected)?;
            }
            Mutation::SetEventTotalFare {
                event_id,
                total_fare,
            } => {
                let affected = diesel::update(
                    event::table
                        .find(*event_id)
                        .filter(event::pricing_type.eq(PricingType::MissionBased.as_str())),
                )
                .set((event::total_fare.eq(Some(*total_fare)), event::updated_at.eq(now)))
                .execute(conn)
                .await?;
                expect_one(affected)?;
            }
            Mutation::DeleteEvent { event_id } => {
                diesel::delete(event::table.find(*event_id))
                    .execute(conn)
                    .await?;
            }

            Mutation::InsertMission(row) => {
                diesel::insert_into(mission::table)
                    .values(MissionRow::from(row))
                    .execute(conn)
                    .await?;
            }
            Mutation::UpdateMission(updated) => {
                let row = MissionRow::from(updated);
                let affected = diesel::update(mission::table.find(updated.id))
                    .set(&row)
                    .execute(conn)
                    .await?;
                expect_one(affected)?;
            }
            Mutation::SetMissionStatus { mission_id, status } => {
                let affected = diesel::update(mission::table.find(*mission_id))
                    .set((mission::status.eq(status.as_str()), mission::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
                expect_one(affected)?;
            }
            Mutation::SetMissionStatusForEvent { event_id, status } => {
                diesel::update(mission::table.filter(mission::event_id.eq(*event_id)))
                    .set((mission::status.eq(status.as_str()), mission::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
            }
            Mutation::DeleteMission { mission_id } => {
                diesel::delete(mission::table.find(*mission_id))
                    .execute(conn)
                    .await?;
            }
            Mutation::DeleteMissionsForEvent { event_id } => {
                diesel::delete(mission::table.filter(mission::event_id.eq(*event_id)))
                    .execute(conn)
                    .await?;
            }

            Mutation::InsertRide(row) => {
                diesel::insert_into(ride::table)
                    .values(RideRow::from(row))
                    .execute(conn)
                    .await?;
            }
            Mutation::SetRideStatus { ride_id, status } => {
                let affected = diesel::update(ride::table.find(*ride_id))
                    .set((ride::status.eq(status.as_str()), ride::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
                expect_one(affected)?;
            }
            Mutation::SetRideStatusForMissions {
                mission_ids,
                status,
            } => {
                diesel::update(ride::table.filter(ride::mission_id.eq_any(mission_ids.clone())))
                    .set((ride::status.eq(status.as_str()), ride::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
            }
            Mutation::DetachRides { mission_ids } => {
                diesel::update(ride::table.filter(ride::mission_id.eq_any(mission_ids.clone())))
                    .set((ride::mission_id.eq(None::<Uuid>), ride::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
            }

            Mutation::InsertParticipant(row) => {
                diesel::insert_into(participant::table)
                    .values(ParticipantRow::from(row))
                    .execute(conn)
                    .await?;
            }
            Mutation::DeleteParticipantsForEvent { event_id } => {
                diesel::delete(participant::table.filter(participant::event_id.eq(*event_id)))
                    .execute(conn)
                    .await?;
            }

            Mutation::InsertAssignment(row) => {
                diesel::insert_into(resource_assignment::table)
                    .values(ResourceAssignmentRow::from(row))
                    .execute(conn)
                    .await?;
            }
            Mutation::SetAssignmentStatus {
                assignment_ids,
                status,
            } => {
                diesel::update(
                    resource_assignment::table
                        .filter(resource_assignment::id.eq_any(assignment_ids.clone())),
                )
                .set(resource_assignment::status.eq(status.as_str()))
                .execute(conn)
                .await?;
            }
            Mutation::DeleteAssignmentsForEvent { event_id } => {
                diesel::delete(
                    resource_assignment::table.filter(resource_assignment::event_id.eq(*event_id)),
                )
                .execute(conn)
                .await?;
            }
            Mutation::DeleteAssignmentsForMission { mission_id } => {
                diesel::delete(
                    resource_assignment::table
                        .filter(resource_assignment::mission_id.eq(*mission_id)),
                )
                .execute(conn)
                .await?;
            }

            Mutation::RegisterResource { resource, name } => {
                register_resource(conn, *resource, name).await?;
            }
        }
        Ok(())
    }
}

async fn register_resource(
    conn: &mut AsyncPgConnection,
    resource: ResourceRef,
    name: &str,
) -> DbResult<()> {
    match resource {
        ResourceRef::Vehicle(id) => {
            diesel::insert_into(vehicle::table)
                .values((vehicle::id.eq(id), vehicle::name.eq(name)))
                .on_conflict(vehicle::id)
                .do_update()
                .set(vehicle::name.eq(name))
                .execute(conn)
                .await?;
        }
        ResourceRef::Venue(id) => {
            diesel::insert_into(venue::table)
                .values((venue::id.eq(id), venue::name.eq(name)))
                .on_conflict(venue::id)
                .do_update()
                .set(venue::name.eq(name))
                .execute(conn)
                .await?;
        }
        ResourceRef::Team(id) => {
            diesel::insert_into(team::table)
                .values((team::id.eq(id), team::name.eq(name)))
                .on_conflict(team::id)
                .do_update()
                .set(team::name.eq(name))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

impl StoreTransaction for PgTransaction {
    #[tracing::instrument(skip(self))]
    async fn lock_event(&mut self, event_id: Uuid) -> DbResult<bool> {
        let locked = event::table
            .find(event_id)
            .select(event::id)
            .for_update()
            .get_result::<Uuid>(self.conn())
            .await
            .optional()?;
        Ok(locked.is_some())
    }

    #[tracing::instrument(skip_all, fields(count = resources.len()))]
    async fn lock_resources(&mut self, resources: &[ResourceRef]) -> DbResult<()> {
        let mut ordered = resources.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        for resource in ordered {
            diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind::<Text, _>(resource.lock_key())
                .execute(self.conn())
                .await?;
        }
        Ok(())
    }

    async fn event(&mut self, event_id: Uuid) -> DbResult<Option<Event>> {
        self.load_event(event_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn event_subtree(&mut self, event_id: Uuid) -> DbResult<Option<EventSubtree>> {
        let Some(event) = self.load_event(event_id).await? else {
            return Ok(None);
        };

        let missions: Vec<Mission> = decode(
            query::mission::for_event(event_id)
                .select(MissionRow::as_select())
                .load::<MissionRow>(self.conn())
                .await?,
        )?;
        let mission_ids: Vec<Uuid> = missions.iter().map(|mission| mission.id).collect();

        let rides: Vec<Ride> = if mission_ids.is_empty() {
            Vec::new()
        } else {
            decode(
                query::ride::for_missions(&mission_ids)
                    .select(RideRow::as_select())
                    .load::<RideRow>(self.conn())
                    .await?,
            )?
        };
        let assignments: Vec<ResourceAssignment> = decode(
            query::assignment::for_event(event_id)
                .select(ResourceAssignmentRow::as_select())
                .load::<ResourceAssignmentRow>(self.conn())
                .await?,
        )?;
        let participants: Vec<Participant> = decode(
            query::participant::for_event(event_id)
                .select(ParticipantRow::as_select())
                .load::<ParticipantRow>(self.conn())
                .await?,
        )?;

        tracing::trace!(
            missions = missions.len(),
            rides = rides.len(),
            assignments = assignments.len(),
            "Loaded event subtree"
        );

        Ok(Some(EventSubtree {
            event,
            missions,
            rides,
            assignments,
            participants,
        }))
    }

    async fn mission(&mut self, mission_id: Uuid) -> DbResult<Option<Mission>> {
        query::mission::by_id(mission_id)
            .select(MissionRow::as_select())
            .first::<MissionRow>(self.conn())
            .await
            .optional()?
            .map(Mission::try_from)
            .transpose()
    }

    async fn ride(&mut self, ride_id: Uuid) -> DbResult<Option<Ride>> {
        query::ride::by_id(ride_id)
            .select(RideRow::as_select())
            .first::<RideRow>(self.conn())
            .await
            .optional()?
            .map(Ride::try_from)
            .transpose()
    }

    async fn assignment(&mut self, assignment_id: Uuid) -> DbResult<Option<ResourceAssignment>> {
        query::assignment::by_id(assignment_id)
            .select(ResourceAssignmentRow::as_select())
            .first::<ResourceAssignmentRow>(self.conn())
            .await
            .optional()?
            .map(ResourceAssignment::try_from)
            .transpose()
    }

    async fn assignments_for_resource(
        &mut self,
        resource: ResourceRef,
    ) -> DbResult<Vec<ResourceAssignment>> {
        decode(
            query::assignment::for_resource(resource)
                .select(ResourceAssignmentRow::as_select())
                .load::<ResourceAssignmentRow>(self.conn())
                .await?,
        )
    }

    async fn resource_exists(&mut self, resource: ResourceRef) -> DbResult<bool> {
        let conn = self.conn();
        let found = match resource {
            ResourceRef::Vehicle(id) => {
                diesel::select(exists(vehicle::table.find(id)))
                    .get_result::<bool>(conn)
                    .await?
            }
            ResourceRef::Venue(id) => {
                diesel::select(exists(venue::table.find(id)))
                    .get_result::<bool>(conn)
                    .await?
            }
            ResourceRef::Team(id) => {
                diesel::select(exists(team::table.find(id)))
                    .get_result::<bool>(conn)
                    .await?
            }
        };
        Ok(found)
    }

    #[tracing::instrument(skip_all, fields(mutations = changes.len()))]
    async fn apply(&mut self, changes: &ChangeSet) -> DbResult<()> {
        for mutation in changes.mutations() {
            self.apply_one(mutation).await?;
        }
        Ok(())
    }

    async fn commit(mut self) -> DbResult<()> {
        AnsiTransactionManager::commit_transaction(&mut *self.conn).await?;
        tracing::trace!("Transaction committed");
        Ok(())
    }

    async fn rollback(mut self) -> DbResult<()> {
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).await?;
        tracing::trace!("Transaction rolled back");
        Ok(())
    }
}
