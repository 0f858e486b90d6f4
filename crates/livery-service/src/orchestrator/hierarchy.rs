use chrono::Utc;
use uuid::Uuid;

use livery_core::model::{
    Event, Mission, MissionStatus, MissionUpdate, NewEvent, NewMission, NewRide, Ride, RideStatus,
};
use livery_db::{ChangeSet, Mutation, Store, StoreTransaction};

use super::EventEngine;
use crate::error::{ServiceError, ServiceResult};
use crate::{fare, lifecycle};

impl<S: Store> EventEngine<S> {
    /// ## Summary
    /// Stores a new `PLANNED` event.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for a blank title, an inverted
    /// window or a missing fixed price, before any transaction is opened.
    #[tracing::instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create_event(&self, new: NewEvent) -> ServiceResult<Event> {
        let event = new.into_event(Uuid::now_v7(), Utc::now())?;
        self.run("create_event", || self.create_event_once(&event))
            .await?;
        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    async fn create_event_once(&self, event: &Event) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.apply(&ChangeSet::from(vec![Mutation::InsertEvent(event.clone())]))
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// ## Summary
    /// Adds a mission to an open event and refreshes a mission-based total fare.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for malformed fields or a total
    /// fare that would not fit a stored amount,
    /// `ServiceError::NotFound` for an unknown event and
    /// `ServiceError::InvalidTransition` if the event is cancelled or completed.
    #[tracing::instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create_mission(&self, event_id: Uuid, new: NewMission) -> ServiceResult<Mission> {
        let mission = new.into_mission(Uuid::now_v7(), event_id, Utc::now())?;
        self.run("create_mission", || self.create_mission_once(&mission))
            .await?;
        Ok(mission)
    }

    async fn create_mission_once(&self, mission: &Mission) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let event_id = mission.event_id;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        lifecycle::ensure_open(&subtree.event)?;

        let mut changes = ChangeSet::new();
        changes.push(Mutation::InsertMission(mission.clone()));
        let mut missions = subtree.missions;
        missions.push(mission.clone());
        push_fare_update(&mut changes, &subtree.event, &missions)?;

        tx.apply(&changes).await?;
        tx.commit().await?;
        Ok(())
    }

    /// ## Summary
    /// Edits a mission of an open event; a fare change refreshes the event total.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown mission,
    /// `ServiceError::InvalidTransition` under a terminal event and
    /// `ServiceError::ValidationError` if the edited window is inverted, the
    /// fare is not a storable amount or the new total would not be.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_mission(
        &self,
        mission_id: Uuid,
        update: MissionUpdate,
    ) -> ServiceResult<Mission> {
        update.validate()?;
        self.run("update_mission", || {
            self.update_mission_once(mission_id, update.clone())
        })
        .await
    }

    async fn update_mission_once(
        &self,
        mission_id: Uuid,
        update: MissionUpdate,
    ) -> ServiceResult<Mission> {
        let mut tx = self.store.begin().await?;
        let event_id = tx
            .mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?
            .event_id;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        lifecycle::ensure_open(&subtree.event)?;

        let mut missions = subtree.missions;
        let mission = missions
            .iter_mut()
            .find(|mission| mission.id == mission_id)
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?;
        let touches_fare = update.touches_fare();
        update.apply_to(mission, Utc::now())?;
        let updated = mission.clone();

        let mut changes = ChangeSet::new();
        changes.push(Mutation::UpdateMission(updated.clone()));
        if touches_fare {
            push_fare_update(&mut changes, &subtree.event, &missions)?;
        }
        tx.apply(&changes).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// ## Summary
    /// Removes a mission of an open event.
    ///
    /// Its rides are detached and kept; its assignments are deleted.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown mission and
    /// `ServiceError::InvalidTransition` under a terminal event.
    #[tracing::instrument(skip(self))]
    pub async fn delete_mission(&self, mission_id: Uuid) -> ServiceResult<()> {
        self.run("delete_mission", move || self.delete_mission_once(mission_id))
            .await
    }

    async fn delete_mission_once(&self, mission_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let event_id = tx
            .mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?
            .event_id;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let subtree = tx
            .event_subtree(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        lifecycle::ensure_open(&subtree.event)?;

        let mut missions = subtree.missions;
        let before = missions.len();
        missions.retain(|mission| mission.id != mission_id);
        if missions.len() == before {
            return Err(ServiceError::not_found("mission", mission_id));
        }

        let mut changes = ChangeSet::new();
        changes
            .push(Mutation::DetachRides {
                mission_ids: vec![mission_id],
            })
            .push(Mutation::DeleteAssignmentsForMission { mission_id })
            .push(Mutation::DeleteMission { mission_id });
        push_fare_update(&mut changes, &subtree.event, &missions)?;

        tx.apply(&changes).await?;
        tx.commit().await?;
        Ok(())
    }

    /// ## Summary
    /// Stores a new `SCHEDULED` ride, attached to a mission or standalone.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for malformed fields,
    /// `ServiceError::NotFound` for an unknown mission and
    /// `ServiceError::InvalidTransition` if the mission's event is terminal.
    #[tracing::instrument(skip(self, new), fields(mission_id = ?new.mission_id))]
    pub async fn create_ride(&self, new: NewRide) -> ServiceResult<Ride> {
        let ride = new.into_ride(Uuid::now_v7(), Utc::now())?;
        self.run("create_ride", || self.create_ride_once(&ride))
            .await?;
        Ok(ride)
    }

    async fn create_ride_once(&self, ride: &Ride) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if let Some(mission_id) = ride.mission_id {
            let event_id = tx
                .mission(mission_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("mission", mission_id))?
                .event_id;
            if !tx.lock_event(event_id).await? {
                return Err(ServiceError::not_found("event", event_id));
            }
            let event = tx
                .event(event_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("event", event_id))?;
            lifecycle::ensure_open(&event)?;
        }

        tx.apply(&ChangeSet::from(vec![Mutation::InsertRide(ride.clone())]))
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// ## Summary
    /// Moves a mission to `status` outside of an event cascade.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown mission and
    /// `ServiceError::InvalidTransition` if the mission is final or its
    /// event's terminal state forbids `status`.
    #[tracing::instrument(skip(self))]
    pub async fn set_mission_status(
        &self,
        mission_id: Uuid,
        status: MissionStatus,
    ) -> ServiceResult<Mission> {
        self.run("set_mission_status", move || {
            self.set_mission_status_once(mission_id, status)
        })
        .await
    }

    async fn set_mission_status_once(
        &self,
        mission_id: Uuid,
        status: MissionStatus,
    ) -> ServiceResult<Mission> {
        let mut tx = self.store.begin().await?;
        let event_id = tx
            .mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?
            .event_id;
        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let event = tx
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        let current = tx
            .mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?;
        lifecycle::check_child_transition(
            "mission",
            mission_id,
            Some(&event),
            current.status,
            status,
        )?;

        tx.apply(&ChangeSet::from(vec![Mutation::SetMissionStatus {
            mission_id,
            status,
        }]))
        .await?;
        let updated = tx
            .mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("mission", mission_id))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// ## Summary
    /// Moves a ride to `status` outside of an event cascade.
    ///
    /// A ride without a mission is only bound by its own transition rules.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown ride and
    /// `ServiceError::InvalidTransition` if the ride is final or its
    /// mission's event forbids `status`.
    #[tracing::instrument(skip(self))]
    pub async fn set_ride_status(&self, ride_id: Uuid, status: RideStatus) -> ServiceResult<Ride> {
        self.run("set_ride_status", move || {
            self.set_ride_status_once(ride_id, status)
        })
        .await
    }

    async fn set_ride_status_once(&self, ride_id: Uuid, status: RideStatus) -> ServiceResult<Ride> {
        let mut tx = self.store.begin().await?;
        let ride = tx
            .ride(ride_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("ride", ride_id))?;

        let mut event = None;
        if let Some(mission_id) = ride.mission_id
            && let Some(mission) = tx.mission(mission_id).await?
        {
            if !tx.lock_event(mission.event_id).await? {
                return Err(ServiceError::not_found("event", mission.event_id));
            }
            event = tx.event(mission.event_id).await?;
        }
        let current = tx
            .ride(ride_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("ride", ride_id))?;
        lifecycle::check_child_transition(
            "ride",
            ride_id,
            event.as_ref(),
            current.status,
            status,
        )?;

        tx.apply(&ChangeSet::from(vec![Mutation::SetRideStatus { ride_id, status }]))
            .await?;
        let updated = tx
            .ride(ride_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("ride", ride_id))?;
        tx.commit().await?;
        Ok(updated)
    }
}

fn push_fare_update(
    changes: &mut ChangeSet,
    event: &Event,
    missions: &[Mission],
) -> ServiceResult<()> {
    if let Some((total, mutation)) = fare::plan_update(event, missions)? {
        tracing::debug!(event_id = %event.id, %total, "Total fare changed");
        changes.push(mutation);
    }
    Ok(())
}
