use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use livery_core::model::{AssignmentOwner, AssignmentStatus, ResourceAssignment, ResourceRef};
use livery_core::window::TimeWindow;
use livery_db::{ChangeSet, Mutation, Store, StoreTransaction};

use super::EventEngine;
use crate::conflict::{self, Conflict};
use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle;

/// Request to bind a resource to an event or mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResourceRequest {
    #[serde(flatten)]
    pub owner: AssignmentOwner,
    pub resource: ResourceRef,
    /// Start of the booking; with `end` absent too, the owner's window is used.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl AssignResourceRequest {
    /// Books `resource` for the whole window of `owner`.
    #[must_use]
    pub const fn inherit(owner: AssignmentOwner, resource: ResourceRef) -> Self {
        Self {
            owner,
            resource,
            start: None,
            end: None,
            notes: None,
        }
    }

    /// Books `resource` for an explicit window.
    #[must_use]
    pub const fn within(
        owner: AssignmentOwner,
        resource: ResourceRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            owner,
            resource,
            start: Some(start),
            end: Some(end),
            notes: None,
        }
    }

    /// ## Summary
    /// Resolves the explicit window, if one was given.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` when only one bound is given,
    /// or when the window is inverted or empty.
    fn explicit_window(&self) -> ServiceResult<Option<TimeWindow>> {
        let window = match (self.start, self.end) {
            (None, None) => return Ok(None),
            (Some(start), Some(end)) => TimeWindow::new(start, end)?,
            _ => {
                return Err(ServiceError::ValidationError(
                    "an assignment window needs both start and end".into(),
                ));
            }
        };
        ensure_bookable(&window)?;
        Ok(Some(window))
    }
}

fn ensure_bookable(window: &TimeWindow) -> ServiceResult<()> {
    if window.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "assignment window {window} is empty"
        )));
    }
    Ok(())
}

/// An assignment stored by override, with the bookings it displaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideOutcome {
    pub assignment: ResourceAssignment,
    /// Overlaps that were resolved by cancelling the conflicting assignment.
    pub displaced: Vec<Conflict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnConflict {
    Refuse,
    Displace,
}

impl<S: Store> EventEngine<S> {
    /// ## Summary
    /// Books a resource for an event or mission after checking it for double-booking.
    ///
    /// The conflict check and the insert run under the resource lock, so two
    /// concurrent overlapping requests cannot both succeed.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for a malformed window,
    /// `ServiceError::NotFound` for an unknown owner or resource,
    /// `ServiceError::InvalidTransition` under a cancelled or completed event,
    /// and `ServiceError::Conflict` with every overlap otherwise found.
    #[tracing::instrument(skip(self, request), fields(owner = ?request.owner, resource = %request.resource))]
    pub async fn assign_resource(
        &self,
        request: AssignResourceRequest,
    ) -> ServiceResult<ResourceAssignment> {
        let window = request.explicit_window()?;
        let (assignment, _) = self
            .run("assign_resource", || {
                self.assign_once(&request, window, OnConflict::Refuse)
            })
            .await?;
        tracing::info!(assignment_id = %assignment.id, "Resource assigned");
        Ok(assignment)
    }

    /// ## Summary
    /// Books a resource, cancelling every assignment it overlaps.
    ///
    /// The displaced conflicts are returned for the caller to report.
    ///
    /// ## Errors
    /// Fails as [`Self::assign_resource`] does, except for conflicts.
    #[tracing::instrument(skip(self, request), fields(owner = ?request.owner, resource = %request.resource))]
    pub async fn override_assign_resource(
        &self,
        request: AssignResourceRequest,
    ) -> ServiceResult<OverrideOutcome> {
        let window = request.explicit_window()?;
        let (assignment, displaced) = self
            .run("override_assign_resource", || {
                self.assign_once(&request, window, OnConflict::Displace)
            })
            .await?;
        if !displaced.is_empty() {
            tracing::warn!(
                assignment_id = %assignment.id,
                displaced = displaced.len(),
                "Assignment overrode existing bookings"
            );
        }
        Ok(OverrideOutcome {
            assignment,
            displaced,
        })
    }

    async fn assign_once(
        &self,
        request: &AssignResourceRequest,
        window: Option<TimeWindow>,
        on_conflict: OnConflict,
    ) -> ServiceResult<(ResourceAssignment, Vec<Conflict>)> {
        let mut tx = self.store.begin().await?;

        let (event_id, mission_id) = match request.owner {
            AssignmentOwner::Event(event_id) => (event_id, None),
            AssignmentOwner::Mission(mission_id) => {
                let mission = tx
                    .mission(mission_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("mission", mission_id))?;
                (mission.event_id, Some(mission_id))
            }
        };

        if !tx.lock_event(event_id).await? {
            return Err(ServiceError::not_found("event", event_id));
        }
        let event = tx
            .event(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("event", event_id))?;
        lifecycle::ensure_open(&event)?;
        let mission = match mission_id {
            Some(mission_id) => Some(
                tx.mission(mission_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("mission", mission_id))?,
            ),
            None => None,
        };

        let window = match window {
            Some(window) => window,
            None => {
                let inherited = mission.as_ref().map_or(event.window, |mission| mission.window);
                ensure_bookable(&inherited)?;
                inherited
            }
        };

        let resource = request.resource;
        if !tx.resource_exists(resource).await? {
            return Err(ServiceError::not_found(resource.kind().as_str(), resource.id()));
        }
        tx.lock_resources(&[resource]).await?;
        let existing = tx.assignments_for_resource(resource).await?;

        let candidate = ResourceAssignment {
            id: Uuid::now_v7(),
            event_id,
            mission_id,
            resource,
            window,
            status: AssignmentStatus::Assigned,
            notes: request.notes.clone(),
            created_at: Utc::now(),
        };

        let (assignment, displaced) = match on_conflict {
            OnConflict::Refuse => (conflict::try_assign(candidate, &existing)?, Vec::new()),
            OnConflict::Displace => {
                let displaced = conflict::find_conflicts(&candidate, &existing);
                (candidate, displaced)
            }
        };

        let mut changes = ChangeSet::new();
        if !displaced.is_empty() {
            changes.push(Mutation::SetAssignmentStatus {
                assignment_ids: displaced
                    .iter()
                    .map(|conflict| conflict.conflicting_assignment_id)
                    .collect(),
                status: AssignmentStatus::Cancelled,
            });
        }
        changes.push(Mutation::InsertAssignment(assignment.clone()));
        tx.apply(&changes).await?;
        tx.commit().await?;
        Ok((assignment, displaced))
    }

    /// ## Summary
    /// Moves an assignment along `ASSIGNED → CONFIRMED → COMPLETED` or cancels it.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotFound` for an unknown assignment and
    /// `ServiceError::InvalidTransition` when the move is not allowed.
    #[tracing::instrument(skip(self))]
    pub async fn set_assignment_status(
        &self,
        assignment_id: Uuid,
        status: AssignmentStatus,
    ) -> ServiceResult<ResourceAssignment> {
        self.run("set_assignment_status", move || {
            self.set_assignment_status_once(assignment_id, status)
        })
        .await
    }

    async fn set_assignment_status_once(
        &self,
        assignment_id: Uuid,
        status: AssignmentStatus,
    ) -> ServiceResult<ResourceAssignment> {
        let mut tx = self.store.begin().await?;
        let assignment = tx
            .assignment(assignment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;
        if !tx.lock_event(assignment.event_id).await? {
            return Err(ServiceError::not_found("event", assignment.event_id));
        }
        tx.lock_resources(&[assignment.resource]).await?;

        let current = tx
            .assignment(assignment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;
        lifecycle::check_assignment_transition(assignment_id, current.status, status)?;

        tx.apply(&ChangeSet::from(vec![Mutation::SetAssignmentStatus {
            assignment_ids: vec![assignment_id],
            status,
        }]))
        .await?;
        let updated = tx
            .assignment(assignment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("assignment", assignment_id))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// ## Summary
    /// Adds a vehicle, venue or team to the resource registry, or renames it.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` for a blank name.
    #[tracing::instrument(skip(self))]
    pub async fn register_resource(&self, resource: ResourceRef, name: &str) -> ServiceResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "{resource} needs a name"
            )));
        }
        self.run("register_resource", move || async move {
            let mut tx = self.store.begin().await?;
            tx.apply(&ChangeSet::from(vec![Mutation::RegisterResource {
                resource,
                name: name.to_string(),
            }]))
            .await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
