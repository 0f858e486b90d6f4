//! Status transitions of an event and their cascade down the hierarchy.
//!
//! Planning is pure: each function reads a loaded [`EventSubtree`] and returns
//! the [`ChangeSet`] that the orchestrator applies in one transaction. A
//! cascade is one bulk write per level, never a loop of single-row updates.

use std::fmt;

use uuid::Uuid;

use livery_core::model::{
    AssignmentStatus, Event, EventStatus, EventSubtree, MissionStatus, RideStatus, Terminal,
};
use livery_db::{ChangeSet, Mutation};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Plans the cascade of `target` from the event to its missions, their rides,
/// and the resource assignments the event holds.
///
/// Re-applying the event's current terminal state plans the same cascade
/// again and is not an error.
///
/// ## Errors
/// Returns `ServiceError::InvalidTransition` when the event already sits in the
/// other terminal state.
pub fn plan_transition(subtree: &EventSubtree, target: Terminal) -> ServiceResult<ChangeSet> {
    let event = &subtree.event;
    let target_status = EventStatus::from(target);
    if event.status != target_status && !event.status.can_transition_to(target_status) {
        return Err(ServiceError::InvalidTransition(format!(
            "event {} is {} and cannot become {target}",
            event.id, event.status
        )));
    }

    let mission_ids = subtree.mission_ids();
    let mut changes = ChangeSet::new();
    changes.push(Mutation::SetEventStatus {
        event_id: event.id,
        status: target_status,
    });
    if !mission_ids.is_empty() {
        changes.push(Mutation::SetMissionStatusForEvent {
            event_id: event.id,
            status: MissionStatus::from(target),
        });
        changes.push(Mutation::SetRideStatusForMissions {
            mission_ids,
            status: RideStatus::from(target),
        });
    }

    let released = released_assignments(subtree, target);
    if !released.is_empty() {
        let status = match target {
            Terminal::Cancelled => AssignmentStatus::Cancelled,
            Terminal::Completed => AssignmentStatus::Completed,
        };
        changes.push(Mutation::SetAssignmentStatus {
            assignment_ids: released,
            status,
        });
    }

    tracing::debug!(
        event_id = %event.id,
        %target,
        missions = subtree.missions.len(),
        rides = subtree.rides.len(),
        "Planned cascade"
    );
    Ok(changes)
}

/// Assignments a transition to `target` closes: every live one on cancel,
/// every assigned or confirmed one on completion.
fn released_assignments(subtree: &EventSubtree, target: Terminal) -> Vec<Uuid> {
    subtree
        .assignments
        .iter()
        .filter(|assignment| match target {
            Terminal::Cancelled => assignment.status != AssignmentStatus::Cancelled,
            Terminal::Completed => matches!(
                assignment.status,
                AssignmentStatus::Assigned | AssignmentStatus::Confirmed
            ),
        })
        .map(|assignment| assignment.id)
        .collect()
}

/// ## Summary
/// Plans the removal of an event.
///
/// Rides under the event's missions are detached and kept. Assignments go
/// before missions since mission-level assignments reference their mission;
/// participants follow, and the event row is deleted last.
#[must_use]
pub fn plan_delete(subtree: &EventSubtree) -> ChangeSet {
    let event_id = subtree.event.id;
    let mission_ids = subtree.mission_ids();
    let mut changes = ChangeSet::new();

    if !mission_ids.is_empty() {
        changes.push(Mutation::DetachRides { mission_ids });
    }
    changes
        .push(Mutation::DeleteAssignmentsForEvent { event_id })
        .push(Mutation::DeleteMissionsForEvent { event_id })
        .push(Mutation::DeleteParticipantsForEvent { event_id })
        .push(Mutation::DeleteEvent { event_id });

    tracing::debug!(
        %event_id,
        missions = subtree.missions.len(),
        detached_rides = subtree.rides.len(),
        "Planned delete"
    );
    changes
}

/// ## Summary
/// Rejects changes beneath an event that reached a terminal state.
///
/// ## Errors
/// Returns `ServiceError::InvalidTransition` if the event is cancelled or completed.
pub fn ensure_open(event: &Event) -> ServiceResult<()> {
    if event.is_terminal() {
        return Err(ServiceError::InvalidTransition(format!(
            "event {} is {}; its missions, rides and assignments are frozen",
            event.id, event.status
        )));
    }
    Ok(())
}

/// Status of a mission or ride, as far as direct transitions are concerned.
pub(crate) trait ChildStatus: Copy + PartialEq + fmt::Display + From<Terminal> {
    fn is_final(self) -> bool;
    fn may_become(self, target: Self) -> bool;
}

impl ChildStatus for MissionStatus {
    fn is_final(self) -> bool {
        self.is_terminal()
    }

    fn may_become(self, target: Self) -> bool {
        self.can_transition_to(target)
    }
}

impl ChildStatus for RideStatus {
    fn is_final(self) -> bool {
        self.is_terminal()
    }

    fn may_become(self, target: Self) -> bool {
        self.can_transition_to(target)
    }
}

/// ## Summary
/// Validates a direct status change of a mission or ride under `event`.
///
/// Terminal child states are final. Under a terminal event a child may only
/// move to the event's own terminal state.
///
/// ## Errors
/// Returns `ServiceError::InvalidTransition` when either rule is broken.
pub(crate) fn check_child_transition<S: ChildStatus>(
    entity: &'static str,
    id: Uuid,
    event: Option<&Event>,
    current: S,
    target: S,
) -> ServiceResult<()> {
    if current.is_final() || !current.may_become(target) {
        return Err(ServiceError::InvalidTransition(format!(
            "{entity} {id} cannot move from {current} to {target}"
        )));
    }
    if let Some(event) = event
        && let Some(terminal) = event.status.terminal()
        && target != S::from(terminal)
    {
        return Err(ServiceError::InvalidTransition(format!(
            "event {} is {terminal}; {entity} {id} may only become {terminal}",
            event.id
        )));
    }
    Ok(())
}

/// ## Summary
/// Validates a direct status change of a resource assignment.
///
/// ## Errors
/// Returns `ServiceError::InvalidTransition` if `current` cannot reach `target`.
pub fn check_assignment_transition(
    id: Uuid,
    current: AssignmentStatus,
    target: AssignmentStatus,
) -> ServiceResult<()> {
    if current.can_transition_to(target) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition(format!(
            "assignment {id} cannot move from {current} to {target}"
        )))
    }
}
