//! Deep copy of an event subtree into a fresh, reset event.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use livery_core::model::{
    AssignmentStatus, Event, EventStatus, EventSubtree, Mission, MissionStatus, Participant,
    ParticipantStatus, Pricing, ResourceAssignment, ResourceRef,
};
use livery_db::{ChangeSet, Mutation};

use crate::conflict::{ConflictError, find_conflicts};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOptions {
    /// New start of the copy; every window in the subtree moves by the same offset.
    pub shift_to: Option<DateTime<Utc>>,
}

/// Everything a clone inserts, before conflict checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePlan {
    pub event: Event,
    pub missions: Vec<Mission>,
    pub participants: Vec<Participant>,
    pub assignments: Vec<ResourceAssignment>,
}

/// ## Summary
/// Builds the copy of `source` with new ids and reset lifecycle state.
///
/// The event keeps its descriptive fields and pricing type. A fixed price is
/// kept; a mission-based total starts at zero since mission fares are not
/// copied. Rides stay with the source. Participants restart as `PENDING`
/// and assignments as `ASSIGNED`.
#[must_use]
pub fn plan_clone(
    source: &EventSubtree,
    options: &CloneOptions,
    title_suffix: &str,
    now: DateTime<Utc>,
) -> ClonePlan {
    let offset = options
        .shift_to
        .map_or_else(Duration::zero, |start| start - source.event.window.start());
    let event_id = Uuid::now_v7();

    let event = Event {
        id: event_id,
        title: format!("{}{title_suffix}", source.event.title),
        client_id: source.event.client_id,
        window: source.event.window.shifted(offset),
        status: EventStatus::Planned,
        location: source.event.location.clone(),
        pricing: match source.event.pricing {
            Pricing::MissionBased { .. } => Pricing::mission_based(),
            fixed @ Pricing::FixedPrice { .. } => fixed,
        },
        notes: source.event.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    let mut mission_ids = HashMap::with_capacity(source.missions.len());
    let missions = source
        .missions
        .iter()
        .map(|mission| {
            let id = Uuid::now_v7();
            mission_ids.insert(mission.id, id);
            Mission {
                id,
                event_id,
                title: mission.title.clone(),
                description: mission.description.clone(),
                window: mission.window.shifted(offset),
                status: MissionStatus::Planned,
                fare: None,
                location: mission.location.clone(),
                notes: mission.notes.clone(),
                created_at: now,
                updated_at: now,
            }
        })
        .collect();

    let participants = source
        .participants
        .iter()
        .map(|participant| Participant {
            id: Uuid::now_v7(),
            event_id,
            user_id: participant.user_id,
            role: participant.role.clone(),
            status: ParticipantStatus::Pending,
        })
        .collect();

    let assignments = source
        .assignments
        .iter()
        .map(|assignment| ResourceAssignment {
            id: Uuid::now_v7(),
            event_id,
            mission_id: assignment
                .mission_id
                .and_then(|mission_id| mission_ids.get(&mission_id).copied()),
            resource: assignment.resource,
            window: assignment.window.shifted(offset),
            status: AssignmentStatus::Assigned,
            notes: assignment.notes.clone(),
            created_at: now,
        })
        .collect();

    ClonePlan {
        event,
        missions,
        participants,
        assignments,
    }
}

impl ClonePlan {
    /// Resources the copied assignments bind, sorted and without repeats.
    #[must_use]
    pub fn resources(&self) -> Vec<ResourceRef> {
        let mut resources: Vec<ResourceRef> = self
            .assignments
            .iter()
            .map(|assignment| assignment.resource)
            .collect();
        resources.sort_unstable();
        resources.dedup();
        resources
    }

    /// ## Summary
    /// Checks every copied assignment against `existing` and against the
    /// copies accepted before it.
    ///
    /// ## Errors
    /// Returns `ConflictError` listing every overlap found across all copies.
    pub fn check_conflicts(&self, existing: &[ResourceAssignment]) -> Result<(), ConflictError> {
        let mut accepted: Vec<ResourceAssignment> = existing.to_vec();
        let mut conflicts = Vec::new();
        for candidate in &self.assignments {
            let found = find_conflicts(candidate, &accepted);
            if found.is_empty() {
                accepted.push(candidate.clone());
            } else {
                conflicts.extend(found);
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                source_title = %self.event.title,
                conflicts = conflicts.len(),
                "Clone would double-book resources"
            );
            Err(ConflictError { conflicts })
        }
    }

    /// Inserts in dependency order: event, missions, participants, assignments.
    #[must_use]
    pub fn into_changes(self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push(Mutation::InsertEvent(self.event));
        for mission in self.missions {
            changes.push(Mutation::InsertMission(mission));
        }
        for participant in self.participants {
            changes.push(Mutation::InsertParticipant(participant));
        }
        for assignment in self.assignments {
            changes.push(Mutation::InsertAssignment(assignment));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rust_decimal::Decimal;

    use livery_core::model::PricingType;

    use super::*;
    use crate::fixtures;

    fn all_ids(subtree_event: &Event, plan: &ClonePlan) -> HashSet<Uuid> {
        std::iter::once(subtree_event.id)
            .chain(plan.missions.iter().map(|m| m.id))
            .chain(plan.participants.iter().map(|p| p.id))
            .chain(plan.assignments.iter().map(|a| a.id))
            .collect()
    }

    #[test_log::test]
    fn test_clone_resets_state_and_regenerates_ids() {
        let mut source = fixtures::populated_subtree();
        source.event.status = EventStatus::Completed;
        source.missions[0].status = MissionStatus::Completed;

        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());

        assert_ne!(plan.event.id, source.event.id);
        assert_eq!(plan.event.title, "Summer gala (Clone)");
        assert_eq!(plan.event.status, EventStatus::Planned);
        assert_eq!(plan.event.window, source.event.window);
        assert_eq!(plan.event.client_id, source.event.client_id);
        assert_eq!(plan.event.pricing.total_fare(), Some(Decimal::new(0, 2)));

        assert_eq!(plan.missions.len(), source.missions.len());
        assert!(plan.missions.iter().all(|m| m.status == MissionStatus::Planned));
        assert!(plan.missions.iter().all(|m| m.event_id == plan.event.id));
        assert!(plan.missions.iter().all(|m| m.fare.is_none()));
        assert!(
            plan.participants
                .iter()
                .all(|p| p.status == ParticipantStatus::Pending && p.event_id == plan.event.id)
        );
        assert!(
            plan.assignments
                .iter()
                .all(|a| a.status == AssignmentStatus::Assigned && a.event_id == plan.event.id)
        );

        let source_ids: HashSet<Uuid> = std::iter::once(source.event.id)
            .chain(source.missions.iter().map(|m| m.id))
            .chain(source.participants.iter().map(|p| p.id))
            .chain(source.assignments.iter().map(|a| a.id))
            .collect();
        assert!(source_ids.is_disjoint(&all_ids(&plan.event, &plan)));
    }

    #[test]
    fn test_mission_level_assignments_follow_their_copied_mission() {
        let source = fixtures::populated_subtree();
        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());

        let copied = plan
            .assignments
            .iter()
            .find(|a| a.mission_id.is_some())
            .expect("mission-level assignment copied");
        assert_eq!(copied.mission_id, Some(plan.missions[0].id));
    }

    #[test]
    fn test_fixed_price_is_carried_over() {
        let mut source = fixtures::populated_subtree();
        source.event.pricing = Pricing::FixedPrice {
            fixed_price: Decimal::new(120_000, 2),
        };
        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());

        assert_eq!(plan.event.pricing_type(), PricingType::FixedPrice);
        assert_eq!(plan.event.pricing.fixed_price(), Some(Decimal::new(120_000, 2)));
    }

    #[test]
    fn test_shift_moves_every_window() {
        let source = fixtures::populated_subtree();
        let shift_to = source.event.window.start() + Duration::days(7);
        let plan = plan_clone(
            &source,
            &CloneOptions {
                shift_to: Some(shift_to),
            },
            " (Clone)",
            Utc::now(),
        );

        assert_eq!(plan.event.window.start(), shift_to);
        assert_eq!(plan.event.window.duration(), source.event.window.duration());
        assert_eq!(
            plan.missions[0].window.start(),
            source.missions[0].window.start() + Duration::days(7)
        );
        assert_eq!(
            plan.assignments[0].window.end(),
            source.assignments[0].window.end() + Duration::days(7)
        );
    }

    #[test_log::test]
    fn test_unshifted_copy_conflicts_with_live_source_bookings() {
        let source = fixtures::populated_subtree();
        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());

        let err = plan
            .check_conflicts(&source.assignments)
            .expect_err("same windows, same resources");
        assert_eq!(err.conflicts.len(), 2);

        let mut released = source.assignments.clone();
        for assignment in &mut released {
            assignment.status = AssignmentStatus::Cancelled;
        }
        assert!(plan.check_conflicts(&released).is_ok());
    }

    #[test]
    fn test_copies_are_checked_against_each_other() {
        let mut source = fixtures::populated_subtree();
        let shared = source.assignments[0].resource;
        source.assignments[1].resource = shared;
        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());

        let err = plan.check_conflicts(&[]).expect_err("copies overlap each other");
        assert_eq!(err.conflicts.len(), 1);
        assert_eq!(err.conflicts[0].conflicting_assignment_id, plan.assignments[0].id);
    }

    #[test]
    fn test_changes_insert_parent_first() {
        let source = fixtures::populated_subtree();
        let plan = plan_clone(&source, &CloneOptions::default(), " (Clone)", Utc::now());
        let event_id = plan.event.id;
        let changes = plan.into_changes();

        assert!(matches!(
            changes.mutations().first(),
            Some(Mutation::InsertEvent(event)) if event.id == event_id
        ));
        assert!(matches!(
            changes.mutations().last(),
            Some(Mutation::InsertAssignment(_))
        ));
        assert_eq!(changes.len(), 1 + 2 + 1 + 2);
    }
}
