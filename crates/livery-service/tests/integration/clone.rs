//! Tests for the clone operation.
//!
//! Verifies fresh identities, reset lifecycle state, the ride-less copy, and
//! that a copy is conflict-checked before anything is written.

use chrono::Duration;

use livery_core::model::{AssignmentStatus, EventStatus, MissionStatus, ParticipantStatus};
use livery_service::{CloneOptions, OperationOutcome};

use super::helpers::*;

/// ## Summary
/// Test that a clone moved to another day is a fresh, planned, ride-less copy.
#[test_log::test(tokio::test)]
async fn clone_is_isolated_from_its_source() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;
    test.engine
        .complete(seeded.event.id)
        .await
        .expect("complete succeeds");

    let shift_to = seeded.event.window.start() + Duration::days(1);
    let copy = test
        .engine
        .clone_event_with(
            seeded.event.id,
            CloneOptions {
                shift_to: Some(shift_to),
            },
        )
        .await
        .expect("clone succeeds");

    assert_ne!(copy.id, seeded.event.id);
    assert_eq!(copy.status, EventStatus::Planned);
    assert_eq!(copy.title, "Harbour festival (Clone)");
    assert_eq!(copy.window.start(), shift_to);

    let cloned = test.subtree(copy.id).await;
    assert_eq!(cloned.missions.len(), seeded.missions.len());
    for mission in &cloned.missions {
        assert!(seeded.missions.iter().all(|m| m.id != mission.id));
        assert_eq!(mission.status, MissionStatus::Planned);
        assert_eq!(mission.event_id, copy.id);
    }
    assert!(cloned.rides.is_empty());
    assert_eq!(cloned.participants.len(), 1);
    assert_eq!(cloned.participants[0].status, ParticipantStatus::Pending);
    assert_eq!(cloned.assignments.len(), 2);
    assert!(
        cloned
            .assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::Assigned && a.resource == seeded.vehicle)
    );

    let source = test.subtree(seeded.event.id).await;
    assert_eq!(source.event.status, EventStatus::Completed);
    assert_eq!(source.rides.len(), seeded.rides.len());
}

/// ## Summary
/// Test that an unshifted clone of an event with live bookings is refused whole.
#[test_log::test(tokio::test)]
async fn clone_refuses_to_double_book() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    let err = test
        .engine
        .apply_operation(seeded.event.id, "clone")
        .await
        .expect_err("copies overlap the source bookings");
    let ServiceError::Conflict(conflict) = err else {
        panic!("expected a conflict, got {err:?}");
    };
    assert_eq!(conflict.conflicts.len(), 2);
    assert!(
        conflict
            .conflicts
            .iter()
            .all(|c| c.resource_id == seeded.vehicle.id())
    );

    let other = test.seed_event("Unrelated").await;
    test.assign(
        livery_core::model::AssignmentOwner::Event(other.id),
        seeded.vehicle,
        at(11, 0),
        at(14, 0),
    )
    .await
    .expect("the gap between the source bookings is still free");
}

/// ## Summary
/// Test that cloning a cancelled event rebooks the resources it released.
#[test_log::test(tokio::test)]
async fn clone_of_cancelled_event_rebooks_resources() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;
    test.engine
        .cancel(seeded.event.id)
        .await
        .expect("cancel succeeds");

    let outcome = test
        .engine
        .apply_operation(seeded.event.id, "clone")
        .await
        .expect("released bookings do not conflict");
    let OperationOutcome::Cloned { event } = outcome else {
        panic!("clone returns the new event, got {outcome:?}");
    };

    assert_eq!(event.window, seeded.event.window);
    assert_eq!(event.pricing.total_fare(), Some(cents(0)));
    let cloned = test.subtree(event.id).await;
    assert!(cloned.missions.iter().all(|m| m.fare.is_none()));
    assert_eq!(cloned.assignments.len(), 2);
}
