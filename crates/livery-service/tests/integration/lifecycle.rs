//! Tests for the cancel, complete and delete cascades.
//!
//! Tests:
//! - Cascade completeness, down to rides and resource bookings
//! - Idempotent re-cancel and rejected cross-terminal moves
//! - Ride detachment on delete

use uuid::Uuid;

use livery_core::model::{
    AssignmentOwner, AssignmentStatus, EventStatus, EventSubtree, MissionStatus, RideStatus,
};
use livery_service::OperationOutcome;

use super::helpers::*;

fn statuses(subtree: &EventSubtree) -> (EventStatus, Vec<MissionStatus>, Vec<RideStatus>) {
    (
        subtree.event.status,
        subtree.missions.iter().map(|m| m.status).collect(),
        subtree.rides.iter().map(|r| r.status).collect(),
    )
}

/// ## Summary
/// Test that cancel reaches every mission and every ride of those missions.
#[test_log::test(tokio::test)]
async fn cancel_cascades_to_missions_and_rides() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    let outcome = test
        .engine
        .apply_operation(seeded.event.id, "cancel")
        .await
        .expect("cancel succeeds");
    let OperationOutcome::Updated { event } = outcome else {
        panic!("cancel returns the updated event, got {outcome:?}");
    };
    assert_eq!(event.status, EventStatus::Cancelled);

    let subtree = test.subtree(seeded.event.id).await;
    assert_eq!(subtree.event.status, EventStatus::Cancelled);
    assert_eq!(subtree.missions.len(), 2);
    assert!(
        subtree
            .missions
            .iter()
            .all(|m| m.status == MissionStatus::Cancelled)
    );
    assert_eq!(subtree.rides.len(), seeded.rides.len());
    assert!(
        subtree
            .rides
            .iter()
            .all(|r| r.status == RideStatus::Cancelled)
    );
    assert!(
        subtree
            .assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::Cancelled)
    );

    let standalone = test
        .ride(seeded.standalone.id)
        .await
        .expect("standalone ride exists");
    assert_eq!(standalone.status, RideStatus::Scheduled);
}

/// ## Summary
/// Test that complete cascades like cancel and closes live bookings.
#[test_log::test(tokio::test)]
async fn complete_cascades_and_closes_bookings() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    test.engine
        .complete(seeded.event.id)
        .await
        .expect("complete succeeds");

    let subtree = test.subtree(seeded.event.id).await;
    let (event, missions, rides) = statuses(&subtree);
    assert_eq!(event, EventStatus::Completed);
    assert!(missions.iter().all(|s| *s == MissionStatus::Completed));
    assert!(rides.iter().all(|s| *s == RideStatus::Completed));
    assert!(
        subtree
            .assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::Completed)
    );
}

/// ## Summary
/// Test that cancelling twice ends in the same state and is not an error.
#[test_log::test(tokio::test)]
async fn cancel_is_idempotent() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    test.engine
        .cancel(seeded.event.id)
        .await
        .expect("first cancel");
    let once = test.subtree(seeded.event.id).await;

    test.engine
        .cancel(seeded.event.id)
        .await
        .expect("second cancel");
    let twice = test.subtree(seeded.event.id).await;

    assert_eq!(statuses(&once), statuses(&twice));
    assert_eq!(once.assignments, twice.assignments);
}

/// ## Summary
/// Test that a cancelled event cannot be completed and is left untouched.
#[test_log::test(tokio::test)]
async fn completing_a_cancelled_event_is_rejected() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    test.engine
        .cancel(seeded.event.id)
        .await
        .expect("cancel succeeds");
    let before = test.subtree(seeded.event.id).await;

    let err = test
        .engine
        .apply_operation(seeded.event.id, "complete")
        .await
        .expect_err("cross-terminal move");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert_eq!(err.kind(), "invalid_transition");

    let after = test.subtree(seeded.event.id).await;
    assert_eq!(before, after);
}

/// ## Summary
/// Test that delete removes the event subtree but keeps its rides, detached.
#[test_log::test(tokio::test)]
async fn delete_detaches_rides_and_removes_the_rest() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;

    let outcome = test
        .engine
        .apply_operation(seeded.event.id, "delete")
        .await
        .expect("delete succeeds");
    assert_eq!(
        outcome,
        OperationOutcome::Deleted {
            event_id: seeded.event.id
        }
    );

    let err = test
        .engine
        .get_event_subtree(seeded.event.id)
        .await
        .expect_err("event is gone");
    assert!(matches!(err, ServiceError::NotFound { entity: "event", .. }));

    for ride in &seeded.rides {
        let kept = test.ride(ride.id).await.expect("ride outlives its mission");
        assert_eq!(kept.mission_id, None);
        assert_eq!(kept.status, ride.status);
    }
    assert!(test.ride(seeded.standalone.id).await.is_some());

    let other = test.seed_event("Next booking").await;
    let mission = &seeded.missions[0];
    test.assign(
        AssignmentOwner::Event(other.id),
        seeded.vehicle,
        mission.window.start(),
        mission.window.end(),
    )
    .await
    .expect("deleted bookings no longer hold the vehicle");
}

/// ## Summary
/// Test that cancelling an event frees its resources for other events.
#[test_log::test(tokio::test)]
async fn cancel_releases_resources() {
    let test = TestEngine::memory();
    let seeded = test.seed_populated_event().await;
    let other = test.seed_event("Competing event").await;
    let window = seeded.missions[0].window;

    let err = test
        .assign(
            AssignmentOwner::Event(other.id),
            seeded.vehicle,
            window.start(),
            window.end(),
        )
        .await
        .expect_err("vehicle is booked");
    assert_eq!(err.kind(), "conflict");

    test.engine
        .cancel(seeded.event.id)
        .await
        .expect("cancel succeeds");
    test.assign(
        AssignmentOwner::Event(other.id),
        seeded.vehicle,
        window.start(),
        window.end(),
    )
    .await
    .expect("cancelled bookings release the vehicle");
}

/// ## Summary
/// Test that every operation reports an unknown event as not found.
#[test_log::test(tokio::test)]
async fn unknown_event_is_not_found() {
    let test = TestEngine::memory();
    let missing = Uuid::new_v4();

    for operation in ["clone", "cancel", "complete", "delete"] {
        let err = test
            .engine
            .apply_operation(missing, operation)
            .await
            .expect_err("no such event");
        assert!(
            matches!(err, ServiceError::NotFound { entity: "event", id } if id == missing),
            "{operation}: {err:?}"
        );
    }

    let err = test
        .engine
        .recompute_fare(missing)
        .await
        .expect_err("no such event");
    assert_eq!(err.kind(), "not_found");
}
