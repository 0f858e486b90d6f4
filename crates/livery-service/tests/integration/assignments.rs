//! Tests for resource assignment and double-booking detection.
//!
//! Tests:
//! - Partial overlap and adjacency for every resource kind
//! - Concurrent requests for one resource
//! - Explicit override of conflicting bookings

use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use livery_core::model::{AssignmentOwner, AssignmentStatus, ResourceKind, ResourceRef};
use livery_service::{AssignResourceRequest, Conflict};

use super::helpers::*;

/// ## Summary
/// Test that [10:00, 11:00) and [10:30, 11:30) overlap exactly on [10:30, 11:00),
/// while [11:00, 12:00) is free.
#[test_log::test(tokio::test)]
async fn overlap_is_reported_and_adjacency_is_free() {
    let test = TestEngine::memory();
    let event = test.seed_event("Trade fair").await;
    let owner = AssignmentOwner::Event(event.id);
    let vehicle = test.seed_vehicle().await;

    let booked = test
        .assign(owner, vehicle, at(10, 0), at(11, 0))
        .await
        .expect("first booking");

    let err = test
        .assign(owner, vehicle, at(10, 30), at(11, 30))
        .await
        .expect_err("overlapping booking");
    let ServiceError::Conflict(conflict) = err else {
        panic!("expected a conflict, got {err:?}");
    };
    assert_eq!(
        conflict.conflicts,
        vec![Conflict {
            conflicting_assignment_id: booked.id,
            resource_id: vehicle.id(),
            overlap_start: at(10, 30),
            overlap_end: at(11, 0),
        }]
    );

    test.assign(owner, vehicle, at(11, 0), at(12, 0))
        .await
        .expect("adjacent booking");
}

/// ## Summary
/// Test that venues and teams are checked exactly like vehicles.
#[test_log::test(tokio::test)]
async fn every_resource_kind_is_checked_alike() {
    let test = TestEngine::memory();
    let event = test.seed_event("Conference").await;
    let owner = AssignmentOwner::Event(event.id);

    for kind in [ResourceKind::Vehicle, ResourceKind::Venue, ResourceKind::Team] {
        let resource = test
            .seed_resource(ResourceRef::new(kind, Uuid::new_v4()))
            .await;
        test.assign(owner, resource, at(9, 0), at(12, 0))
            .await
            .expect("first booking");

        let err = test
            .assign(owner, resource, at(11, 0), at(13, 0))
            .await
            .expect_err("overlapping booking");
        assert_eq!(err.kind(), "conflict", "{kind}");
    }
}

/// ## Summary
/// Test that of many concurrent overlapping requests exactly one wins.
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_requests_cannot_both_win() {
    let test = TestEngine::memory();
    let event = test.seed_event("Product launch").await;
    let vehicle = test.seed_vehicle().await;
    let engine = Arc::new(test.engine.clone());

    let handles = (0..8u32).map(|i| {
        let engine = Arc::clone(&engine);
        let request = AssignResourceRequest::within(
            AssignmentOwner::Event(event.id),
            vehicle,
            at(10, i),
            at(11, i),
        );
        tokio::spawn(async move { engine.assign_resource(request).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect();

    let won = results.iter().filter(|r| r.is_ok()).count();
    let conflicted = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
        .count();
    assert_eq!(won, 1);
    assert_eq!(conflicted, 7);

    let stored = test.subtree(event.id).await;
    assert_eq!(stored.assignments.len(), 1);
}

/// ## Summary
/// Test that assignments need a registered resource and an open event.
#[test_log::test(tokio::test)]
async fn assignment_preconditions() {
    let test = TestEngine::memory();
    let event = test.seed_event("Award night").await;
    let owner = AssignmentOwner::Event(event.id);

    let unknown = ResourceRef::Venue(Uuid::new_v4());
    let err = test
        .assign(owner, unknown, at(9, 0), at(10, 0))
        .await
        .expect_err("venue not registered");
    assert!(matches!(err, ServiceError::NotFound { entity: "venue", .. }));

    let err = test
        .assign(
            AssignmentOwner::Event(Uuid::new_v4()),
            unknown,
            at(9, 0),
            at(10, 0),
        )
        .await
        .expect_err("no such event");
    assert!(matches!(err, ServiceError::NotFound { entity: "event", .. }));

    let venue = test.seed_resource(unknown).await;
    test.engine.cancel(event.id).await.expect("cancelled");
    let err = test
        .assign(owner, venue, at(9, 0), at(10, 0))
        .await
        .expect_err("event is cancelled");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

/// ## Summary
/// Test that an override cancels every overlapping booking and reports it.
#[test_log::test(tokio::test)]
async fn override_displaces_every_conflict() {
    let test = TestEngine::memory();
    let event = test.seed_event("Wedding").await;
    let owner = AssignmentOwner::Event(event.id);
    let team = test
        .seed_resource(ResourceRef::Team(Uuid::new_v4()))
        .await;

    let morning = test
        .assign(owner, team, at(9, 0), at(11, 0))
        .await
        .expect("morning");
    let noon = test
        .assign(owner, team, at(11, 0), at(13, 0))
        .await
        .expect("noon");
    let evening = test
        .assign(owner, team, at(18, 0), at(20, 0))
        .await
        .expect("evening");

    let outcome = test
        .engine
        .override_assign_resource(AssignResourceRequest::within(
            owner,
            team,
            at(10, 0),
            at(12, 0),
        ))
        .await
        .expect("override succeeds");

    let mut displaced: Vec<Uuid> = outcome
        .displaced
        .iter()
        .map(|c| c.conflicting_assignment_id)
        .collect();
    displaced.sort_unstable();
    let mut expected = vec![morning.id, noon.id];
    expected.sort_unstable();
    assert_eq!(displaced, expected);

    let stored = test.subtree(event.id).await;
    let status_of = |id: Uuid| {
        stored
            .assignments
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status)
    };
    assert_eq!(status_of(morning.id), Some(AssignmentStatus::Cancelled));
    assert_eq!(status_of(noon.id), Some(AssignmentStatus::Cancelled));
    assert_eq!(status_of(evening.id), Some(AssignmentStatus::Assigned));
    assert_eq!(
        status_of(outcome.assignment.id),
        Some(AssignmentStatus::Assigned)
    );
}

/// ## Summary
/// Test that a cancelled booking no longer blocks its window.
#[test_log::test(tokio::test)]
async fn cancelled_booking_frees_its_window() {
    let test = TestEngine::memory();
    let event = test.seed_event("Gallery opening").await;
    let owner = AssignmentOwner::Event(event.id);
    let vehicle = test.seed_vehicle().await;

    let booked = test
        .assign(owner, vehicle, at(15, 0), at(17, 0))
        .await
        .expect("first booking");
    test.engine
        .set_assignment_status(booked.id, AssignmentStatus::Cancelled)
        .await
        .expect("cancelled");

    test.assign(owner, vehicle, at(16, 0), at(18, 0))
        .await
        .expect("window is free again");
}
