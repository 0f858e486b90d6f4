//! Tests for the derived total fare of mission-based events.

use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::{MissionUpdate, NewEvent, NewMission, PricingType};

use super::helpers::*;

/// ## Summary
/// Test that the total follows the mission set: 10.50 + none + 5.00, then + 2.25.
#[test_log::test(tokio::test)]
async fn total_follows_mission_fares() {
    let test = TestEngine::memory();
    let event = test.seed_event("Gala dinner").await;
    assert_eq!(event.pricing.total_fare(), Some(cents(0)));

    test.seed_mission(event.id, at(9, 0), at(10, 0), Some(cents(1_050)))
        .await;
    test.seed_mission(event.id, at(10, 0), at(11, 0), None)
        .await;
    let third = test
        .seed_mission(event.id, at(11, 0), at(12, 0), Some(cents(500)))
        .await;
    let total = test.subtree(event.id).await.event.pricing.total_fare();
    assert_eq!(total, Some(cents(1_550)));

    test.seed_mission(event.id, at(12, 0), at(13, 0), Some(cents(225)))
        .await;
    let total = test
        .subtree(event.id)
        .await
        .event
        .pricing
        .total_fare()
        .expect("mission based");
    assert_eq!(total, cents(1_775));
    assert_eq!(total.to_string(), "17.75");

    test.engine
        .update_mission(
            third.id,
            MissionUpdate {
                fare: Some(Some(cents(1_000))),
                ..MissionUpdate::default()
            },
        )
        .await
        .expect("fare edited");
    assert_eq!(
        test.engine.recompute_fare(event.id).await.expect("recomputed"),
        Some(cents(2_275))
    );
}

/// ## Summary
/// Test that recompute repairs a stale total and changes nothing afterwards.
#[test_log::test(tokio::test)]
async fn recompute_is_idempotent() {
    let test = TestEngine::memory();
    let event = test.seed_event("Board meeting").await;
    test.seed_mission(event.id, at(9, 0), at(10, 0), Some(Decimal::new(1_999, 2)))
        .await;

    let first = test.engine.recompute_fare(event.id).await.expect("recomputed");
    let stored = test.subtree(event.id).await;
    let second = test.engine.recompute_fare(event.id).await.expect("recomputed");

    assert_eq!(first, Some(cents(1_999)));
    assert_eq!(first, second);
    assert_eq!(test.subtree(event.id).await, stored);
}

/// ## Summary
/// Test that a fixed price is never overwritten by mission fares.
#[test_log::test(tokio::test)]
async fn fixed_price_is_never_derived() {
    let test = TestEngine::memory();
    let event = test
        .engine
        .create_event(NewEvent {
            title: "Corporate retreat".into(),
            client_id: Uuid::new_v4(),
            start_date: at(8, 0),
            end_date: at(18, 0),
            location: None,
            pricing_type: PricingType::FixedPrice,
            fixed_price: Some(cents(250_000)),
            notes: None,
        })
        .await
        .expect("created");

    test.seed_mission(event.id, at(9, 0), at(10, 0), Some(cents(4_000)))
        .await;

    assert_eq!(
        test.engine.recompute_fare(event.id).await.expect("recomputed"),
        None
    );
    let stored = test.subtree(event.id).await.event;
    assert_eq!(stored.pricing.fixed_price(), Some(cents(250_000)));
    assert_eq!(stored.pricing.total_fare(), None);
}

/// ## Summary
/// Test that a fixed-price event without a price is rejected up front.
#[test_log::test(tokio::test)]
async fn fixed_price_requires_a_price() {
    let test = TestEngine::memory();
    let err = test
        .engine
        .create_event(NewEvent {
            title: "Corporate retreat".into(),
            client_id: Uuid::new_v4(),
            start_date: at(8, 0),
            end_date: at(18, 0),
            location: None,
            pricing_type: PricingType::FixedPrice,
            fixed_price: None,
            notes: None,
        })
        .await
        .expect_err("price missing");
    assert_eq!(err.kind(), "validation");
}

fn mission_with_fare(fare: Decimal) -> NewMission {
    NewMission {
        title: "Charter".into(),
        description: None,
        start_date: at(14, 0),
        end_date: at(15, 0),
        fare: Some(fare),
        location: None,
        notes: None,
    }
}

/// ## Summary
/// Test that fares a stored amount cannot hold are rejected without touching the event.
#[test_log::test(tokio::test)]
async fn unstorable_fares_are_rejected() {
    let test = TestEngine::memory();
    let event = test.seed_event("Harbour gala").await;
    let mission = test
        .seed_mission(event.id, at(9, 0), at(10, 0), Some(cents(1_000)))
        .await;
    let before = test.subtree(event.id).await;

    for fare in [Decimal::MAX, Decimal::new(5, 3)] {
        let err = test
            .engine
            .create_mission(event.id, mission_with_fare(fare))
            .await
            .expect_err("fare cannot be stored");
        assert_eq!(err.kind(), "validation");

        let err = test
            .engine
            .update_mission(
                mission.id,
                MissionUpdate {
                    fare: Some(Some(fare)),
                    ..MissionUpdate::default()
                },
            )
            .await
            .expect_err("fare cannot be stored");
        assert_eq!(err.kind(), "validation");
    }

    assert_eq!(test.subtree(event.id).await, before);
}

/// ## Summary
/// Test that a mission pushing the total past the largest storable amount is rejected.
#[test_log::test(tokio::test)]
async fn total_cannot_outgrow_storage() {
    let test = TestEngine::memory();
    let event = test.seed_event("Harbour gala").await;
    let largest = Decimal::new(999_999_999_999, 2);
    test.seed_mission(event.id, at(9, 0), at(10, 0), Some(largest))
        .await;
    let before = test.subtree(event.id).await;
    assert_eq!(before.event.pricing.total_fare(), Some(largest));

    let err = test
        .engine
        .create_mission(event.id, mission_with_fare(largest))
        .await
        .expect_err("total overflows");
    assert!(matches!(err, ServiceError::ValidationError(_)));
    assert_eq!(test.subtree(event.id).await, before);
}
