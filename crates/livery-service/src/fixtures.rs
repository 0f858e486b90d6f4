//! Builders shared by the unit tests of this crate.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::model::{
    AssignmentStatus, Event, EventSubtree, Mission, NewEvent, NewMission, NewRide, Participant,
    ParticipantStatus, PricingType, ResourceAssignment, ResourceRef, Ride,
};
use livery_core::window::TimeWindow;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn event() -> Event {
    NewEvent {
        title: "Summer gala".into(),
        client_id: Uuid::new_v4(),
        start_date: at(8, 0),
        end_date: at(20, 0),
        location: Some("Harbour hall".into()),
        pricing_type: PricingType::MissionBased,
        fixed_price: None,
        notes: Some("VIP guests".into()),
    }
    .into_event(Uuid::now_v7(), Utc::now())
    .expect("valid event")
}

pub fn mission(event: &Event, fare: Option<Decimal>) -> Mission {
    NewMission {
        title: "Guest shuttle".into(),
        description: Some("Hotel to venue".into()),
        start_date: at(9, 0),
        end_date: at(11, 0),
        fare,
        location: None,
        notes: None,
    }
    .into_mission(Uuid::now_v7(), event.id, Utc::now())
    .expect("valid mission")
}

pub fn ride(mission: &Mission) -> Ride {
    NewRide {
        mission_id: Some(mission.id),
        passenger_name: "J. Doe".into(),
        chauffeur_id: Some(Uuid::new_v4()),
        pickup_time: mission.window.start(),
        dropoff_time: Some(mission.window.end()),
        pickup_address: "Grand Hotel".into(),
        dropoff_address: "Harbour hall".into(),
        fare: Some(Decimal::new(3_500, 2)),
    }
    .into_ride(Uuid::now_v7(), Utc::now())
    .expect("valid ride")
}

pub fn participant(event: &Event) -> Participant {
    Participant {
        id: Uuid::now_v7(),
        event_id: event.id,
        user_id: Uuid::new_v4(),
        role: "host".into(),
        status: ParticipantStatus::Accepted,
    }
}

pub fn assignment(
    event: &Event,
    mission_id: Option<Uuid>,
    resource: ResourceRef,
    status: AssignmentStatus,
) -> ResourceAssignment {
    ResourceAssignment {
        id: Uuid::now_v7(),
        event_id: event.id,
        mission_id,
        resource,
        window: TimeWindow::new(at(9, 0), at(11, 0)).expect("valid window"),
        status,
        notes: None,
        created_at: Utc::now(),
    }
}

/// An event with two missions, a ride on the first, and one assignment per owner level.
pub fn populated_subtree() -> EventSubtree {
    let event = event();
    let first = mission(&event, Some(Decimal::new(1_050, 2)));
    let second = mission(&event, None);
    let rides = vec![ride(&first)];
    let assignments = vec![
        assignment(
            &event,
            None,
            ResourceRef::Venue(Uuid::new_v4()),
            AssignmentStatus::Confirmed,
        ),
        assignment(
            &event,
            Some(first.id),
            ResourceRef::Vehicle(Uuid::new_v4()),
            AssignmentStatus::Assigned,
        ),
    ];
    let participants = vec![participant(&event)];

    EventSubtree {
        event,
        missions: vec![first, second],
        rides,
        assignments,
        participants,
    }
}
