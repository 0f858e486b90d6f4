//! Shared setup for engine integration tests.
//!
//! Every test gets its own [`MemoryStore`] through [`TestEngine::memory`]; rows
//! the engine has no public operation for (participants) are seeded straight
//! through a store transaction.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use livery_core::config::EngineConfig;
use livery_core::model::{
    AssignmentOwner, Event, EventSubtree, Mission, NewEvent, NewMission, NewRide, Participant,
    ParticipantStatus, PricingType, ResourceAssignment, ResourceRef, Ride,
};
use livery_db::{ChangeSet, MemoryStore, Mutation, Store, StoreTransaction};
use livery_service::{AssignResourceRequest, EventEngine};

pub use livery_service::{ServiceError, ServiceResult};

/// Builds a timestamp on the test day, 2026-09-12.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 12, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

pub struct TestEngine {
    pub engine: EventEngine<MemoryStore>,
}

impl TestEngine {
    pub fn memory() -> Self {
        Self {
            engine: EventEngine::new(
                MemoryStore::default(),
                EngineConfig {
                    retry_backoff_ms: 1,
                    ..EngineConfig::default()
                },
            ),
        }
    }

    pub async fn seed_event(&self, title: &str) -> Event {
        self.engine
            .create_event(NewEvent {
                title: title.into(),
                client_id: Uuid::new_v4(),
                start_date: at(8, 0),
                end_date: at(22, 0),
                location: Some("Old harbour".into()),
                pricing_type: PricingType::MissionBased,
                fixed_price: None,
                notes: None,
            })
            .await
            .expect("Failed to seed event")
    }

    pub async fn seed_mission(
        &self,
        event_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        fare: Option<Decimal>,
    ) -> Mission {
        self.engine
            .create_mission(
                event_id,
                NewMission {
                    title: "Shuttle".into(),
                    description: None,
                    start_date: start,
                    end_date: end,
                    fare,
                    location: None,
                    notes: None,
                },
            )
            .await
            .expect("Failed to seed mission")
    }

    pub async fn seed_ride(&self, mission_id: Option<Uuid>, pickup: DateTime<Utc>) -> Ride {
        self.engine
            .create_ride(NewRide {
                mission_id,
                passenger_name: "Guest".into(),
                chauffeur_id: Some(Uuid::new_v4()),
                pickup_time: pickup,
                dropoff_time: None,
                pickup_address: "Station".into(),
                dropoff_address: "Old harbour".into(),
                fare: Some(cents(2_000)),
            })
            .await
            .expect("Failed to seed ride")
    }

    pub async fn seed_participant(&self, event_id: Uuid) -> Participant {
        let participant = Participant {
            id: Uuid::now_v7(),
            event_id,
            user_id: Uuid::new_v4(),
            role: "speaker".into(),
            status: ParticipantStatus::Accepted,
        };
        let mut tx = self.engine.store().begin().await.expect("Failed to begin");
        tx.apply(&ChangeSet::from(vec![Mutation::InsertParticipant(
            participant.clone(),
        )]))
        .await
        .expect("Failed to seed participant");
        tx.commit().await.expect("Failed to commit participant");
        participant
    }

    pub async fn seed_resource(&self, resource: ResourceRef) -> ResourceRef {
        self.engine
            .register_resource(resource, "Fleet item")
            .await
            .expect("Failed to register resource");
        resource
    }

    pub async fn seed_vehicle(&self) -> ResourceRef {
        self.seed_resource(ResourceRef::Vehicle(Uuid::new_v4()))
            .await
    }

    pub async fn assign(
        &self,
        owner: AssignmentOwner,
        resource: ResourceRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<ResourceAssignment> {
        self.engine
            .assign_resource(AssignResourceRequest::within(owner, resource, start, end))
            .await
    }

    pub async fn subtree(&self, event_id: Uuid) -> EventSubtree {
        self.engine
            .get_event_subtree(event_id)
            .await
            .expect("Failed to load subtree")
    }

    pub async fn ride(&self, ride_id: Uuid) -> Option<Ride> {
        let mut tx = self.engine.store().begin().await.expect("Failed to begin");
        tx.ride(ride_id).await.expect("Failed to read ride")
    }

    /// An event with two missions, two rides on the first, one on the second,
    /// one standalone ride, a participant and a vehicle booked per mission.
    pub async fn seed_populated_event(&self) -> Populated {
        let event = self.seed_event("Harbour festival").await;
        let first = self
            .seed_mission(event.id, at(9, 0), at(11, 0), Some(cents(1_050)))
            .await;
        let second = self
            .seed_mission(event.id, at(14, 0), at(16, 0), Some(cents(500)))
            .await;
        let rides = vec![
            self.seed_ride(Some(first.id), at(9, 0)).await,
            self.seed_ride(Some(first.id), at(10, 0)).await,
            self.seed_ride(Some(second.id), at(14, 30)).await,
        ];
        let standalone = self.seed_ride(None, at(12, 0)).await;
        self.seed_participant(event.id).await;

        let vehicle = self.seed_vehicle().await;
        for mission in [&first, &second] {
            self.assign(
                AssignmentOwner::Mission(mission.id),
                vehicle,
                mission.window.start(),
                mission.window.end(),
            )
            .await
            .expect("Failed to book vehicle");
        }

        Populated {
            event,
            missions: vec![first, second],
            rides,
            standalone,
            vehicle,
        }
    }
}

pub struct Populated {
    pub event: Event,
    pub missions: Vec<Mission>,
    pub rides: Vec<Ride>,
    pub standalone: Ride,
    pub vehicle: ResourceRef,
}
