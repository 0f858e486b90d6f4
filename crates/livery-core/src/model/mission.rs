use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::status::MissionStatus;
use crate::money::currency_amount;
use crate::window::TimeWindow;

/// A task within an event. Its lifetime is bounded by the owning event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub window: TimeWindow,
    pub status: MissionStatus,
    pub fare: Option<Decimal>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMission {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub fare: Option<Decimal>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl NewMission {
    /// ## Summary
    /// Validates the payload and builds a `PLANNED` mission under `event_id`.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` for a blank title, an inverted window
    /// or a fare that is negative or does not fit a stored amount.
    pub fn into_mission(self, id: Uuid, event_id: Uuid, now: DateTime<Utc>) -> CoreResult<Mission> {
        if self.title.trim().is_empty() {
            return Err(CoreError::ValidationError("mission title is required".into()));
        }
        let fare = validate_fare(self.fare)?;
        Ok(Mission {
            id,
            event_id,
            title: self.title,
            description: self.description,
            window: TimeWindow::new(self.start_date, self.end_date)?,
            status: MissionStatus::Planned,
            fare,
            location: self.location,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a mission's descriptive fields.
///
/// `None` leaves a field untouched. For the nullable fields, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub fare: Option<Option<Decimal>>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl MissionUpdate {
    /// Whether applying this update can change the mission's fare.
    #[must_use]
    pub const fn touches_fare(&self) -> bool {
        self.fare.is_some()
    }

    /// ## Summary
    /// Checks the fields that can be validated without the current mission.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` for a blank title or an unstorable fare.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err(CoreError::ValidationError("mission title is required".into()));
        }
        if let Some(fare) = self.fare {
            validate_fare(fare)?;
        }
        Ok(())
    }

    /// ## Summary
    /// Applies the update to `mission` in place.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` if the resulting mission would be invalid;
    /// `mission` is left unchanged in that case.
    pub fn apply_to(self, mission: &mut Mission, now: DateTime<Utc>) -> CoreResult<()> {
        let window = TimeWindow::new(
            self.start_date.unwrap_or_else(|| mission.window.start()),
            self.end_date.unwrap_or_else(|| mission.window.end()),
        )?;
        self.validate()?;
        let fare = self.fare.map(validate_fare).transpose()?;

        mission.window = window;
        if let Some(title) = self.title {
            mission.title = title;
        }
        if let Some(description) = self.description {
            mission.description = description;
        }
        if let Some(fare) = fare {
            mission.fare = fare;
        }
        if let Some(location) = self.location {
            mission.location = location;
        }
        if let Some(notes) = self.notes {
            mission.notes = notes;
        }
        mission.updated_at = now;
        Ok(())
    }
}

fn validate_fare(fare: Option<Decimal>) -> CoreResult<Option<Decimal>> {
    fare.map(|fare| currency_amount("mission fare", fare))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_mission() -> NewMission {
        let start = Utc
            .with_ymd_and_hms(2026, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        NewMission {
            title: "Airport transfer".into(),
            description: None,
            start_date: start,
            end_date: start + chrono::Duration::hours(2),
            fare: Some(Decimal::new(8_000, 2)),
            location: None,
            notes: None,
        }
    }

    fn mission() -> Mission {
        new_mission()
            .into_mission(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .expect("valid mission")
    }

    #[test]
    fn test_update_clears_fare() {
        let mut mission = mission();
        let update = MissionUpdate {
            fare: Some(None),
            ..MissionUpdate::default()
        };
        assert!(update.touches_fare());
        update.apply_to(&mut mission, Utc::now()).expect("valid update");
        assert_eq!(mission.fare, None);
    }

    #[test]
    fn test_invalid_update_leaves_mission_untouched() {
        let mut mission = mission();
        let before = mission.clone();
        let update = MissionUpdate {
            title: Some("Renamed".into()),
            end_date: Some(mission.window.start() - chrono::Duration::hours(1)),
            ..MissionUpdate::default()
        };

        assert!(update.apply_to(&mut mission, Utc::now()).is_err());
        assert_eq!(mission, before);
    }

    #[test]
    fn test_fare_is_stored_in_cents() {
        let mission = NewMission {
            fare: Some(Decimal::new(12, 0)),
            ..new_mission()
        }
        .into_mission(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .expect("valid mission");
        assert_eq!(mission.fare.map(|fare| fare.to_string()).as_deref(), Some("12.00"));
    }

    #[test]
    fn test_unstorable_fare_rejected() {
        for fare in [Decimal::new(5, 3), Decimal::MAX] {
            let result = NewMission {
                fare: Some(fare),
                ..new_mission()
            }
            .into_mission(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
            assert!(matches!(result, Err(CoreError::ValidationError(_))));
        }

        let mut mission = mission();
        let before = mission.clone();
        let update = MissionUpdate {
            fare: Some(Some(Decimal::MAX)),
            ..MissionUpdate::default()
        };
        assert!(update.apply_to(&mut mission, Utc::now()).is_err());
        assert_eq!(mission, before);
    }

    #[test]
    fn test_negative_fare_rejected() {
        let mut mission = mission();
        let update = MissionUpdate {
            fare: Some(Some(Decimal::new(-500, 2))),
            ..MissionUpdate::default()
        };
        assert!(matches!(
            update.apply_to(&mut mission, Utc::now()),
            Err(CoreError::ValidationError(_))
        ));
    }
}
