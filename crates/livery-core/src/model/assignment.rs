use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::status::AssignmentStatus;
use crate::window::TimeWindow;

/// The three interchangeable kinds of bookable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Vehicle,
    Venue,
    Team,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Venue => "venue",
            Self::Team => "team",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle" => Ok(Self::Vehicle),
            "venue" => Ok(Self::Venue),
            "team" => Ok(Self::Team),
            other => Err(CoreError::ParseError(format!("unknown resource kind: {other}"))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to exactly one bookable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResourceRef {
    Vehicle(Uuid),
    Venue(Uuid),
    Team(Uuid),
}

impl ResourceRef {
    #[must_use]
    pub const fn new(kind: ResourceKind, id: Uuid) -> Self {
        match kind {
            ResourceKind::Vehicle => Self::Vehicle(id),
            ResourceKind::Venue => Self::Venue(id),
            ResourceKind::Team => Self::Team(id),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Vehicle(_) => ResourceKind::Vehicle,
            Self::Venue(_) => ResourceKind::Venue,
            Self::Team(_) => ResourceKind::Team,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Vehicle(id) | Self::Venue(id) | Self::Team(id) => *id,
        }
    }

    /// Stable key used to serialize writers on the same resource.
    #[must_use]
    pub fn lock_key(&self) -> String {
        format!("{}:{}", self.kind(), self.id())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// What an assignment is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ownerType", content = "ownerId", rename_all = "lowercase")]
pub enum AssignmentOwner {
    Event(Uuid),
    Mission(Uuid),
}

/// Binding of one resource to an event or mission for a time window.
///
/// `event_id` is always the owning event, also for mission-level assignments,
/// so an event's whole set of bindings can be found without a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAssignment {
    pub id: Uuid,
    pub event_id: Uuid,
    pub mission_id: Option<Uuid>,
    pub resource: ResourceRef,
    pub window: TimeWindow,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResourceAssignment {
    #[must_use]
    pub const fn owner(&self) -> AssignmentOwner {
        match self.mission_id {
            Some(mission_id) => AssignmentOwner::Mission(mission_id),
            None => AssignmentOwner::Event(self.event_id),
        }
    }
}
