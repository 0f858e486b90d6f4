use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::status::EventStatus;
use crate::money::currency_amount;
use crate::window::TimeWindow;

/// Discriminant of [`Pricing`], as stored and exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingType {
    MissionBased,
    FixedPrice,
}

impl PricingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissionBased => "MISSION_BASED",
            Self::FixedPrice => "FIXED_PRICE",
        }
    }
}

impl FromStr for PricingType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MISSION_BASED" => Ok(Self::MissionBased),
            "FIXED_PRICE" => Ok(Self::FixedPrice),
            other => Err(CoreError::ParseError(format!("unknown pricing type: {other}"))),
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an event is billed.
///
/// A mission-based event carries only the derived total; a fixed-price event
/// carries only its price. The other amount cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pricingType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pricing {
    MissionBased {
        #[serde(rename = "totalFare")]
        total_fare: Decimal,
    },
    FixedPrice {
        #[serde(rename = "fixedPrice")]
        fixed_price: Decimal,
    },
}

impl Pricing {
    /// Mission-based pricing with nothing summed yet.
    #[must_use]
    pub fn mission_based() -> Self {
        Self::MissionBased {
            total_fare: Decimal::new(0, 2),
        }
    }

    #[must_use]
    pub const fn pricing_type(&self) -> PricingType {
        match self {
            Self::MissionBased { .. } => PricingType::MissionBased,
            Self::FixedPrice { .. } => PricingType::FixedPrice,
        }
    }

    #[must_use]
    pub const fn total_fare(&self) -> Option<Decimal> {
        match self {
            Self::MissionBased { total_fare } => Some(*total_fare),
            Self::FixedPrice { .. } => None,
        }
    }

    #[must_use]
    pub const fn fixed_price(&self) -> Option<Decimal> {
        match self {
            Self::FixedPrice { fixed_price } => Some(*fixed_price),
            Self::MissionBased { .. } => None,
        }
    }

    /// ## Summary
    /// Rebuilds pricing from its stored columns.
    ///
    /// ## Errors
    /// Returns `CoreError::InvariantViolation` when a fixed-price event has no price.
    pub fn from_parts(
        pricing_type: PricingType,
        fixed_price: Option<Decimal>,
        total_fare: Option<Decimal>,
    ) -> CoreResult<Self> {
        match pricing_type {
            PricingType::MissionBased => Ok(Self::MissionBased {
                total_fare: total_fare.unwrap_or_else(|| Decimal::new(0, 2)),
            }),
            PricingType::FixedPrice => fixed_price
                .map(|fixed_price| Self::FixedPrice { fixed_price })
                .ok_or(CoreError::InvariantViolation(
                    "fixed-price event without a fixed price",
                )),
        }
    }
}

/// A client engagement with a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub client_id: Uuid,
    pub window: TimeWindow,
    pub status: EventStatus,
    pub location: Option<String>,
    #[serde(flatten)]
    pub pricing: Pricing,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub const fn pricing_type(&self) -> PricingType {
        self.pricing.pricing_type()
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Input for creating an event; the id, status and timestamps are assigned on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub client_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub pricing_type: PricingType,
    pub fixed_price: Option<Decimal>,
    pub notes: Option<String>,
}

impl NewEvent {
    /// ## Summary
    /// Validates the payload and builds a `PLANNED` event with the given id.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` for a blank title, an inverted window,
    /// pricing fields that do not match the pricing type, or a fixed price that
    /// is negative or does not fit a stored amount.
    pub fn into_event(self, id: Uuid, now: DateTime<Utc>) -> CoreResult<Event> {
        if self.title.trim().is_empty() {
            return Err(CoreError::ValidationError("event title is required".into()));
        }
        let window = TimeWindow::new(self.start_date, self.end_date)?;
        let pricing = match (self.pricing_type, self.fixed_price) {
            (PricingType::FixedPrice, Some(price)) => Pricing::FixedPrice {
                fixed_price: currency_amount("fixed price", price)?,
            },
            (PricingType::FixedPrice, None) => {
                return Err(CoreError::ValidationError(
                    "fixed-price event requires a fixed price".into(),
                ));
            }
            (PricingType::MissionBased, Some(_)) => {
                return Err(CoreError::ValidationError(
                    "mission-based event must not carry a fixed price".into(),
                ));
            }
            (PricingType::MissionBased, None) => Pricing::mission_based(),
        };

        Ok(Event {
            id,
            title: self.title,
            client_id: self.client_id,
            window,
            status: EventStatus::Planned,
            location: self.location,
            pricing,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        })
    }
}
