use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of an itinerary item.
///
/// The plan generator is restricted to the first four variants; `Flight`
/// only appears on manually constructed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum ItemType {
    Activity,
    Meal,
    Transportation,
    Hotel,
    Flight,
}

impl ItemType {
    /// The subset of item types the plan generator may emit.
    pub const GENERATED: &[ItemType] = &[
        Self::Activity,
        Self::Meal,
        Self::Transportation,
        Self::Hotel,
    ];
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Activity => "Activity",
            Self::Meal => "Meal",
            Self::Transportation => "Transportation",
            Self::Hotel => "Hotel",
            Self::Flight => "Flight",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemType {
    type Err = ItemTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Activity" => Ok(Self::Activity),
            "Meal" => Ok(Self::Meal),
            "Transportation" => Ok(Self::Transportation),
            "Hotel" => Ok(Self::Hotel),
            "Flight" => Ok(Self::Flight),
            other => Err(ItemTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ItemType`] string.
#[derive(Debug, Clone)]
pub struct ItemTypeParseError(pub String);

impl fmt::Display for ItemTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid item type: {:?}", self.0)
    }
}

impl std::error::Error for ItemTypeParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A local user row, created lazily on first sign-in. The id comes from the
/// external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
}

/// A travel plan -- the top-level unit of ownership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// One calendar day within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub date: NaiveDate,
}

/// A deduplicated place. Two rows describe the same place iff `(name, city)`
/// match exactly, but that identity is a save-time policy, not a constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

/// One entry within a day. `position` determines render order within the
/// day and is unique among siblings after a successful reorder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItineraryItemRow {
    pub id: Uuid,
    pub day_id: Uuid,
    pub location_id: Option<Uuid>,
    pub item_type: ItemType,
    pub description: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub estimated_cost: f64,
    pub estimated_cost_currency: String,
    pub position: i32,
}

/// A cost actually incurred against an item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActualCostRow {
    pub id: Uuid,
    pub itinerary_item_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub currency: String,
}

/// A transportation leg attached to an item. Endpoints are free text,
/// intentionally looser than the item's location reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransportationRow {
    pub id: Uuid,
    pub itinerary_item_id: Uuid,
    pub mode: String,
    pub start_location: String,
    pub end_location: String,
    pub duration: String,
    pub estimated_cost: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_display_roundtrip() {
        let variants = [
            ItemType::Activity,
            ItemType::Meal,
            ItemType::Transportation,
            ItemType::Hotel,
            ItemType::Flight,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: ItemType = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn item_type_invalid() {
        let result = "Teleport".parse::<ItemType>();
        assert!(result.is_err());
    }

    #[test]
    fn generated_subset_excludes_flight() {
        assert!(!ItemType::GENERATED.contains(&ItemType::Flight));
        assert_eq!(ItemType::GENERATED.len(), 4);
    }
}
