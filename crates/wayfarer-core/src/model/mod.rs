//! The in-memory entity graph: plan -> day -> item -> location / costs /
//! transportation legs.
//!
//! Every entity generates its own UUIDv4 when not supplied, so a draft and
//! its saved form agree on ids before any row exists. All types serialize
//! to a flat JSON representation that round-trips field-for-field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfarer_db::models::ItemType;

/// Current time truncated to second precision, the granularity stored for
/// `created_at`.
pub fn now_seconds() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now)
}

fn default_currency() -> String {
    "USD".to_owned()
}

/// A user as known locally. The id is assigned by the external identity
/// provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// A complete travel plan with its ordered days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "now_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl TravelPlan {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            created_at: now_seconds(),
            days: Vec::new(),
        }
    }
}

/// One calendar day of a plan with its ordered items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub plan_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<ItineraryItem>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id: None,
            date,
            items: Vec::new(),
        }
    }
}

/// One entry within a day.
///
/// `position` is insertion order, not wall-clock order; it determines render
/// order and is the field the reorder protocol mutates. At save time it is
/// recomputed from the item's index within its day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub day_id: Option<Uuid>,
    pub item_type: ItemType,
    pub description: String,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default = "default_currency")]
    pub estimated_cost_currency: String,
    #[serde(default)]
    pub actual_costs: Vec<ActualCost>,
    #[serde(default)]
    pub transportations: Vec<Transportation>,
    #[serde(default)]
    pub position: i32,
}

impl ItineraryItem {
    pub fn new(item_type: ItemType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            day_id: None,
            item_type,
            description: description.into(),
            start_time: None,
            end_time: None,
            location_id: None,
            location: None,
            estimated_cost: 0.0,
            estimated_cost_currency: default_currency(),
            actual_costs: Vec::new(),
            transportations: Vec::new(),
            position: 0,
        }
    }
}

/// A place an item happens at. The name may be a well-known landmark
/// substituted for an exact address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

impl Location {
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            city: city.into(),
        }
    }

    /// The dedup key: two locations are the same entity iff `(name, city)`
    /// match exactly.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.clone(), self.city.clone())
    }
}

/// A cost actually incurred against an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualCost {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub itinerary_item_id: Option<Uuid>,
    pub name: String,
    pub amount: f64,
    pub currency: String,
}

impl ActualCost {
    pub fn new(name: impl Into<String>, amount: f64, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            itinerary_item_id: None,
            name: name.into(),
            amount,
            currency: currency.into(),
        }
    }
}

/// A transportation leg attached to an item. Endpoints are free text rather
/// than location references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transportation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub itinerary_item_id: Option<Uuid>,
    pub mode: String,
    pub start_location: String,
    pub end_location: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub estimated_cost: f64,
}
