//! The wire schema for generated (and user-submitted) plan payloads.
//!
//! Raw payloads are validated here, at the boundary, and converted into the
//! entity graph. Locations sharing a `(name, city)` pair within one payload
//! collapse to a single [`Location`] instance, so the draft already carries
//! the sharing the save step persists.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfarer_db::models::ItemType;

use crate::error::{Error, Result};
use crate::model::{Day, ItineraryItem, Location, TravelPlan};

fn default_city() -> String {
    "Unknown".to_owned()
}

fn default_currency() -> String {
    "USD".to_owned()
}

/// Root payload: one whole travel plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub days: Vec<DayPayload>,
}

/// One day of a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPayload {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

/// One itinerary entry of a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPayload {
    pub item_type: String,
    pub description: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<LocationPayload>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default = "default_currency")]
    pub estimated_cost_currency: String,
}

/// A place reference within a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPayload {
    pub name: String,
    #[serde(default = "default_city")]
    pub city: String,
}

/// Parse an item timestamp, `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_item_time(raw: &str) -> Result<NaiveDateTime> {
    raw.parse::<NaiveDateTime>()
        .map_err(|_| Error::validation(format!("invalid timestamp {raw:?}")))
}

impl PlanPayload {
    /// Validate the payload and build the entity graph for `user_id`.
    ///
    /// Rejects with [`Error::Validation`] on an empty title, an empty day
    /// list, an unknown item type, an unparsable date or timestamp, or a
    /// negative estimated cost. Items sharing a `(name, city)` pair end up
    /// referencing the same [`Location`] instance.
    pub fn into_plan(self, user_id: Uuid) -> Result<TravelPlan> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("plan title must not be empty"));
        }
        if self.days.is_empty() {
            return Err(Error::validation("plan must contain at least one day"));
        }

        let mut plan = TravelPlan::new(user_id, self.title, self.description);
        let mut locations: HashMap<(String, String), Location> = HashMap::new();

        for day_payload in self.days {
            let date = day_payload
                .date
                .parse::<NaiveDate>()
                .map_err(|_| Error::validation(format!("invalid date {:?}", day_payload.date)))?;
            let mut day = Day::new(date);

            for (index, item_payload) in day_payload.items.into_iter().enumerate() {
                let item_type: ItemType = item_payload
                    .item_type
                    .parse()
                    .map_err(|_| {
                        Error::validation(format!(
                            "invalid item type {:?}",
                            item_payload.item_type
                        ))
                    })?;

                if item_payload.description.trim().is_empty() {
                    return Err(Error::validation("item description must not be empty"));
                }
                if item_payload.estimated_cost < 0.0 {
                    return Err(Error::validation("estimated cost must be non-negative"));
                }

                let mut item = ItineraryItem::new(item_type, item_payload.description);
                item.position = index as i32;
                item.estimated_cost = item_payload.estimated_cost;
                item.estimated_cost_currency = item_payload.estimated_cost_currency;

                if let Some(raw) = item_payload.start_time.as_deref() {
                    item.start_time = Some(parse_item_time(raw)?);
                }
                if let Some(raw) = item_payload.end_time.as_deref() {
                    item.end_time = Some(parse_item_time(raw)?);
                }

                if let Some(loc) = item_payload.location {
                    if loc.name.trim().is_empty() {
                        return Err(Error::validation("location name must not be empty"));
                    }
                    let shared = locations
                        .entry((loc.name.clone(), loc.city.clone()))
                        .or_insert_with(|| Location::new(loc.name, loc.city));
                    item.location_id = Some(shared.id);
                    item.location = Some(shared.clone());
                }

                day.items.push(item);
            }

            plan.days.push(day);
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_json() -> serde_json::Value {
        serde_json::json!({
            "title": "南京两日游",
            "description": "周末短途",
            "days": [
                {
                    "date": "2025-11-10",
                    "items": [
                        {
                            "item_type": "Hotel",
                            "description": "抵达酒店",
                            "start_time": "2025-11-10T10:00:00",
                            "end_time": "2025-11-10T11:00:00",
                            "location": {"name": "新街口站", "city": "南京"},
                            "estimated_cost": 4.0,
                            "estimated_cost_currency": "CNY"
                        },
                        {
                            "item_type": "Meal",
                            "description": "酒店附近午餐",
                            "location": {"name": "新街口站", "city": "南京"},
                            "estimated_cost": 60.0,
                            "estimated_cost_currency": "CNY"
                        }
                    ]
                },
                {
                    "date": "2025-11-11",
                    "items": [
                        {
                            "item_type": "Activity",
                            "description": "参观总统府",
                            "location": {"name": "总统府", "city": "南京"},
                            "estimated_cost": 37.0,
                            "estimated_cost_currency": "CNY"
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn valid_payload_builds_plan() {
        let payload: PlanPayload = serde_json::from_value(payload_json()).expect("parse");
        let plan = payload.into_plan(Uuid::new_v4()).expect("valid");

        assert_eq!(plan.title, "南京两日游");
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.days[0].items.len(), 2);
        assert_eq!(plan.days[0].items[0].position, 0);
        assert_eq!(plan.days[0].items[1].position, 1);
        assert!(plan.days[0].items[0].start_time.is_some());
    }

    #[test]
    fn shared_location_collapses_to_one_instance() {
        let payload: PlanPayload = serde_json::from_value(payload_json()).expect("parse");
        let plan = payload.into_plan(Uuid::new_v4()).expect("valid");

        let first = plan.days[0].items[0].location.as_ref().expect("location");
        let second = plan.days[0].items[1].location.as_ref().expect("location");
        assert_eq!(first.id, second.id);

        let third = plan.days[1].items[0].location.as_ref().expect("location");
        assert_ne!(first.id, third.id);
    }

    #[test]
    fn empty_title_rejected() {
        let mut json = payload_json();
        json["title"] = serde_json::json!("  ");
        let payload: PlanPayload = serde_json::from_value(json).expect("parse");
        assert!(matches!(
            payload.into_plan(Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn unknown_item_type_rejected() {
        let mut json = payload_json();
        json["days"][0]["items"][0]["item_type"] = serde_json::json!("Teleport");
        let payload: PlanPayload = serde_json::from_value(json).expect("parse");
        assert!(matches!(
            payload.into_plan(Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bad_date_rejected() {
        let mut json = payload_json();
        json["days"][0]["date"] = serde_json::json!("11/10/2025");
        let payload: PlanPayload = serde_json::from_value(json).expect("parse");
        assert!(matches!(
            payload.into_plan(Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn bad_timestamp_rejected() {
        let mut json = payload_json();
        json["days"][0]["items"][0]["start_time"] = serde_json::json!("ten in the morning");
        let payload: PlanPayload = serde_json::from_value(json).expect("parse");
        assert!(matches!(
            payload.into_plan(Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn negative_cost_rejected() {
        let mut json = payload_json();
        json["days"][0]["items"][0]["estimated_cost"] = serde_json::json!(-1.0);
        let payload: PlanPayload = serde_json::from_value(json).expect("parse");
        assert!(matches!(
            payload.into_plan(Uuid::new_v4()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn city_defaults_to_unknown() {
        let json = serde_json::json!({"name": "somewhere"});
        let loc: LocationPayload = serde_json::from_value(json).expect("parse");
        assert_eq!(loc.city, "Unknown");
    }
}
