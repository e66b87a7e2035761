//! Persistence reconciliation: bidirectional mapping between the entity
//! graph and normalized storage rows.
//!
//! Every multi-row write sequence (saving a plan, deleting a plan,
//! reordering a day) runs inside a single database transaction, so a
//! failure partway through rolls the whole operation back.
//!
//! Ownership is checked on every operation that touches an existing row;
//! a row owned by someone else is reported as NotFound so existence never
//! leaks.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use wayfarer_db::models::{
    ActualCostRow, ItemType, ItineraryItemRow, LocationRow, PlanRow, TransportationRow,
};
use wayfarer_db::queries::{costs, days, items, locations, plans, transportations};

use crate::error::{Error, Result};
use crate::generate::payload::parse_item_time;
use crate::model::{ActualCost, Day, ItineraryItem, Location, Transportation, TravelPlan};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Sparse update for an itinerary item. Absent fields are left untouched.
///
/// `location`/`city` follow the flat shape clients submit: a non-empty
/// `location` resolves-or-creates a row by `(name, city)`; an empty string
/// clears the item's location reference. `start_time`/`end_time` use the
/// same empty-string-clears convention.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub item_type: Option<ItemType>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub estimated_cost: Option<f64>,
    pub estimated_cost_currency: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub position: Option<i32>,
}

/// Payload for a brand-new item inserted by the reorder endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItemRequest {
    pub item_type: ItemType,
    pub description: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub estimated_cost_currency: Option<String>,
    pub position: i32,
}

/// One `(item id, new position)` pair of a reorder request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemMove {
    pub item_id: Uuid,
    pub position: i32,
}

/// Sparse update for a transportation leg.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportationPatch {
    pub mode: Option<String>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub duration: Option<String>,
    pub estimated_cost: Option<f64>,
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Persist a whole plan graph inside a single transaction.
///
/// Insert order: plan, then per day its row, then per item (in array order)
/// its location on first sight of a `(name, city)` pair, the item row, and
/// finally its cost and transportation rows. Item positions are recomputed
/// from array order; whatever positions the draft carried are discarded.
///
/// Returns the graph as saved, with all foreign keys and positions filled
/// in.
pub async fn create_plan(pool: &PgPool, mut plan: TravelPlan) -> Result<TravelPlan> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    sqlx::query(
        "INSERT INTO plans (id, user_id, title, description, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(plan.id)
    .bind(plan.user_id)
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(plan.created_at)
    .execute(&mut *tx)
    .await?;

    // Working map from dedup key to the canonical stored location id.
    let mut location_ids: HashMap<(String, String), Uuid> = HashMap::new();

    for day in &mut plan.days {
        day.plan_id = Some(plan.id);
        sqlx::query("INSERT INTO days (id, plan_id, date) VALUES ($1, $2, $3)")
            .bind(day.id)
            .bind(plan.id)
            .bind(day.date)
            .execute(&mut *tx)
            .await?;

        for (index, item) in day.items.iter_mut().enumerate() {
            item.day_id = Some(day.id);
            item.position = index as i32;

            if let Some(location) = &mut item.location {
                let key = location.dedup_key();
                let id = match location_ids.get(&key) {
                    Some(id) => *id,
                    None => {
                        sqlx::query("INSERT INTO locations (id, name, city) VALUES ($1, $2, $3)")
                            .bind(location.id)
                            .bind(&location.name)
                            .bind(&location.city)
                            .execute(&mut *tx)
                            .await?;
                        location_ids.insert(key, location.id);
                        location.id
                    }
                };
                location.id = id;
                item.location_id = Some(id);
            } else {
                item.location_id = None;
            }

            sqlx::query(
                "INSERT INTO itinerary_items \
                 (id, day_id, location_id, item_type, description, start_time, end_time, \
                  estimated_cost, estimated_cost_currency, position) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(item.id)
            .bind(day.id)
            .bind(item.location_id)
            .bind(item.item_type)
            .bind(&item.description)
            .bind(item.start_time)
            .bind(item.end_time)
            .bind(item.estimated_cost)
            .bind(&item.estimated_cost_currency)
            .bind(item.position)
            .execute(&mut *tx)
            .await?;

            for cost in &mut item.actual_costs {
                cost.itinerary_item_id = Some(item.id);
                sqlx::query(
                    "INSERT INTO actual_costs (id, itinerary_item_id, name, amount, currency) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(cost.id)
                .bind(item.id)
                .bind(&cost.name)
                .bind(cost.amount)
                .bind(&cost.currency)
                .execute(&mut *tx)
                .await?;
            }

            for leg in &mut item.transportations {
                leg.itinerary_item_id = Some(item.id);
                sqlx::query(
                    "INSERT INTO transportations \
                     (id, itinerary_item_id, mode, start_location, end_location, duration, \
                      estimated_cost) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(leg.id)
                .bind(item.id)
                .bind(&leg.mode)
                .bind(&leg.start_location)
                .bind(&leg.end_location)
                .bind(&leg.duration)
                .bind(leg.estimated_cost)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    info!(plan_id = %plan.id, days = plan.days.len(), "plan saved");
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Fetch a plan owned by `user_id`, reassembled into the entity graph with
/// each day's items sorted by stored position.
pub async fn get_plan(pool: &PgPool, user_id: Uuid, plan_id: Uuid) -> Result<TravelPlan> {
    let row = plans::get_plan_row(pool, plan_id)
        .await
        .map_err(Error::Persistence)?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| Error::not_found(format!("plan {plan_id}")))?;

    assemble_plan(pool, row).await
}

/// All plans owned by a user, newest first, each fully reassembled.
pub async fn list_plans(pool: &PgPool, user_id: Uuid) -> Result<Vec<TravelPlan>> {
    let rows = plans::list_plan_rows_for_user(pool, user_id)
        .await
        .map_err(Error::Persistence)?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(assemble_plan(pool, row).await?);
    }
    Ok(result)
}

/// Reassemble one plan graph from its rows. Sharing relationships are
/// reconstructed by stored location id, not by recomputing dedup keys.
async fn assemble_plan(pool: &PgPool, plan_row: PlanRow) -> Result<TravelPlan> {
    let day_rows = days::list_day_rows_for_plan(pool, plan_row.id)
        .await
        .map_err(Error::Persistence)?;
    let day_ids: Vec<Uuid> = day_rows.iter().map(|d| d.id).collect();

    let item_rows = items::list_item_rows_for_days(pool, &day_ids)
        .await
        .map_err(Error::Persistence)?;
    let item_ids: Vec<Uuid> = item_rows.iter().map(|i| i.id).collect();

    let mut location_ids: Vec<Uuid> = item_rows.iter().filter_map(|i| i.location_id).collect();
    location_ids.sort_unstable();
    location_ids.dedup();

    let location_rows = locations::list_location_rows(pool, &location_ids)
        .await
        .map_err(Error::Persistence)?;
    let locations_by_id: HashMap<Uuid, LocationRow> =
        location_rows.into_iter().map(|l| (l.id, l)).collect();

    let cost_rows = costs::list_cost_rows_for_items(pool, &item_ids)
        .await
        .map_err(Error::Persistence)?;
    let mut costs_by_item: HashMap<Uuid, Vec<ActualCostRow>> = HashMap::new();
    for cost in cost_rows {
        costs_by_item
            .entry(cost.itinerary_item_id)
            .or_default()
            .push(cost);
    }

    let leg_rows = transportations::list_transportation_rows_for_items(pool, &item_ids)
        .await
        .map_err(Error::Persistence)?;
    let mut legs_by_item: HashMap<Uuid, Vec<TransportationRow>> = HashMap::new();
    for leg in leg_rows {
        legs_by_item.entry(leg.itinerary_item_id).or_default().push(leg);
    }

    let mut items_by_day: HashMap<Uuid, Vec<ItineraryItemRow>> = HashMap::new();
    for item in item_rows {
        items_by_day.entry(item.day_id).or_default().push(item);
    }

    let mut day_entities = Vec::with_capacity(day_rows.len());
    for day_row in day_rows {
        let mut item_entities: Vec<ItineraryItem> = items_by_day
            .remove(&day_row.id)
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                let location = row
                    .location_id
                    .and_then(|id| locations_by_id.get(&id))
                    .map(|l| Location {
                        id: l.id,
                        name: l.name.clone(),
                        city: l.city.clone(),
                    });
                let actual_costs = costs_by_item
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| ActualCost {
                        id: c.id,
                        itinerary_item_id: Some(c.itinerary_item_id),
                        name: c.name,
                        amount: c.amount,
                        currency: c.currency,
                    })
                    .collect();
                let legs = legs_by_item
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| Transportation {
                        id: t.id,
                        itinerary_item_id: Some(t.itinerary_item_id),
                        mode: t.mode,
                        start_location: t.start_location,
                        end_location: t.end_location,
                        duration: t.duration,
                        estimated_cost: t.estimated_cost,
                    })
                    .collect();

                ItineraryItem {
                    id: row.id,
                    day_id: Some(row.day_id),
                    item_type: row.item_type,
                    description: row.description,
                    start_time: row.start_time,
                    end_time: row.end_time,
                    location_id: row.location_id,
                    location,
                    estimated_cost: row.estimated_cost,
                    estimated_cost_currency: row.estimated_cost_currency,
                    actual_costs,
                    transportations: legs,
                    position: row.position,
                }
            })
            .collect();

        // Storage does not guarantee row order.
        item_entities.sort_by_key(|i| i.position);

        day_entities.push(Day {
            id: day_row.id,
            plan_id: Some(day_row.plan_id),
            date: day_row.date,
            items: item_entities,
        });
    }

    Ok(TravelPlan {
        id: plan_row.id,
        user_id: plan_row.user_id,
        title: plan_row.title,
        description: plan_row.description,
        created_at: plan_row.created_at,
        days: day_entities,
    })
}

// ---------------------------------------------------------------------------
// Delete path
// ---------------------------------------------------------------------------

/// Delete a plan and clean up locations left unreferenced, in one
/// transaction.
///
/// The plan row delete cascades to days, items, costs, and transportation
/// legs. Locations the plan referenced are then removed unless some
/// surviving item (of any plan) still points at them.
pub async fn delete_plan(pool: &PgPool, user_id: Uuid, plan_id: Uuid) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM plans WHERE id = $1")
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await?;
    match owner {
        Some((owner_id,)) if owner_id == user_id => {}
        _ => return Err(Error::not_found(format!("plan {plan_id}"))),
    }

    let referenced: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT DISTINCT i.location_id FROM itinerary_items i \
         JOIN days d ON d.id = i.day_id \
         WHERE d.plan_id = $1 AND i.location_id IS NOT NULL",
    )
    .bind(plan_id)
    .fetch_all(&mut *tx)
    .await?;
    let location_ids: Vec<Uuid> = referenced.into_iter().map(|(id,)| id).collect();

    sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;

    if !location_ids.is_empty() {
        sqlx::query(
            "DELETE FROM locations l \
             WHERE l.id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM itinerary_items i WHERE i.location_id = l.id)",
        )
        .bind(&location_ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    info!(%plan_id, "plan deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Ownership checks
// ---------------------------------------------------------------------------

async fn require_day_owned(pool: &PgPool, user_id: Uuid, day_id: Uuid) -> Result<()> {
    let owner: Option<(Uuid,)> = sqlx::query_as(
        "SELECT p.user_id FROM days d JOIN plans p ON p.id = d.plan_id WHERE d.id = $1",
    )
    .bind(day_id)
    .fetch_optional(pool)
    .await?;
    match owner {
        Some((owner_id,)) if owner_id == user_id => Ok(()),
        _ => Err(Error::not_found(format!("day {day_id}"))),
    }
}

async fn require_item_owned(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<()> {
    let owner: Option<(Uuid,)> = sqlx::query_as(
        "SELECT p.user_id FROM itinerary_items i \
         JOIN days d ON d.id = i.day_id \
         JOIN plans p ON p.id = d.plan_id \
         WHERE i.id = $1",
    )
    .bind(item_id)
    .fetch_optional(pool)
    .await?;
    match owner {
        Some((owner_id,)) if owner_id == user_id => Ok(()),
        _ => Err(Error::not_found(format!("itinerary item {item_id}"))),
    }
}

async fn require_cost_owned(pool: &PgPool, user_id: Uuid, cost_id: Uuid) -> Result<()> {
    let owner: Option<(Uuid,)> = sqlx::query_as(
        "SELECT p.user_id FROM actual_costs c \
         JOIN itinerary_items i ON i.id = c.itinerary_item_id \
         JOIN days d ON d.id = i.day_id \
         JOIN plans p ON p.id = d.plan_id \
         WHERE c.id = $1",
    )
    .bind(cost_id)
    .fetch_optional(pool)
    .await?;
    match owner {
        Some((owner_id,)) if owner_id == user_id => Ok(()),
        _ => Err(Error::not_found(format!("actual cost {cost_id}"))),
    }
}

async fn require_transportation_owned(
    pool: &PgPool,
    user_id: Uuid,
    transportation_id: Uuid,
) -> Result<()> {
    let owner: Option<(Uuid,)> = sqlx::query_as(
        "SELECT p.user_id FROM transportations t \
         JOIN itinerary_items i ON i.id = t.itinerary_item_id \
         JOIN days d ON d.id = i.day_id \
         JOIN plans p ON p.id = d.plan_id \
         WHERE t.id = $1",
    )
    .bind(transportation_id)
    .fetch_optional(pool)
    .await?;
    match owner {
        Some((owner_id,)) if owner_id == user_id => Ok(()),
        _ => Err(Error::not_found(format!(
            "transportation {transportation_id}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Point updates
// ---------------------------------------------------------------------------

/// Apply a sparse update to an itinerary item.
///
/// A supplied location name is resolved-or-created by `(name, city)` with a
/// single lookup. Location and the two timestamps follow the same
/// three-valued convention: absent leaves the stored value alone, an empty
/// string clears it, anything else sets it.
pub async fn update_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    patch: ItemPatch,
) -> Result<ItineraryItemRow> {
    require_item_owned(pool, user_id, item_id).await?;

    if let Some(cost) = patch.estimated_cost {
        if cost < 0.0 {
            return Err(Error::validation("estimated cost must be non-negative"));
        }
    }

    let (start_touched, start_time) = resolve_time_change(patch.start_time.as_deref())?;
    let (end_touched, end_time) = resolve_time_change(patch.end_time.as_deref())?;

    let (location_touched, location_id) = match patch.location.as_deref() {
        None => (false, None),
        Some("") => (true, None),
        Some(name) => {
            let city = patch.city.as_deref().unwrap_or("Unknown");
            let mut conn = pool
                .acquire()
                .await
                .map_err(|e| Error::Persistence(e.into()))?;
            let id = locations::resolve_or_create_location(&mut conn, name, city)
                .await
                .map_err(Error::Persistence)?;
            (true, Some(id))
        }
    };

    let updated = sqlx::query_as::<_, ItineraryItemRow>(
        "UPDATE itinerary_items SET \
           item_type = COALESCE($2, item_type), \
           description = COALESCE($3, description), \
           start_time = CASE WHEN $4 THEN $5 ELSE start_time END, \
           end_time = CASE WHEN $6 THEN $7 ELSE end_time END, \
           estimated_cost = COALESCE($8, estimated_cost), \
           estimated_cost_currency = COALESCE($9, estimated_cost_currency), \
           position = COALESCE($10, position), \
           location_id = CASE WHEN $11 THEN $12 ELSE location_id END \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(item_id)
    .bind(patch.item_type)
    .bind(patch.description)
    .bind(start_touched)
    .bind(start_time)
    .bind(end_touched)
    .bind(end_time)
    .bind(patch.estimated_cost)
    .bind(patch.estimated_cost_currency)
    .bind(patch.position)
    .bind(location_touched)
    .bind(location_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("itinerary item {item_id}")))?;

    Ok(updated)
}

/// Three-valued timestamp change: `(touched, value)`. Absent leaves the
/// stored value alone, an empty string clears it.
fn resolve_time_change(raw: Option<&str>) -> Result<(bool, Option<NaiveDateTime>)> {
    match raw {
        None => Ok((false, None)),
        Some("") => Ok((true, None)),
        Some(s) => Ok((true, Some(parse_item_time(s)?))),
    }
}

fn parse_optional_time(raw: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(parse_item_time(s)?)),
    }
}

/// Delete an itinerary item. Cascades to its costs and transportation legs.
pub async fn delete_item(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<()> {
    require_item_owned(pool, user_id, item_id).await?;

    let removed = items::delete_item_row(pool, item_id)
        .await
        .map_err(Error::Persistence)?;
    if !removed {
        return Err(Error::not_found(format!("itinerary item {item_id}")));
    }
    Ok(())
}

/// Record an actual cost against an item.
pub async fn add_actual_cost(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    name: &str,
    amount: f64,
    currency: &str,
) -> Result<ActualCostRow> {
    if name.trim().is_empty() {
        return Err(Error::validation("cost name must not be empty"));
    }
    if amount < 0.0 {
        return Err(Error::validation("cost amount must be non-negative"));
    }

    require_item_owned(pool, user_id, item_id).await?;

    let row = costs::insert_cost_row(pool, Uuid::new_v4(), item_id, name, amount, currency)
        .await
        .map_err(Error::Persistence)?;
    Ok(row)
}

/// Delete an actual cost entry.
pub async fn delete_actual_cost(pool: &PgPool, user_id: Uuid, cost_id: Uuid) -> Result<()> {
    require_cost_owned(pool, user_id, cost_id).await?;

    let removed = costs::delete_cost_row(pool, cost_id)
        .await
        .map_err(Error::Persistence)?;
    if !removed {
        return Err(Error::not_found(format!("actual cost {cost_id}")));
    }
    Ok(())
}

/// Apply a sparse update to a transportation leg.
pub async fn update_transportation(
    pool: &PgPool,
    user_id: Uuid,
    transportation_id: Uuid,
    patch: TransportationPatch,
) -> Result<TransportationRow> {
    if let Some(cost) = patch.estimated_cost {
        if cost < 0.0 {
            return Err(Error::validation("estimated cost must be non-negative"));
        }
    }

    require_transportation_owned(pool, user_id, transportation_id).await?;

    let updated = sqlx::query_as::<_, TransportationRow>(
        "UPDATE transportations SET \
           mode = COALESCE($2, mode), \
           start_location = COALESCE($3, start_location), \
           end_location = COALESCE($4, end_location), \
           duration = COALESCE($5, duration), \
           estimated_cost = COALESCE($6, estimated_cost) \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(transportation_id)
    .bind(patch.mode)
    .bind(patch.start_location)
    .bind(patch.end_location)
    .bind(patch.duration)
    .bind(patch.estimated_cost)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found(format!("transportation {transportation_id}")))?;

    Ok(updated)
}

// ---------------------------------------------------------------------------
// Ordering protocol
// ---------------------------------------------------------------------------

/// Insert an optional new item into a day and resequence siblings, as one
/// transaction.
///
/// The final position assignment (new item, moved items, untouched items)
/// is validated for uniqueness before anything is written; a conflicting
/// assignment is rejected with a validation error. Returns the day's items
/// sorted by their new positions.
pub async fn insert_and_reorder(
    pool: &PgPool,
    user_id: Uuid,
    day_id: Uuid,
    new_item: Option<NewItemRequest>,
    moves: &[ItemMove],
) -> Result<Vec<ItineraryItemRow>> {
    require_day_owned(pool, user_id, day_id).await?;

    let existing = items::list_item_rows_for_day(pool, day_id)
        .await
        .map_err(Error::Persistence)?;

    // Project the final position assignment and check it is collision-free.
    let mut final_positions: HashMap<Uuid, i32> =
        existing.iter().map(|i| (i.id, i.position)).collect();
    for mv in moves {
        if !final_positions.contains_key(&mv.item_id) {
            return Err(Error::validation(format!(
                "item {} does not belong to day {day_id}",
                mv.item_id
            )));
        }
        final_positions.insert(mv.item_id, mv.position);
    }

    let new_item_id = new_item.as_ref().map(|_| Uuid::new_v4());
    if let (Some(id), Some(request)) = (new_item_id, new_item.as_ref()) {
        final_positions.insert(id, request.position);
    }

    let mut seen = std::collections::HashSet::new();
    for position in final_positions.values() {
        if !seen.insert(*position) {
            return Err(Error::validation(format!(
                "position {position} assigned more than once"
            )));
        }
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    if let (Some(id), Some(request)) = (new_item_id, new_item) {
        let start_time = parse_optional_time(request.start_time.as_deref())?;
        let end_time = parse_optional_time(request.end_time.as_deref())?;
        if request.estimated_cost < 0.0 {
            return Err(Error::validation("estimated cost must be non-negative"));
        }

        let location_id = match request.location.as_deref() {
            None | Some("") => None,
            Some(name) => {
                let city = request.city.as_deref().unwrap_or("Unknown");
                let id = locations::resolve_or_create_location(&mut *tx, name, city)
                    .await
                    .map_err(Error::Persistence)?;
                Some(id)
            }
        };

        sqlx::query(
            "INSERT INTO itinerary_items \
             (id, day_id, location_id, item_type, description, start_time, end_time, \
              estimated_cost, estimated_cost_currency, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(day_id)
        .bind(location_id)
        .bind(request.item_type)
        .bind(&request.description)
        .bind(start_time)
        .bind(end_time)
        .bind(request.estimated_cost)
        .bind(request.estimated_cost_currency.as_deref().unwrap_or("USD"))
        .bind(request.position)
        .execute(&mut *tx)
        .await?;
    }

    for mv in moves {
        sqlx::query("UPDATE itinerary_items SET position = $1 WHERE id = $2 AND day_id = $3")
            .bind(mv.position)
            .bind(mv.item_id)
            .bind(day_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::Persistence(e.into()))?;

    let mut rows = items::list_item_rows_for_day(pool, day_id)
        .await
        .map_err(Error::Persistence)?;
    rows.sort_by_key(|i| i.position);

    info!(%day_id, moved = moves.len(), "day resequenced");
    Ok(rows)
}
