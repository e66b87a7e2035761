//! Point edits to a saved plan: items, actual costs, transportation legs,
//! and the insert-and-reorder protocol for a day.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use wayfarer_core::itinerary::{
    self, ItemMove, ItemPatch, NewItemRequest, TransportationPatch,
};
use wayfarer_db::models::{ActualCostRow, ItineraryItemRow, TransportationRow};

use crate::app::{AppError, AppState, CurrentUser};

/// Sparse update of one itinerary item.
pub async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<ItineraryItemRow>, AppError> {
    let row = itinerary::update_item(&state.pool, user.user_id, item_id, patch).await?;
    Ok(Json(row))
}

pub async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    itinerary::delete_item(&state.pool, user.user_id, item_id).await?;
    Ok(Json(json!({ "message": "item deleted" })))
}

/// Body of the insert-and-reorder request: an optional new item plus the
/// position moves for existing items of the day.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub new_item: Option<NewItemRequest>,
    #[serde(default)]
    pub moves: Vec<ItemMove>,
}

/// Insert an item into a day and resequence its siblings in one shot.
/// Returns the day's items in their final order.
pub async fn insert_and_reorder(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(day_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<ItineraryItemRow>>, AppError> {
    let rows = itinerary::insert_and_reorder(
        &state.pool,
        user.user_id,
        day_id,
        request.new_item,
        &request.moves,
    )
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct NewCostRequest {
    pub name: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_owned()
}

/// Record a cost actually incurred against an item.
pub async fn add_cost(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(request): Json<NewCostRequest>,
) -> Result<(StatusCode, Json<ActualCostRow>), AppError> {
    let row = itinerary::add_actual_cost(
        &state.pool,
        user.user_id,
        item_id,
        &request.name,
        request.amount,
        &request.currency,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete_cost(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(cost_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    itinerary::delete_actual_cost(&state.pool, user.user_id, cost_id).await?;
    Ok(Json(json!({ "message": "cost deleted" })))
}

/// Sparse update of one transportation leg.
pub async fn update_transportation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(transportation_id): Path<Uuid>,
    Json(patch): Json<TransportationPatch>,
) -> Result<Json<TransportationRow>, AppError> {
    let row =
        itinerary::update_transportation(&state.pool, user.user_id, transportation_id, patch)
            .await?;
    Ok(Json(row))
}
