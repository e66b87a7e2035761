//! Plan lifecycle: generate, review, save-or-discard, read, delete.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use wayfarer_core::error::Error;
use wayfarer_core::itinerary;
use wayfarer_core::model::TravelPlan;

use crate::app::{AppError, AppState, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
}

/// Generate a draft plan from a natural-language query and stage it against
/// the caller's session. Nothing is persisted until save.
pub async fn generate_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<TravelPlan>, AppError> {
    if request.query.trim().is_empty() {
        return Err(Error::validation("query must not be empty").into());
    }

    let payload = state.generator.generate(&request.query).await?;

    // A payload that fails entity validation is the backend's fault, not the
    // caller's.
    let plan = payload.into_plan(user.user_id).map_err(|err| match err {
        Error::Validation(msg) => Error::collaborator(format!("generated plan was invalid: {msg}")),
        other => other,
    })?;

    state.drafts.stage(user.session_id, plan.clone());
    info!(user_id = %user.user_id, generator = state.generator.name(), "draft staged");
    Ok(Json(plan))
}

/// The caller's currently staged draft, if any.
pub async fn get_draft(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TravelPlan>, AppError> {
    let draft = state
        .drafts
        .peek(user.session_id)
        .ok_or_else(|| Error::not_found("draft plan"))?;
    Ok(Json(draft))
}

/// Throw away the staged draft.
pub async fn discard_draft(State(state): State<AppState>, user: CurrentUser) -> Json<Value> {
    state.drafts.discard(user.session_id);
    Json(json!({ "message": "draft discarded" }))
}

/// Persist the staged draft and return it as saved.
///
/// The draft is taken out of the slot before persistence runs; a duplicate
/// save request finds the slot empty and gets a 404 instead of a second
/// plan.
pub async fn save_plan(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TravelPlan>, AppError> {
    let draft = state.drafts.take(user.session_id)?;
    let saved = itinerary::create_plan(&state.pool, draft).await?;
    Ok(Json(saved))
}

/// All of the caller's plans, newest first.
pub async fn list_plans(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<TravelPlan>>, AppError> {
    let plans = itinerary::list_plans(&state.pool, user.user_id).await?;
    Ok(Json(plans))
}

/// One plan, fully reassembled, with each day's items in stored order.
pub async fn get_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<TravelPlan>, AppError> {
    let plan = itinerary::get_plan(&state.pool, user.user_id, plan_id).await?;
    Ok(Json(plan))
}

/// Delete a plan and any locations it alone referenced.
pub async fn delete_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    itinerary::delete_plan(&state.pool, user.user_id, plan_id).await?;
    Ok(Json(json!({ "message": "plan deleted" })))
}
