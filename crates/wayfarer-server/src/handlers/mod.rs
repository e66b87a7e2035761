//! JSON API handlers.

pub mod auth;
pub mod items;
pub mod plans;
pub mod voice;

use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
