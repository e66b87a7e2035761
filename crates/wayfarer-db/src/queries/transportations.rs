//! Database query functions for the `transportations` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::TransportationRow;

/// Fetch a transportation row by its id.
pub async fn get_transportation_row(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<TransportationRow>> {
    let leg = sqlx::query_as::<_, TransportationRow>("SELECT * FROM transportations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch transportation")?;

    Ok(leg)
}

/// List all transportation rows belonging to any of the given items.
pub async fn list_transportation_rows_for_items(
    pool: &PgPool,
    item_ids: &[Uuid],
) -> Result<Vec<TransportationRow>> {
    let legs = sqlx::query_as::<_, TransportationRow>(
        "SELECT * FROM transportations WHERE itinerary_item_id = ANY($1)",
    )
    .bind(item_ids)
    .fetch_all(pool)
    .await
    .context("failed to list transportations")?;

    Ok(legs)
}
