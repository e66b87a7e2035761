//! Database query functions for the `itinerary_items` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ItineraryItemRow;

/// Fetch an item row by its id.
pub async fn get_item_row(pool: &PgPool, id: Uuid) -> Result<Option<ItineraryItemRow>> {
    let item =
        sqlx::query_as::<_, ItineraryItemRow>("SELECT * FROM itinerary_items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch itinerary item")?;

    Ok(item)
}

/// List all item rows for a day. Row order is unspecified; callers sort by
/// `position`.
pub async fn list_item_rows_for_day(
    pool: &PgPool,
    day_id: Uuid,
) -> Result<Vec<ItineraryItemRow>> {
    let items =
        sqlx::query_as::<_, ItineraryItemRow>("SELECT * FROM itinerary_items WHERE day_id = $1")
            .bind(day_id)
            .fetch_all(pool)
            .await
            .context("failed to list itinerary items for day")?;

    Ok(items)
}

/// List all item rows belonging to any of the given days.
pub async fn list_item_rows_for_days(
    pool: &PgPool,
    day_ids: &[Uuid],
) -> Result<Vec<ItineraryItemRow>> {
    let items = sqlx::query_as::<_, ItineraryItemRow>(
        "SELECT * FROM itinerary_items WHERE day_id = ANY($1)",
    )
    .bind(day_ids)
    .fetch_all(pool)
    .await
    .context("failed to list itinerary items for days")?;

    Ok(items)
}

/// Delete an item row. Returns whether a row was removed.
pub async fn delete_item_row(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM itinerary_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete itinerary item")?;

    Ok(result.rows_affected() > 0)
}
