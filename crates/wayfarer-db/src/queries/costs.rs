//! Database query functions for the `actual_costs` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ActualCostRow;

/// Insert an actual-cost row. Returns the inserted row.
pub async fn insert_cost_row(
    pool: &PgPool,
    id: Uuid,
    itinerary_item_id: Uuid,
    name: &str,
    amount: f64,
    currency: &str,
) -> Result<ActualCostRow> {
    let cost = sqlx::query_as::<_, ActualCostRow>(
        "INSERT INTO actual_costs (id, itinerary_item_id, name, amount, currency) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(id)
    .bind(itinerary_item_id)
    .bind(name)
    .bind(amount)
    .bind(currency)
    .fetch_one(pool)
    .await
    .context("failed to insert actual cost")?;

    Ok(cost)
}

/// Fetch a cost row by its id.
pub async fn get_cost_row(pool: &PgPool, id: Uuid) -> Result<Option<ActualCostRow>> {
    let cost = sqlx::query_as::<_, ActualCostRow>("SELECT * FROM actual_costs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch actual cost")?;

    Ok(cost)
}

/// List all cost rows belonging to any of the given items.
pub async fn list_cost_rows_for_items(
    pool: &PgPool,
    item_ids: &[Uuid],
) -> Result<Vec<ActualCostRow>> {
    let costs = sqlx::query_as::<_, ActualCostRow>(
        "SELECT * FROM actual_costs WHERE itinerary_item_id = ANY($1)",
    )
    .bind(item_ids)
    .fetch_all(pool)
    .await
    .context("failed to list actual costs")?;

    Ok(costs)
}

/// Delete a cost row. Returns whether a row was removed.
pub async fn delete_cost_row(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM actual_costs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete actual cost")?;

    Ok(result.rows_affected() > 0)
}
