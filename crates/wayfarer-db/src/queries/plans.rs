//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlanRow;

/// Fetch a plan row by its id.
pub async fn get_plan_row(pool: &PgPool, id: Uuid) -> Result<Option<PlanRow>> {
    let plan = sqlx::query_as::<_, PlanRow>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List all plan rows owned by a user, newest first.
pub async fn list_plan_rows_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<PlanRow>> {
    let plans = sqlx::query_as::<_, PlanRow>(
        "SELECT * FROM plans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(plans)
}
