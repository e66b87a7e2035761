//! Database query functions for the `days` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DayRow;

/// Fetch a day row by its id.
pub async fn get_day_row(pool: &PgPool, id: Uuid) -> Result<Option<DayRow>> {
    let day = sqlx::query_as::<_, DayRow>("SELECT * FROM days WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch day")?;

    Ok(day)
}

/// List all day rows for a plan, ordered by date.
pub async fn list_day_rows_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<DayRow>> {
    let days =
        sqlx::query_as::<_, DayRow>("SELECT * FROM days WHERE plan_id = $1 ORDER BY date")
            .bind(plan_id)
            .fetch_all(pool)
            .await
            .context("failed to list days")?;

    Ok(days)
}
