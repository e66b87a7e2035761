//! Database query functions for the `locations` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::LocationRow;

/// Fetch a location row by its id.
pub async fn get_location_row(pool: &PgPool, id: Uuid) -> Result<Option<LocationRow>> {
    let location = sqlx::query_as::<_, LocationRow>("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch location")?;

    Ok(location)
}

/// Fetch all location rows with the given ids.
pub async fn list_location_rows(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<LocationRow>> {
    let locations = sqlx::query_as::<_, LocationRow>("SELECT * FROM locations WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .context("failed to list locations")?;

    Ok(locations)
}

/// Find a location by its dedup key. When more than one row matches (possible
/// across separate saves), the first is returned.
pub async fn find_location_by_key(
    conn: &mut PgConnection,
    name: &str,
    city: &str,
) -> Result<Option<LocationRow>> {
    let location = sqlx::query_as::<_, LocationRow>(
        "SELECT * FROM locations WHERE name = $1 AND city = $2 LIMIT 1",
    )
    .bind(name)
    .bind(city)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to look up location by name and city")?;

    Ok(location)
}

/// Resolve a `(name, city)` pair to a location id, inserting a new row when
/// no match exists. Takes a connection so the resolution can run inside a
/// caller's transaction. One lookup per call; batched dedup during a plan
/// save uses an in-memory map instead.
pub async fn resolve_or_create_location(
    conn: &mut PgConnection,
    name: &str,
    city: &str,
) -> Result<Uuid> {
    if let Some(existing) = find_location_by_key(&mut *conn, name, city).await? {
        return Ok(existing.id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO locations (id, name, city) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(city)
        .execute(&mut *conn)
        .await
        .context("failed to insert location")?;

    Ok(id)
}
