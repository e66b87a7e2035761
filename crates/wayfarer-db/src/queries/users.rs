//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserRow;

/// Fetch a user by id.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Insert the user row if it does not exist yet.
///
/// The id comes from the external identity provider; local rows are created
/// lazily on first successful sign-in.
pub async fn ensure_user(pool: &PgPool, id: Uuid, email: &str) -> Result<UserRow> {
    let user = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email \
         RETURNING *",
    )
    .bind(id)
    .bind(email)
    .fetch_one(pool)
    .await
    .context("failed to ensure user")?;

    Ok(user)
}
