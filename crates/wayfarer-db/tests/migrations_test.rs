//! Integration tests for database migrations and the row-level query
//! helpers.
//!
//! Each test creates a unique temporary database within a shared PostgreSQL
//! container, runs migrations, and drops it on completion so tests are fully
//! isolated and idempotent.

use uuid::Uuid;

use wayfarer_db::models::ItemType;
use wayfarer_db::pool;
use wayfarer_db::queries::{costs, items, locations, users};
use wayfarer_test_utils::{create_test_db, drop_test_db};

/// Expected tables created by the initial migration.
const EXPECTED_TABLES: &[&str] = &[
    "actual_costs",
    "days",
    "itinerary_items",
    "locations",
    "plans",
    "transportations",
    "users",
];

#[tokio::test]
async fn migrations_create_all_tables() {
    let (pool, db_name) = create_test_db().await;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' \
         ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");

    // Filter out the sqlx metadata table.
    let user_tables: Vec<&str> = rows
        .iter()
        .map(|(name,)| name.as_str())
        .filter(|t| !t.starts_with("_sqlx"))
        .collect();

    assert_eq!(user_tables, EXPECTED_TABLES);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already ran migrations once; a second run is a no-op.
    pool::run_migrations(&pool)
        .await
        .expect("re-running migrations should succeed");

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_user_is_lazy_and_idempotent() {
    let (pool, db_name) = create_test_db().await;

    let id = Uuid::new_v4();
    assert!(users::get_user(&pool, id).await.expect("query").is_none());

    let created = users::ensure_user(&pool, id, "first@example.com")
        .await
        .expect("insert should succeed");
    assert_eq!(created.email, "first@example.com");

    // Signing in again with a changed email updates the row in place.
    let updated = users::ensure_user(&pool, id, "second@example.com")
        .await
        .expect("upsert should succeed");
    assert_eq!(updated.id, id);
    assert_eq!(updated.email, "second@example.com");

    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .expect("count should succeed");
    assert_eq!(n, 1);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn location_resolution_reuses_existing_rows() {
    let (pool, db_name) = create_test_db().await;

    let mut conn = pool.acquire().await.expect("acquire connection");
    let first = locations::resolve_or_create_location(&mut conn, "夫子庙", "南京")
        .await
        .expect("first resolve should insert");
    let second = locations::resolve_or_create_location(&mut conn, "夫子庙", "南京")
        .await
        .expect("second resolve should reuse");
    assert_eq!(first, second);

    // A different city is a different place.
    let elsewhere = locations::resolve_or_create_location(&mut conn, "夫子庙", "苏州")
        .await
        .expect("resolve should insert");
    assert_ne!(first, elsewhere);
    drop(conn);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn cascade_from_day_removes_items_and_costs() {
    let (pool, db_name) = create_test_db().await;

    let user_id = Uuid::new_v4();
    users::ensure_user(&pool, user_id, "cascade@example.com")
        .await
        .expect("user insert");

    let plan_id = Uuid::new_v4();
    sqlx::query("INSERT INTO plans (id, user_id, title) VALUES ($1, $2, 'p')")
        .bind(plan_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .expect("plan insert");

    let day_id = Uuid::new_v4();
    sqlx::query("INSERT INTO days (id, plan_id, date) VALUES ($1, $2, '2025-11-10')")
        .bind(day_id)
        .bind(plan_id)
        .execute(&pool)
        .await
        .expect("day insert");

    let item_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO itinerary_items (id, day_id, item_type, description) \
         VALUES ($1, $2, $3, 'walk')",
    )
    .bind(item_id)
    .bind(day_id)
    .bind(ItemType::Activity)
    .execute(&pool)
    .await
    .expect("item insert");

    costs::insert_cost_row(&pool, Uuid::new_v4(), item_id, "snack", 9.0, "CNY")
        .await
        .expect("cost insert");

    sqlx::query("DELETE FROM days WHERE id = $1")
        .bind(day_id)
        .execute(&pool)
        .await
        .expect("day delete");

    assert!(items::get_item_row(&pool, item_id).await.expect("query").is_none());
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actual_costs")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(n, 0);

    drop_test_db(&db_name).await;
}
