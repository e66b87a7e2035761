//! PostgreSQL access layer for wayfarer.
//!
//! Row models, per-table query helpers, pool construction, and embedded
//! migrations. Multi-row write sequences (saving a whole plan, deleting a
//! plan, reordering a day) live in `wayfarer-core`, which runs them inside a
//! single transaction.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
