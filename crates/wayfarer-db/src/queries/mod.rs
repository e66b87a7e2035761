//! Per-table query helpers.

pub mod costs;
pub mod days;
pub mod items;
pub mod locations;
pub mod plans;
pub mod transportations;
pub mod users;
