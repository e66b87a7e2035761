//! HTTP server for wayfarer: router, session auth, identity-provider
//! client, and the JSON API handlers.

pub mod app;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod session;
