//! Domain logic for wayfarer.
//!
//! The entity graph model, the session draft store, the transactional
//! persistence reconciliation service, and the external collaborator
//! adapters (plan generation, speech-to-text).

pub mod draft;
pub mod error;
pub mod generate;
pub mod itinerary;
pub mod model;
pub mod speech;

pub use error::{Error, Result};
