//! The plan-generation collaborator.
//!
//! A free-text travel query goes in; a nested plan payload comes back. The
//! payload is validated against an explicit schema at the boundary before
//! any entity is constructed.
//!
//! Implementations: [`OpenAiGenerator`] calls an OpenAI-compatible
//! chat-completions endpoint; [`MockGenerator`] returns a hardcoded
//! itinerary and is used when no API key is configured, and in tests.

mod mock;
mod openai;
pub mod payload;

pub use mock::MockGenerator;
pub use openai::OpenAiGenerator;
pub use payload::{DayPayload, ItemPayload, LocationPayload, PlanPayload};

use async_trait::async_trait;

use crate::error::Result;

/// Adapter interface for plan generation backends.
///
/// Object-safe so it can be stored as `Arc<dyn PlanGenerator>` in server
/// state and swapped for a test double.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Human-readable name for this backend (e.g. "openai", "mock").
    fn name(&self) -> &str;

    /// Generate a plan payload from a natural-language query.
    ///
    /// Fails with [`crate::Error::Collaborator`] when the backend errors,
    /// times out, or returns something that is not a plan payload.
    async fn generate(&self, query: &str) -> Result<PlanPayload>;
}

// Compile-time assertion: the trait must remain object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanGenerator) {}
};
