//! Session-staged draft plans.
//!
//! A generated plan is held against the caller's session for review before
//! being committed. Each session owns a single slot:
//!
//! ```text
//! Empty -> Draft   (generation succeeds; a prior draft is overwritten)
//! Draft -> Empty   (save takes the draft, or the caller discards it)
//! ```
//!
//! Save removes the draft *before* persistence runs, so a duplicate save
//! request (double form submit) finds the slot empty and fails cleanly
//! instead of creating a second plan.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::TravelPlan;

/// In-memory store of staged drafts, keyed by session id.
#[derive(Debug, Default)]
pub struct DraftStore {
    slots: Mutex<HashMap<Uuid, TravelPlan>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a draft for a session, silently replacing any prior unsaved
    /// draft.
    pub fn stage(&self, session_id: Uuid, plan: TravelPlan) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(session_id, plan);
    }

    /// A copy of the session's current draft, for review.
    pub fn peek(&self, session_id: Uuid) -> Option<TravelPlan> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(&session_id).cloned()
    }

    /// Remove and return the session's draft.
    ///
    /// Errors with [`Error::NotFound`] when the slot is empty, which is what
    /// a duplicate save request observes.
    pub fn take(&self, session_id: Uuid) -> Result<TravelPlan> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .remove(&session_id)
            .ok_or_else(|| Error::not_found("draft plan"))
    }

    /// Discard the session's draft, if any.
    pub fn discard(&self, session_id: Uuid) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TravelPlan;

    fn plan(title: &str) -> TravelPlan {
        TravelPlan::new(Uuid::new_v4(), title, "")
    }

    #[test]
    fn stage_and_take() {
        let store = DraftStore::new();
        let session = Uuid::new_v4();

        store.stage(session, plan("first"));
        let taken = store.take(session).expect("draft should be present");
        assert_eq!(taken.title, "first");

        // Second take observes the empty slot.
        assert!(matches!(store.take(session), Err(Error::NotFound(_))));
    }

    #[test]
    fn new_generation_overwrites_prior_draft() {
        let store = DraftStore::new();
        let session = Uuid::new_v4();

        store.stage(session, plan("first"));
        store.stage(session, plan("second"));

        let taken = store.take(session).expect("draft should be present");
        assert_eq!(taken.title, "second");
    }

    #[test]
    fn peek_does_not_consume() {
        let store = DraftStore::new();
        let session = Uuid::new_v4();

        store.stage(session, plan("kept"));
        assert!(store.peek(session).is_some());
        assert!(store.peek(session).is_some());
        assert!(store.take(session).is_ok());
    }

    #[test]
    fn discard_empties_slot() {
        let store = DraftStore::new();
        let session = Uuid::new_v4();

        store.stage(session, plan("gone"));
        store.discard(session);
        assert!(store.peek(session).is_none());

        // Discarding an empty slot is a no-op.
        store.discard(session);
    }

    #[test]
    fn slots_are_per_session() {
        let store = DraftStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.stage(a, plan("a"));
        store.stage(b, plan("b"));

        assert_eq!(store.take(a).expect("a staged").title, "a");
        assert_eq!(store.take(b).expect("b staged").title, "b");
    }
}
