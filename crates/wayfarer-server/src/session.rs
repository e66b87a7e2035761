//! HMAC-signed session tokens and the in-memory session registry.
//!
//! A token is `<session id>.<hmac-sha256 tag>`, both hex. The tag binds the
//! id to the server's secret, so a forged cookie fails verification before
//! the registry is ever consulted.

use std::collections::HashMap;
use std::sync::Mutex;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "wayfarer_session";

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

/// In-memory session registry plus the signing secret.
#[derive(Debug)]
pub struct SessionStore {
    secret: Vec<u8>,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// A store with a freshly generated random secret. Sessions do not
    /// survive restarts.
    pub fn with_random_secret() -> Self {
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    fn tag(&self, session_id: Uuid) -> String {
        // Key length is unrestricted for HMAC; new_from_slice cannot fail.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(session_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Open a session for a signed-in user and return its cookie token.
    pub fn create(&self, user_id: Uuid, email: impl Into<String>) -> String {
        let session_id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(
            session_id,
            Session {
                user_id,
                email: email.into(),
            },
        );
        format!("{}.{}", session_id.simple(), self.tag(session_id))
    }

    /// Verify a token and resolve its session.
    ///
    /// Returns `None` for a malformed token, a bad signature, or an id with
    /// no live session (e.g. after logout or a restart).
    pub fn authenticate(&self, token: &str) -> Option<(Uuid, Session)> {
        let (id_part, tag_part) = token.split_once('.')?;
        let session_id = Uuid::try_parse(id_part).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(session_id.as_bytes());
        let expected = hex::decode(tag_part).ok()?;
        mac.verify_slice(&expected).ok()?;

        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(&session_id)
            .cloned()
            .map(|session| (session_id, session))
    }

    /// Close a session. Safe to call for ids that are already gone.
    pub fn destroy(&self, session_id: Uuid) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_authenticate() {
        let store = SessionStore::new(b"session-test-secret".to_vec());
        let user_id = Uuid::new_v4();

        let token = store.create(user_id, "trip@example.com");
        let (_, session) = store.authenticate(&token).expect("token should verify");
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email, "trip@example.com");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let store = SessionStore::new(b"session-test-secret".to_vec());
        let token = store.create(Uuid::new_v4(), "trip@example.com");

        let mut forged = token.clone();
        forged.replace_range(0..1, if token.starts_with('0') { "1" } else { "0" });
        assert!(store.authenticate(&forged).is_none());

        assert!(store.authenticate("not-a-token").is_none());
        assert!(store.authenticate("").is_none());
    }

    #[test]
    fn token_from_another_store_is_rejected() {
        let a = SessionStore::new(b"secret-a".to_vec());
        let b = SessionStore::new(b"secret-b".to_vec());

        let token = a.create(Uuid::new_v4(), "trip@example.com");
        assert!(b.authenticate(&token).is_none());
    }

    #[test]
    fn destroy_invalidates_session() {
        let store = SessionStore::with_random_secret();
        let token = store.create(Uuid::new_v4(), "trip@example.com");

        let (session_id, _) = store.authenticate(&token).expect("token should verify");
        store.destroy(session_id);

        // Signature still checks out, but the session is gone.
        assert!(store.authenticate(&token).is_none());
    }
}
