//! The identity-provider collaborator.
//!
//! Sign-in and sign-up are delegated to an external provider; the core only
//! ever sees a `(user id, email)` pair. Local `users` rows are created
//! lazily on first successful sign-in.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use wayfarer_core::error::{Error, Result};

/// A user as reported by the identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Adapter interface for identity providers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Human-readable name for this provider (e.g. "gotrue", "memory").
    fn name(&self) -> &str;

    /// Authenticate an existing account. Bad credentials fail with
    /// [`Error::Validation`]; transport problems with
    /// [`Error::Collaborator`].
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Register a new account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn AuthProvider) {}
};

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(Error::validation("a valid email address is required"));
    }
    if password.len() < 6 {
        return Err(Error::validation(
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GoTrue-style HTTP provider
// ---------------------------------------------------------------------------

/// Identity provider speaking the GoTrue password-grant API (as exposed by
/// Supabase auth).
#[derive(Debug, Clone)]
pub struct HttpAuthProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HttpAuthProvider {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::collaborator(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
        })
    }

    /// Extract `(id, email)` from a provider response; the user object is
    /// nested under `user` for sign-in and top-level for sign-up.
    fn parse_user(value: &Value) -> Result<AuthUser> {
        let user = value.get("user").unwrap_or(value);
        let id = user
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::try_parse(s).ok())
            .ok_or_else(|| Error::collaborator("identity provider response had no user id"))?;
        let email = user
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Ok(AuthUser { id, email })
    }

    async fn post_credentials(&self, url: &str, email: &str, password: &str) -> Result<AuthUser> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .map_err(|e| Error::collaborator(format!("identity provider unreachable: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(Error::validation("invalid email or password"));
        }
        if !status.is_success() {
            return Err(Error::collaborator(format!(
                "identity provider returned status {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::collaborator(format!("invalid identity response: {e}")))?;
        Self::parse_user(&body)
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    fn name(&self) -> &str {
        "gotrue"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        self.post_credentials(&url, email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let url = format!("{}/auth/v1/signup", self.base_url);
        self.post_credentials(&url, email, password).await
    }
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

/// Accounts held in process memory. For local development and tests; nothing
/// survives a restart.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, (Uuid, String)>>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        match accounts.get(email) {
            Some((id, stored)) if stored == password => Ok(AuthUser {
                id: *id,
                email: email.to_owned(),
            }),
            _ => Err(Error::validation("invalid email or password")),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        validate_credentials(email, password)?;
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        if accounts.contains_key(email) {
            return Err(Error::validation("this email is already registered"));
        }
        let id = Uuid::new_v4();
        accounts.insert(email.to_owned(), (id, password.to_owned()));
        Ok(AuthUser {
            id,
            email: email.to_owned(),
        })
    }
}
