//! Account registration, sign-in, and sign-out.
//!
//! Identity lives with the external provider; a successful sign-in lazily
//! upserts the local `users` row and opens an HMAC-signed cookie session.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use wayfarer_db::queries::users;

use crate::app::{AppError, AppState, CurrentUser};
use crate::session::SESSION_COOKIE;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn session_cookie(token: &str) -> HeaderMap {
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

fn clear_cookie() -> HeaderMap {
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

/// Create an account and sign the caller straight in.
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, HeaderMap, Json<Value>), AppError> {
    let user = state
        .auth
        .sign_up(&credentials.email, &credentials.password)
        .await?;
    users::ensure_user(&state.pool, user.id, &user.email).await?;

    let token = state.sessions.create(user.id, &user.email);
    info!(user_id = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        session_cookie(&token),
        Json(json!({ "user": { "id": user.id, "email": user.email } })),
    ))
}

/// Sign in and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(HeaderMap, Json<Value>), AppError> {
    let user = state
        .auth
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    users::ensure_user(&state.pool, user.id, &user.email).await?;

    let token = state.sessions.create(user.id, &user.email);
    info!(user_id = %user.id, "signed in");

    Ok((
        session_cookie(&token),
        Json(json!({ "user": { "id": user.id, "email": user.email } })),
    ))
}

/// Close the caller's session. Any staged draft dies with it, since the
/// session id is never handed out again.
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> (HeaderMap, Json<Value>) {
    state.drafts.discard(user.session_id);
    state.sessions.destroy(user.session_id);
    (clear_cookie(), Json(json!({ "message": "signed out" })))
}
