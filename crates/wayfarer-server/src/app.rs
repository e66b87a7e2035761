//! Application state, error mapping, and the HTTP router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use serde_json::json;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use wayfarer_core::Error;
use wayfarer_core::draft::DraftStore;
use wayfarer_core::generate::PlanGenerator;
use wayfarer_core::speech::SpeechTranscriber;

use crate::auth::AuthProvider;
use crate::handlers;
use crate::session::{SESSION_COOKIE, SessionStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub drafts: Arc<DraftStore>,
    pub sessions: Arc<SessionStore>,
    pub generator: Arc<dyn PlanGenerator>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub auth: Arc<dyn AuthProvider>,
}

/// Error type returned by all handlers, rendered as `{"error": msg}`.
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "authentication required".to_owned(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Collaborator(_) => StatusCode::BAD_GATEWAY,
            Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::from(Error::Persistence(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// The authenticated caller, extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;

        let token = cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value)
            .ok_or_else(AppError::unauthorized)?;

        let (session_id, session) = state
            .sessions
            .authenticate(token)
            .ok_or_else(AppError::unauthorized)?;

        Ok(CurrentUser {
            session_id,
            user_id: session.user_id,
            email: session.email,
        })
    }
}

/// Build the full API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/plans", get(handlers::plans::list_plans))
        .route("/api/plans/generate", post(handlers::plans::generate_plan))
        .route(
            "/api/plans/draft",
            get(handlers::plans::get_draft).delete(handlers::plans::discard_draft),
        )
        .route("/api/plans/save", post(handlers::plans::save_plan))
        .route(
            "/api/plans/{plan_id}",
            get(handlers::plans::get_plan).delete(handlers::plans::delete_plan),
        )
        .route(
            "/api/items/{item_id}",
            patch(handlers::items::update_item).delete(handlers::items::delete_item),
        )
        .route("/api/days/{day_id}/items", post(handlers::items::insert_and_reorder))
        .route("/api/items/{item_id}/costs", post(handlers::items::add_cost))
        .route("/api/costs/{cost_id}", delete(handlers::items::delete_cost))
        .route(
            "/api/transportations/{transportation_id}",
            patch(handlers::items::update_transportation),
        )
        .route("/api/voice/transcribe", post(handlers::voice::transcribe))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until interrupted.
pub async fn run_serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown handler");
    }
    info!("shutting down");
}
