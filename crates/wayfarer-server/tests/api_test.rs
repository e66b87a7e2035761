//! End-to-end API tests over the full router.
//!
//! Each test builds real application state against a temporary database,
//! with the in-memory identity provider and the hardcoded plan generator
//! standing in for the external collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use wayfarer_core::draft::DraftStore;
use wayfarer_core::generate::{MockGenerator, PlanGenerator, PlanPayload};
use wayfarer_core::speech::{SpeechTranscriber, UnconfiguredTranscriber};
use wayfarer_core::{Error, Result};
use wayfarer_server::app::{AppState, build_router};
use wayfarer_server::auth::MemoryAuthProvider;
use wayfarer_server::session::SessionStore;
use wayfarer_test_utils::{create_test_db, drop_test_db};

// -----------------------------------------------------------------------
// Test doubles and helpers
// -----------------------------------------------------------------------

/// Speech backend that reports the byte count instead of calling out.
struct CountingTranscriber;

#[async_trait]
impl SpeechTranscriber for CountingTranscriber {
    fn name(&self) -> &str {
        "counting"
    }

    async fn transcribe(&self, audio: &[u8], _sample_rate: u32, _language: &str) -> Result<String> {
        Ok(format!("{} bytes", audio.len()))
    }
}

/// Plan generator whose backend is down.
struct OutageGenerator;

#[async_trait]
impl PlanGenerator for OutageGenerator {
    fn name(&self) -> &str {
        "outage"
    }

    async fn generate(&self, _query: &str) -> Result<PlanPayload> {
        Err(Error::collaborator("model endpoint unavailable"))
    }
}

fn test_state(pool: PgPool, transcriber: Arc<dyn SpeechTranscriber>) -> AppState {
    AppState {
        pool,
        drafts: Arc::new(DraftStore::new()),
        sessions: Arc::new(SessionStore::with_random_secret()),
        generator: Arc::new(MockGenerator::new()),
        transcriber,
        auth: Arc::new(MemoryAuthProvider::new()),
    }
}

fn test_router(pool: PgPool) -> Router {
    build_router(test_state(pool, Arc::new(CountingTranscriber)))
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an account and return the session cookie to send back.
async fn register(app: &Router, email: &str) -> String {
    let resp = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("register should set a session cookie")
        .to_str()
        .unwrap();
    // Keep only the name=value pair.
    set_cookie
        .split(';')
        .next()
        .expect("cookie should have a value")
        .to_owned()
}

// -----------------------------------------------------------------------
// Auth
// -----------------------------------------------------------------------

#[tokio::test]
async fn register_login_logout_roundtrip() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());

    let cookie = register(&app, "trip@example.com").await;

    // The session works.
    let resp = send_json(&app, "GET", "/api/plans", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Sign in again on a fresh session.
    let resp = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "trip@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["user"]["email"], "trip@example.com");

    // Logout invalidates the first session.
    let resp = send_json(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send_json(&app, "GET", "/api/plans", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());

    register(&app, "trip@example.com").await;

    let resp = send_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "trip@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json.get("error").is_some(), "error body should be set");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unauthenticated_requests_get_401() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());

    for (method, uri) in [
        ("GET", "/api/plans"),
        ("POST", "/api/plans/save"),
        ("GET", "/api/plans/draft"),
    ] {
        let resp = send_json(&app, method, uri, None, None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // A forged cookie is as good as none.
    let resp = send_json(
        &app,
        "GET",
        "/api/plans",
        Some("wayfarer_session=deadbeef.deadbeef"),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// Generate, review, save
// -----------------------------------------------------------------------

#[tokio::test]
async fn generate_review_save_flow() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    // Generate stages a draft and returns it.
    let resp = send_json(
        &app,
        "POST",
        "/api/plans/generate",
        Some(&cookie),
        Some(json!({"query": "南京两日游"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let draft = body_json(resp).await;
    assert_eq!(draft["days"].as_array().unwrap().len(), 2);

    // Nothing persisted yet.
    let resp = send_json(&app, "GET", "/api/plans", Some(&cookie), None).await;
    assert_eq!(body_json(resp).await, json!([]));

    // The draft is reviewable.
    let resp = send_json(&app, "GET", "/api/plans/draft", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Save persists it.
    let resp = send_json(&app, "POST", "/api/plans/save", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved = body_json(resp).await;
    let plan_id = saved["id"].as_str().unwrap().to_owned();

    // A duplicate save finds the slot empty.
    let resp = send_json(&app, "POST", "/api/plans/save", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Read back: two days, items in position order, shared location
    // collapsed to one id.
    let resp = send_json(&app, "GET", &format!("/api/plans/{plan_id}"), Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let plan = body_json(resp).await;

    let days = plan["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    let first_day_items = days[0]["items"].as_array().unwrap();
    assert_eq!(first_day_items.len(), 4);
    let positions: Vec<i64> = first_day_items
        .iter()
        .map(|i| i["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);

    // Hotel check-in and lunch both happen at 新街口站.
    let hotel = first_day_items
        .iter()
        .find(|i| i["item_type"] == "Hotel")
        .expect("day one should have a hotel item");
    let meal = first_day_items
        .iter()
        .find(|i| i["item_type"] == "Meal")
        .expect("day one should have a meal item");
    assert_eq!(hotel["location"]["name"], "新街口站");
    assert_eq!(hotel["location"]["id"], meal["location"]["id"]);
    assert_eq!(hotel["estimated_cost"], 0.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    let resp = send_json(
        &app,
        "POST",
        "/api/plans/generate",
        Some(&cookie),
        Some(json!({"query": "   "})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn failed_generation_keeps_prior_draft() {
    let (pool, db_name) = create_test_db().await;
    let mut state = test_state(pool.clone(), Arc::new(CountingTranscriber));
    state.generator = Arc::new(OutageGenerator);
    let app = build_router(state.clone());
    let cookie = register(&app, "trip@example.com").await;

    // Stage a draft directly against the live session, then take the
    // backend down underneath a second generation attempt.
    let token = cookie.split_once('=').expect("cookie pair").1;
    let (session_id, session) = state.sessions.authenticate(token).expect("live session");
    let prior = MockGenerator::new()
        .generate("南京两日游")
        .await
        .expect("mock never fails")
        .into_plan(session.user_id)
        .expect("mock payload is valid");
    let prior_title = prior.title.clone();
    state.drafts.stage(session_id, prior);

    let resp = send_json(
        &app,
        "POST",
        "/api/plans/generate",
        Some(&cookie),
        Some(json!({"query": "换一个计划"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    // The failure left the slot untouched.
    let resp = send_json(&app, "GET", "/api/plans/draft", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let draft = body_json(resp).await;
    assert_eq!(draft["title"], prior_title.as_str());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn logout_discards_staged_draft() {
    let (pool, db_name) = create_test_db().await;
    let state = test_state(pool.clone(), Arc::new(CountingTranscriber));
    let app = build_router(state.clone());
    let cookie = register(&app, "trip@example.com").await;

    let resp = send_json(
        &app,
        "POST",
        "/api/plans/generate",
        Some(&cookie),
        Some(json!({"query": "南京两日游"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let token = cookie.split_once('=').expect("cookie pair").1;
    let (session_id, _) = state.sessions.authenticate(token).expect("live session");
    assert!(state.drafts.peek(session_id).is_some());

    let resp = send_json(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The dead session id can never come back, so its slot must be empty.
    assert!(state.drafts.peek(session_id).is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn discarded_draft_is_gone() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    let resp = send_json(
        &app,
        "POST",
        "/api/plans/generate",
        Some(&cookie),
        Some(json!({"query": "南京两日游"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send_json(&app, "DELETE", "/api/plans/draft", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send_json(&app, "GET", "/api/plans/draft", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send_json(&app, "POST", "/api/plans/save", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// Edits after save
// -----------------------------------------------------------------------

async fn save_mock_plan(app: &Router, cookie: &str) -> Value {
    let resp = send_json(
        app,
        "POST",
        "/api/plans/generate",
        Some(cookie),
        Some(json!({"query": "南京两日游"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send_json(app, "POST", "/api/plans/save", Some(cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

#[tokio::test]
async fn item_edit_and_cost_endpoints() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    let plan = save_mock_plan(&app, &cookie).await;
    let item_id = plan["days"][0]["items"][0]["id"].as_str().unwrap().to_owned();

    // Sparse patch touches only the description.
    let resp = send_json(
        &app,
        "PATCH",
        &format!("/api/items/{item_id}"),
        Some(&cookie),
        Some(json!({"description": "改乘地铁"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["description"], "改乘地铁");

    // Record and delete an actual cost.
    let resp = send_json(
        &app,
        "POST",
        &format!("/api/items/{item_id}/costs"),
        Some(&cookie),
        Some(json!({"name": "车票", "amount": 7.0, "currency": "CNY"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cost = body_json(resp).await;
    let cost_id = cost["id"].as_str().unwrap();

    let resp = send_json(
        &app,
        "DELETE",
        &format!("/api/costs/{cost_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Delete the item itself.
    let resp = send_json(
        &app,
        "DELETE",
        &format!("/api/items/{item_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send_json(
        &app,
        "PATCH",
        &format!("/api/items/{item_id}"),
        Some(&cookie),
        Some(json!({"description": "gone"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn reorder_endpoint_resequences_day() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    let plan = save_mock_plan(&app, &cookie).await;
    let day = &plan["days"][0];
    let day_id = day["id"].as_str().unwrap().to_owned();
    let items = day["items"].as_array().unwrap();
    let first = items[0]["id"].as_str().unwrap();
    let second = items[1]["id"].as_str().unwrap();

    // Swap the first two items and wedge a new one in at the end.
    let resp = send_json(
        &app,
        "POST",
        &format!("/api/days/{day_id}/items"),
        Some(&cookie),
        Some(json!({
            "new_item": {
                "item_type": "Activity",
                "description": "夜游秦淮河",
                "location": "夫子庙",
                "city": "南京",
                "position": 4
            },
            "moves": [
                {"item_id": first, "position": 1},
                {"item_id": second, "position": 0}
            ]
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["id"], second);
    assert_eq!(rows[1]["id"], first);
    assert_eq!(rows[4]["description"], "夜游秦淮河");

    // A colliding assignment is rejected outright.
    let resp = send_json(
        &app,
        "POST",
        &format!("/api/days/{day_id}/items"),
        Some(&cookie),
        Some(json!({
            "moves": [
                {"item_id": first, "position": 2},
                {"item_id": second, "position": 2}
            ]
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn plans_of_other_users_look_absent() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());

    let owner = register(&app, "owner@example.com").await;
    let other = register(&app, "other@example.com").await;

    let plan = save_mock_plan(&app, &owner).await;
    let plan_id = plan["id"].as_str().unwrap();
    let item_id = plan["days"][0]["items"][0]["id"].as_str().unwrap();

    let resp = send_json(&app, "GET", &format!("/api/plans/{plan_id}"), Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send_json(
        &app,
        "DELETE",
        &format!("/api/plans/{plan_id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send_json(
        &app,
        "PATCH",
        &format!("/api/items/{item_id}"),
        Some(&other),
        Some(json!({"description": "hijack"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// Voice
// -----------------------------------------------------------------------

#[tokio::test]
async fn transcribe_returns_text() {
    let (pool, db_name) = create_test_db().await;
    let app = test_router(pool.clone());
    let cookie = register(&app, "trip@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/voice/transcribe?sample_rate=16000&language=zh")
        .header(header::COOKIE, &cookie)
        .body(Body::from(vec![0u8; 320]))
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["text"], "320 bytes");

    // Empty audio never reaches the backend.
    let resp = send_json(&app, "POST", "/api/voice/transcribe", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unconfigured_speech_backend_returns_502() {
    let (pool, db_name) = create_test_db().await;
    let app = build_router(test_state(pool.clone(), Arc::new(UnconfiguredTranscriber)));
    let cookie = register(&app, "trip@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/voice/transcribe")
        .header(header::COOKIE, &cookie)
        .body(Body::from(vec![0u8; 32]))
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    pool.close().await;
    drop_test_db(&db_name).await;
}
