//! Shared fixtures: an in-memory database, a session manager with a cheap bcrypt cost,
//! and the full application as `main.rs` assembles it.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use chrono::Duration;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use taskgate::auth::{SessionManager, TokenCodec};
use taskgate::{db, routes};

pub const TEST_SECRET: &[u8] = b"integration_test_secret";

#[derive(Clone)]
pub struct TestState {
    pub pool: SqlitePool,
    pub sessions: SessionManager,
}

pub async fn test_state() -> TestState {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to run migrations");

    let codec = TokenCodec::new(TEST_SECRET, Duration::minutes(15), Duration::hours(24));
    let sessions =
        SessionManager::new(pool.clone(), codec, 4).expect("Failed to build session manager");
    TestState { pool, sessions }
}

pub async fn init_app(
    state: &TestState,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state.pool.clone()))
            .app_data(web::Data::new(state.sessions.clone()))
            .configure(routes::config),
    )
    .await
}

/// Registers `login` and returns the token pair from the response body.
pub async fn register(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    login: &str,
    password: &str,
) -> Value {
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "login": login, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    test::read_body_json(resp).await
}

pub async fn authenticate(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    login: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/authenticate")
        .set_json(json!({ "login": login, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    let body: Value = test::read_body_json(resp).await;
    body["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
