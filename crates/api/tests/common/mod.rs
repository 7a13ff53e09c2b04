//! Shared fixtures for HTTP-level integration tests.
//!
//! Requests go straight to the router through `tower::ServiceExt::oneshot`,
//! without a TCP listener. Events published by handlers stay on the bus
//! until a test drains them, so side effects can be asserted without racing
//! background workers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use opsdesk_api::auth::jwt::{generate_access_token, JwtConfig};
use opsdesk_api::config::{LogFormat, ServerConfig};
use opsdesk_api::router::build_app_router;
use opsdesk_api::state::AppState;
use opsdesk_api::ws::WsManager;
use opsdesk_core::types::DbId;
use opsdesk_db::models::client::{Client, CreateClient};
use opsdesk_db::models::user::{CreateUser, User};
use opsdesk_db::repositories::{ClientRepo, UserRepo};
use opsdesk_events::{EventBus, PlatformEvent};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tower::ServiceExt;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgres://unused".to_string(),
        database_max_connections: 5,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Pretty,
        jwt: JwtConfig {
            secret: "test-secret-with-enough-length-for-hs256".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// The router plus a receiver subscribed before any request is sent.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub events: broadcast::Receiver<PlatformEvent>,
}

impl TestApp {
    /// Every event published since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let events = event_bus.subscribe();

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        events,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, name: &str, role: &str) -> User {
    let input = CreateUser {
        name: name.to_string(),
        email: format!("{name}@opsdesk.test"),
        password: "unused-in-api-tests".to_string(),
        role: Some(role.to_string()),
    };
    UserRepo::create(pool, &input, "$argon2id$test-hash", role)
        .await
        .unwrap()
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

/// Seed a user and return it with a valid bearer token.
pub async fn login_as(pool: &PgPool, name: &str, role: &str) -> (User, String) {
    let user = seed_user(pool, name, role).await;
    let token = token_for(&user);
    (user, token)
}

pub async fn seed_client(pool: &PgPool, name: &str) -> Client {
    let input = CreateClient {
        name: name.to_string(),
        email: None,
        phone: None,
        company: None,
        address: None,
        contact_person: None,
        status: None,
    };
    ClientRepo::create(pool, &input).await.unwrap()
}

/// Create a project over HTTP and return its id.
pub async fn create_project(app: &TestApp, token: &str, client_id: DbId, body: Value) -> DbId {
    let mut body = body;
    body["client"] = client_id.into();
    if body.get("name").is_none() {
        body["name"] = "Website rebuild".into();
    }
    let response = post_json(app, "/api/v1/projects", token, body).await;
    assert_eq!(response.status(), 201, "project creation failed");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a task over HTTP and return its body.
pub async fn create_task(
    app: &TestApp,
    token: &str,
    project_id: DbId,
    assigned_to: Option<DbId>,
) -> Value {
    let mut body = serde_json::json!({ "title": "Draft schema", "project": project_id });
    if let Some(assignee) = assigned_to {
        body["assignedTo"] = assignee.into();
    }
    let response = post_json(app, "/api/v1/tasks", token, body).await;
    assert_eq!(response.status(), 201, "task creation failed");
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &TestApp, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: &TestApp, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
