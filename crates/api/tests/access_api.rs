//! Authentication and role checks across the API surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, get, login_as, post_json, put_json, send};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_needs_no_token(pool: PgPool) {
    let app = build_test_app(pool);

    let response = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["dbHealthy"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_or_garbage_token_is_401(pool: PgPool) {
    let app = build_test_app(pool);

    let response = send(&app, Method::GET, "/api/v1/projects", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["success"], false);

    let response = get(&app, "/api/v1/projects", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn staff_cannot_manage_clients(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, staff_token) = login_as(&pool, "alice", "staff").await;
    let (_, manager_token) = login_as(&pool, "mona", "manager").await;

    let body = json!({ "name": "Initech" });
    let response = post_json(&app, "/api/v1/clients", &staff_token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(&app, "/api/v1/clients", &manager_token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, "/api/v1/clients", &staff_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn finance_routes_need_finance_role(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, staff_token) = login_as(&pool, "alice", "staff").await;
    let (_, manager_token) = login_as(&pool, "mona", "manager").await;
    let (_, finance_token) = login_as(&pool, "fin", "finance").await;

    for token in [&staff_token, &manager_token] {
        let response = get(&app, "/api/v1/finance/invoices", token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = get(&app, "/api/v1/finance/invoices", &finance_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn users_read_themselves_but_not_others(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;
    let (bob, _) = login_as(&pool, "bob", "staff").await;

    let response = get(&app, &format!("/api/v1/users/{}", alice.id), &alice_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "alice@opsdesk.test");
    assert!(json["data"].get("passwordHash").is_none());

    let response = get(&app, &format!("/api/v1/users/{}", bob.id), &alice_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/api/v1/users", &alice_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_user_token_stops_working(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;

    assert_eq!(get(&app, "/api/v1/tasks", &alice_token).await.status(), StatusCode::OK);

    let response = put_json(
        &app,
        &format!("/api/v1/users/{}/deactivate", alice.id),
        &admin_token,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "inactive");

    let response = get(&app, "/api/v1/tasks", &alice_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn demoted_user_loses_privileges_immediately(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (mona, mona_token) = login_as(&pool, "mona", "manager").await;

    let response = put_json(
        &app,
        &format!("/api/v1/users/{}", mona.id),
        &admin_token,
        json!({ "role": "staff" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token still claims "manager".
    let response = post_json(&app, "/api/v1/clients", &mona_token, json!({ "name": "Initech" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admins_cannot_deactivate_themselves(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (admin, admin_token) = login_as(&pool, "root", "admin").await;

    let response = put_json(
        &app,
        &format!("/api/v1/users/{}/deactivate", admin.id),
        &admin_token,
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_email_is_a_conflict(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    login_as(&pool, "alice", "staff").await;

    let response = post_json(
        &app,
        "/api/v1/users",
        &admin_token,
        json!({ "name": "Alice Again", "email": "alice@opsdesk.test", "password": "long-enough-password" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn activity_log_is_for_managers(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, staff_token) = login_as(&pool, "alice", "staff").await;
    let (_, manager_token) = login_as(&pool, "mona", "manager").await;

    assert_eq!(get(&app, "/api/v1/activities", &staff_token).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(get(&app, "/api/v1/activities", &manager_token).await.status(), StatusCode::OK);
}
