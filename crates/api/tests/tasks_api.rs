//! HTTP-level tests for the task lifecycle.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, create_project, create_task, get, login_as, put_json};
use opsdesk_events::types::{TASK_ASSIGNED, TASK_CREATED, TASK_REASSIGNED, TASK_UPDATED};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn create_task_numbers_and_links_project(pool: PgPool) {
    let mut app = build_test_app(pool.clone());
    let (manager, token) = login_as(&pool, "mona", "manager").await;
    let (dev, _) = login_as(&pool, "dev", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &token, client.id, json!({})).await;

    let task = create_task(&app, &token, project_id, Some(dev.id)).await;

    assert!(task["taskNumber"].as_str().unwrap().starts_with("TSK-"));
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["createdBy"], manager.id);

    let project = body_json(get(&app, &format!("/api/v1/projects/{project_id}"), &token).await).await;
    assert_eq!(project["data"]["tasks"], json!([task["id"]]));

    let types: Vec<String> = app.drain_events().into_iter().map(|e| e.event_type).collect();
    assert!(types.contains(&TASK_CREATED.to_string()));
    assert!(types.contains(&TASK_ASSIGNED.to_string()));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn assignee_joins_team_exactly_once(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = login_as(&pool, "mona", "manager").await;
    let (dev, _) = login_as(&pool, "dev", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &token, client.id, json!({})).await;

    create_task(&app, &token, project_id, Some(dev.id)).await;
    create_task(&app, &token, project_id, Some(dev.id)).await;

    let project = body_json(get(&app, &format!("/api/v1/projects/{project_id}"), &token).await).await;
    assert_eq!(project["data"]["team"], json!([dev.id]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_task_for_missing_project_is_404(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = login_as(&pool, "mona", "manager").await;

    let response = common::post_json(
        &app,
        "/api/v1/tasks",
        &token,
        json!({ "title": "Orphan", "project": 999_999 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn initial_status_follows_the_transition_table(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = login_as(&pool, "mona", "manager").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &token, client.id, json!({})).await;
    let body = |status: &str| json!({ "title": "Spec", "project": project_id, "status": status });

    let response = common::post_json(&app, "/api/v1/tasks", &token, body("completed")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    let response = common::post_json(&app, "/api/v1/tasks", &token, body("invoiceable")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = common::post_json(&app, "/api/v1/tasks", &token, body("invoiced")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = common::post_json(&app, "/api/v1/tasks", &token, body("in-progress")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "in-progress");
    assert!(json["data"]["startedAt"].is_string());
    assert!(json["data"]["completedAt"].is_null());

    let listed = body_json(get(&app, "/api/v1/tasks?status=completed", &token).await).await;
    assert_eq!(listed["total"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn auto_numbers_skip_manually_chosen_ones(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, token) = login_as(&pool, "mona", "manager").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &token, client.id, json!({})).await;

    let first = create_task(&app, &token, project_id, None).await;
    let first_number = first["taskNumber"].as_str().unwrap().to_string();
    let (prefix, seq) = first_number.rsplit_once('-').unwrap();
    let manual = format!("{prefix}-{:03}", seq.parse::<u32>().unwrap() + 1);

    let response = common::post_json(
        &app,
        "/api/v1/tasks",
        &token,
        json!({ "title": "Manual", "project": project_id, "taskNumber": manual }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = common::post_json(
        &app,
        "/api/v1/tasks",
        &token,
        json!({ "title": "Auto", "project": project_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["taskNumber"],
        format!("{prefix}-{:03}", seq.parse::<u32>().unwrap() + 2)
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn staff_listing_is_pinned_to_own_tasks(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;
    let (bob, _) = login_as(&pool, "bob", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;

    create_task(&app, &admin_token, project_id, Some(alice.id)).await;
    create_task(&app, &admin_token, project_id, Some(bob.id)).await;

    // Asking for bob's tasks still yields only alice's.
    let response = get(&app, &format!("/api/v1/tasks?assignedTo={}", bob.id), &alice_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["assignedTo"], alice.id);

    let json = body_json(get(&app, "/api/v1/tasks", &admin_token).await).await;
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_assignee_or_admin_reads_a_task(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;
    let (_, bob_token) = login_as(&pool, "bob", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, Some(alice.id)).await;
    let uri = format!("/api/v1/tasks/{}", task["id"]);

    assert_eq!(get(&app, &uri, &alice_token).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, &admin_token).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, &bob_token).await.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reassignment_emits_only_the_reassigned_event(pool: PgPool) {
    let mut app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, _) = login_as(&pool, "alice", "staff").await;
    let (bob, _) = login_as(&pool, "bob", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, Some(alice.id)).await;
    app.drain_events();

    let response = put_json(
        &app,
        &format!("/api/v1/tasks/{}", task["id"]),
        &admin_token,
        json!({ "assignedTo": bob.id, "priority": "high" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["assignedTo"], bob.id);

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, TASK_REASSIGNED);
    assert!(events.iter().all(|e| e.event_type != TASK_UPDATED));
    assert_eq!(events[0].payload["previousAssignee"], alice.id);
    assert_eq!(events[0].payload["assignee"], bob.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unchanged_update_emits_nothing(pool: PgPool) {
    let mut app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, None).await;
    app.drain_events();

    let response = put_json(
        &app,
        &format!("/api/v1/tasks/{}", task["id"]),
        &admin_token,
        json!({ "title": "Draft schema" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.drain_events().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logged_time_accumulates(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, Some(alice.id)).await;
    let uri = format!("/api/v1/tasks/{}/time", task["id"]);

    put_json(&app, &uri, &alice_token, json!({ "hours": 1.5, "description": "Schema" })).await;
    let response =
        put_json(&app, &uri, &alice_token, json!({ "hours": 2.0, "description": "Review" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["timeTracking"]["actualHours"], 3.5);
    assert_eq!(json["data"]["timeTracking"]["entries"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn time_entry_validation(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, None).await;
    let uri = format!("/api/v1/tasks/{}/time", task["id"]);

    let missing = put_json(&app, &uri, &admin_token, json!({ "description": "x" })).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let zero = put_json(&app, &uri, &admin_token, json!({ "hours": 0, "description": "x" })).await;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let blank = put_json(&app, &uri, &admin_token, json!({ "hours": 1, "description": " " })).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_endpoint_enforces_transitions(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, None).await;
    let uri = format!("/api/v1/tasks/{}/status", task["id"]);

    let skip = put_json(&app, &uri, &admin_token, json!({ "status": "completed" })).await;
    assert_eq!(skip.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(skip).await["code"], "INVALID_TRANSITION");

    let invoiced = put_json(&app, &uri, &admin_token, json!({ "status": "invoiced" })).await;
    assert_eq!(invoiced.status(), StatusCode::BAD_REQUEST);

    let unknown = put_json(&app, &uri, &admin_token, json!({ "status": "done" })).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let start = put_json(&app, &uri, &admin_token, json!({ "status": "in-progress" })).await;
    assert_eq!(start.status(), StatusCode::OK);
    let json = body_json(start).await;
    assert_eq!(json["data"]["status"], "in-progress");
    assert!(json["data"]["startedAt"].is_string());

    let done = put_json(&app, &uri, &admin_token, json!({ "status": "completed" })).await;
    let json = body_json(done).await;
    assert_eq!(json["data"]["status"], "completed");
    assert!(json["data"]["completedAt"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn comment_returns_author_summary(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let (alice, alice_token) = login_as(&pool, "alice", "staff").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, Some(alice.id)).await;

    let response = common::post_json(
        &app,
        &format!("/api/v1/tasks/{}/comments", task["id"]),
        &alice_token,
        json!({ "content": "Looks good" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"], "Looks good");
    assert_eq!(json["data"]["author"]["id"], alice.id);
    assert_eq!(json["data"]["author"]["name"], "alice");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleted_task_leaves_project_task_set(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin_token) = login_as(&pool, "root", "admin").await;
    let client = common::seed_client(&pool, "Acme").await;
    let project_id = create_project(&app, &admin_token, client.id, json!({})).await;
    let task = create_task(&app, &admin_token, project_id, None).await;
    let uri = format!("/api/v1/tasks/{}", task["id"]);

    let response = common::delete(&app, &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get(&app, &uri, &admin_token).await.status(), StatusCode::NOT_FOUND);
    let project = body_json(get(&app, &format!("/api/v1/projects/{project_id}"), &admin_token).await).await;
    assert_eq!(project["data"]["tasks"], json!([]));
}
