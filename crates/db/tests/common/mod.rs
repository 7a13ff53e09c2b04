//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use opsdesk_core::lifecycle::TaskStamps;
use opsdesk_db::models::client::{Client, CreateClient};
use opsdesk_db::models::project::{CreateProject, Project};
use opsdesk_db::models::task::{CreateTask, Task};
use opsdesk_db::models::user::{CreateUser, User};
use opsdesk_db::repositories::{ClientRepo, ProjectRepo, TaskRepo, UserRepo};
use sqlx::PgPool;

pub async fn seed_user(pool: &PgPool, email: &str, role: &str) -> User {
    let input = CreateUser {
        name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        password: "unused-in-repo-tests".to_string(),
        role: Some(role.to_string()),
    };
    UserRepo::create(pool, &input, "$argon2id$test-hash", role)
        .await
        .unwrap()
}

pub async fn seed_client(pool: &PgPool, name: &str) -> Client {
    let input = CreateClient {
        name: name.to_string(),
        email: None,
        phone: None,
        company: Some(format!("{name} Ltd")),
        address: None,
        contact_person: None,
        status: None,
    };
    ClientRepo::create(pool, &input).await.unwrap()
}

pub fn new_project(client_id: i64, name: &str) -> CreateProject {
    CreateProject {
        project_number: None,
        name: name.to_string(),
        description: None,
        client_id,
        manager_id: None,
        team: Vec::new(),
        status: None,
        budget: Some(10_000.0),
        start_date: None,
        end_date: None,
    }
}

pub async fn seed_project(pool: &PgPool, client_id: i64, number: &str, created_by: i64) -> Project {
    ProjectRepo::create(pool, &new_project(client_id, "Website rebuild"), number, created_by)
        .await
        .unwrap()
}

pub fn new_task(project_id: i64, assigned_to: Option<i64>, title: &str) -> CreateTask {
    CreateTask {
        task_number: None,
        title: title.to_string(),
        description: None,
        project_id,
        assigned_to,
        status: None,
        priority: None,
        due_date: None,
        estimated_hours: Some(4.0),
        tags: vec!["backend".to_string()],
    }
}

pub async fn seed_task(
    pool: &PgPool,
    project_id: i64,
    assigned_to: Option<i64>,
    number: &str,
    created_by: i64,
) -> Task {
    TaskRepo::create(
        pool,
        &new_task(project_id, assigned_to, "Draft schema"),
        number,
        &TaskStamps::default(),
        created_by,
    )
    .await
    .unwrap()
}
