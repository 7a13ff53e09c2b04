//! Integration tests for project reference sets and soft delete.

mod common;

use chrono::Utc;
use common::{new_project, seed_client, seed_project, seed_task, seed_user};
use opsdesk_core::pagination::{PageRequest, SortOrder};
use opsdesk_db::models::project::{ProjectFilter, ProjectNote};
use opsdesk_db::repositories::{ClientRepo, ProjectRepo};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_team_append_is_idempotent(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let staff = seed_user(&pool, "staff@opsdesk.test", "staff").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;
    assert!(project.team.is_empty());

    assert!(ProjectRepo::add_team_member(&pool, project.id, staff.id).await.unwrap());
    assert!(!ProjectRepo::add_team_member(&pool, project.id, staff.id).await.unwrap());

    let project = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(project.team, vec![staff.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_collapses_duplicate_team_members(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let staff = seed_user(&pool, "staff@opsdesk.test", "staff").await;
    let client = seed_client(&pool, "Acme").await;

    let mut input = new_project(client.id, "Audit");
    input.team = vec![staff.id, admin.id, staff.id];
    let project = ProjectRepo::create(&pool, &input, "PRJ-2610-001", admin.id)
        .await
        .unwrap();
    assert_eq!(project.team, vec![staff.id, admin.id]);

    assert!(ProjectRepo::remove_team_member(&pool, project.id, staff.id).await.unwrap());
    assert!(!ProjectRepo::remove_team_member(&pool, project.id, staff.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_task_set_tracks_created_tasks(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;
    let task = seed_task(&pool, project.id, None, "TSK-2610-001", admin.id).await;

    assert!(ProjectRepo::append_task(&pool, project.id, task.id).await.unwrap());
    assert!(!ProjectRepo::append_task(&pool, project.id, task.id).await.unwrap());
    let project = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(project.tasks, vec![task.id]);

    assert!(ProjectRepo::remove_task(&pool, project.id, task.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notes_are_appended(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;

    let note = |content: &str| ProjectNote {
        content: content.to_string(),
        author: admin.id,
        created_at: Utc::now(),
    };
    ProjectRepo::append_notes(&pool, project.id, &[note("kickoff")])
        .await
        .unwrap();
    let project = ProjectRepo::append_notes(&pool, project.id, &[note("scope agreed")])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(project.notes.len(), 2);
    assert_eq!(project.notes[0].content, "kickoff");
    assert_eq!(project.notes[1].author, admin.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_member_filter_covers_manager_and_team(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let staff = seed_user(&pool, "staff@opsdesk.test", "staff").await;
    let client = seed_client(&pool, "Acme").await;

    let mut managed = new_project(client.id, "Managed");
    managed.manager_id = Some(staff.id);
    ProjectRepo::create(&pool, &managed, "PRJ-2610-001", admin.id)
        .await
        .unwrap();
    let joined = seed_project(&pool, client.id, "PRJ-2610-002", admin.id).await;
    ProjectRepo::add_team_member(&pool, joined.id, staff.id)
        .await
        .unwrap();
    seed_project(&pool, client.id, "PRJ-2610-003", admin.id).await;

    let filter = ProjectFilter {
        member: Some(staff.id),
        ..Default::default()
    };
    assert_eq!(ProjectRepo::count(&pool, &filter).await.unwrap(), 2);
    assert_eq!(
        ProjectRepo::count(&pool, &ProjectFilter::default()).await.unwrap(),
        3
    );

    let sort = SortOrder {
        column: "name",
        descending: false,
    };
    let page = ProjectRepo::list(&pool, &filter, &PageRequest::new(Some(1), Some(1)), &sort)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "Managed");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_deleted_project_still_references_client(pool: PgPool) {
    let admin = seed_user(&pool, "admin@opsdesk.test", "admin").await;
    let client = seed_client(&pool, "Acme").await;
    let project = seed_project(&pool, client.id, "PRJ-2610-001", admin.id).await;

    assert!(ProjectRepo::soft_delete(&pool, project.id).await.unwrap());
    assert!(!ProjectRepo::soft_delete(&pool, project.id).await.unwrap());
    assert!(ProjectRepo::find_by_id(&pool, project.id).await.unwrap().is_none());
    assert!(ProjectRepo::find_by_id_include_deleted(&pool, project.id)
        .await
        .unwrap()
        .is_some());

    assert!(ClientRepo::is_referenced(&pool, client.id).await.unwrap());
    let unused = seed_client(&pool, "Unused").await;
    assert!(!ClientRepo::is_referenced(&pool, unused.id).await.unwrap());
    assert!(ClientRepo::delete(&pool, unused.id).await.unwrap());
}
