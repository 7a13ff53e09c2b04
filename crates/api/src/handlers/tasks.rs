//! Handlers for the `/tasks` resource.
//!
//! Tasks carry the richest lifecycle: status transitions with stamping,
//! reassignment, time tracking, and comments. Detail and mutation are open
//! to admins and the assignee only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsdesk_core::access::{ensure_task_access, task_list_assignee};
use opsdesk_core::diff::{changed_fields, TASK_TRACKED_FIELDS};
use opsdesk_core::error::CoreError;
use opsdesk_core::lifecycle::{task_stamps, task_update_kind, TaskStamps, TaskUpdateKind};
use opsdesk_core::numbering::SequenceKind;
use opsdesk_core::pagination::parse_sort;
use opsdesk_core::status::{validate_task_transition, TaskStatus};
use opsdesk_core::types::{DbId, Timestamp};
use opsdesk_core::validation::{require_non_empty, validate_hours, validate_priority};
use opsdesk_db::models::task::{
    CommentView, CreateTask, Task, TaskComment, TaskFilter, TimeEntry, UpdateTask,
};
use opsdesk_db::models::user::UserSummary;
use opsdesk_db::repositories::{ProjectRepo, SequenceRepo, TaskRepo, UserRepo};
use opsdesk_events::payload::TaskPayload;
use opsdesk_events::types::{
    ENTITY_TASK, TASK_ASSIGNED, TASK_COMMENTED, TASK_CREATED, TASK_DELETED, TASK_REASSIGNED,
    TASK_STATUS_CHANGED, TASK_TIME_LOGGED, TASK_UPDATED,
};
use opsdesk_events::PlatformEvent;
use serde::Deserialize;
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::handlers::snapshot;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::query::{non_blank, StatusBody, TaskListParams};
use crate::response::{DataResponse, Empty, ListResponse};
use crate::state::AppState;

/// `sort` values accepted by `GET /tasks`.
const SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("dueDate", "due_date"),
    ("priority", "priority"),
    ("status", "status"),
    ("title", "title"),
    ("taskNumber", "task_number"),
];

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /tasks/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Request body for `PUT /tasks/{id}/time`.
#[derive(Debug, Deserialize)]
pub struct TimeEntryRequest {
    pub hours: Option<f64>,
    #[serde(default)]
    pub description: String,
    /// Defaults to now.
    pub date: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_task(state: &AppState, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Task", id))
}

fn payload(task: &Task) -> TaskPayload {
    TaskPayload {
        task_number: task.task_number.clone(),
        title: task.title.clone(),
        project: Some(task.project_id),
        assignee: task.assigned_to,
        ..Default::default()
    }
}

fn publish(state: &AppState, event_type: &str, task: &Task, actor: DbId, payload: TaskPayload) {
    state.publish(
        PlatformEvent::new(event_type)
            .with_source(ENTITY_TASK, task.id)
            .with_actor(actor)
            .with_payload(payload),
    );
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks
///
/// Non-admin callers only ever see their own tasks, whatever `assignedTo`
/// they ask for.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<TaskListParams>,
) -> AppResult<Json<ListResponse<Task>>> {
    if let Some(status) = &params.status {
        status.parse::<TaskStatus>()?;
    }
    if let Some(priority) = &params.priority {
        validate_priority(priority)?;
    }

    let page = params.page();
    let sort = parse_sort(params.sort.as_deref(), SORT_FIELDS);
    let filter = TaskFilter {
        status: params.status,
        project_id: params.project,
        priority: params.priority,
        assigned_to: task_list_assignee(&user.caller(), params.assigned_to),
        due_before: params.due_before,
        due_after: params.due_after,
        search: non_blank(params.search),
    };

    let tasks = TaskRepo::list(&state.pool, &filter, &page, &sort).await?;
    let total = TaskRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(tasks, &page, total)))
}

/// POST /api/v1/tasks
///
/// The project (and assignee, if any) must exist. After the insert the task
/// joins the project's task set and the assignee joins the team; those are
/// separate writes whose failure is logged, not returned.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    input.validate()?;
    if let Some(priority) = &input.priority {
        validate_priority(priority)?;
    }
    // A new task starts as `pending`; any other initial status must be one
    // step away from it.
    let initial = match &input.status {
        Some(status) => status.parse::<TaskStatus>()?,
        None => TaskStatus::Pending,
    };
    validate_task_transition(TaskStatus::Pending, initial)?;
    let stamps = task_stamps(TaskStatus::Pending, initial, None, chrono::Utc::now());

    let project = ProjectRepo::find_by_id(&state.pool, input.project_id)
        .await?
        .ok_or_else(|| not_found("Project", input.project_id))?;
    if let Some(assignee) = input.assigned_to {
        if !UserRepo::exists(&state.pool, assignee).await? {
            return Err(not_found("User", assignee));
        }
    }

    let task_number = match non_blank(input.task_number.clone()) {
        Some(number) => number,
        None => SequenceRepo::next_number(&state.pool, SequenceKind::Task, chrono::Utc::now())
            .await?,
    };

    let task = TaskRepo::create(&state.pool, &input, &task_number, &stamps, user.user_id).await?;
    tracing::info!(task_id = task.id, task_number = %task.task_number, user_id = user.user_id, "Task created");

    if let Err(e) = ProjectRepo::append_task(&state.pool, project.id, task.id).await {
        tracing::error!(error = %e, task_id = task.id, project_id = project.id, "Failed to link task to project");
    }
    if let Some(assignee) = task.assigned_to {
        match ProjectRepo::add_team_member(&state.pool, project.id, assignee).await {
            Ok(true) => {
                tracing::info!(project_id = project.id, user_id = assignee, "Assignee added to project team");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, project_id = project.id, user_id = assignee, "Failed to add assignee to project team");
            }
        }
    }

    publish(&state, TASK_CREATED, &task, user.user_id, payload(&task));
    if task.assigned_to.is_some() {
        publish(&state, TASK_ASSIGNED, &task, user.user_id, payload(&task));
    }

    Ok((StatusCode::CREATED, Json(DataResponse::new(task))))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = find_task(&state, id).await?;
    ensure_task_access(&user.caller(), task.assigned_to)?;
    Ok(Json(DataResponse::new(task)))
}

/// PUT /api/v1/tasks/{id}
///
/// Partial update. A reassignment emits only `task.reassigned`; any other
/// tracked change emits one `task.updated` listing every changed field.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    input.validate()?;
    let before = find_task(&state, id).await?;
    ensure_task_access(&user.caller(), before.assigned_to)?;

    if let Some(priority) = &input.priority {
        validate_priority(priority)?;
    }
    if let Some(project_id) = input.project_id {
        if ProjectRepo::find_by_id(&state.pool, project_id).await?.is_none() {
            return Err(not_found("Project", project_id));
        }
    }
    if let Some(assignee) = input.assigned_to {
        if !UserRepo::exists(&state.pool, assignee).await? {
            return Err(not_found("User", assignee));
        }
    }

    let stamps = match input.status.as_deref() {
        Some(raw) => {
            let from: TaskStatus = before.status.parse()?;
            let to: TaskStatus = raw.parse()?;
            validate_task_transition(from, to)?;
            task_stamps(from, to, before.started_at, chrono::Utc::now())
        }
        None => TaskStamps::default(),
    };

    let after = TaskRepo::update(&state.pool, id, &input, &stamps)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    if after.project_id != before.project_id {
        if let Err(e) = relink_project(&state, &after, before.project_id).await {
            tracing::error!(error = %e, task_id = id, "Failed to move task between project task sets");
        }
    }

    let changes = changed_fields(&snapshot(&before)?, &snapshot(&after)?, TASK_TRACKED_FIELDS);
    let lines: Vec<String> = changes.iter().map(|c| c.summary()).collect();
    match task_update_kind(&changes, before.assigned_to, after.assigned_to) {
        Some(TaskUpdateKind::Reassigned) => {
            tracing::info!(task_id = id, from = ?before.assigned_to, to = ?after.assigned_to, "Task reassigned");
            let payload = TaskPayload {
                previous_assignee: before.assigned_to,
                changes: lines,
                ..payload(&after)
            };
            publish(&state, TASK_REASSIGNED, &after, user.user_id, payload);
        }
        Some(TaskUpdateKind::Updated) => {
            tracing::info!(task_id = id, changed = changes.len(), "Task updated");
            let payload = TaskPayload {
                changes: lines,
                ..payload(&after)
            };
            publish(&state, TASK_UPDATED, &after, user.user_id, payload);
        }
        None => {}
    }

    Ok(Json(DataResponse::new(after)))
}

async fn relink_project(state: &AppState, task: &Task, old_project: DbId) -> Result<(), sqlx::Error> {
    ProjectRepo::remove_task(&state.pool, old_project, task.id).await?;
    ProjectRepo::append_task(&state.pool, task.project_id, task.id).await?;
    Ok(())
}

/// DELETE /api/v1/tasks/{id}
///
/// Soft delete; the task also leaves its project's task set.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Empty>>> {
    let task = find_task(&state, id).await?;
    if !TaskRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found("Task", id));
    }
    if let Err(e) = ProjectRepo::remove_task(&state.pool, task.project_id, id).await {
        tracing::error!(error = %e, task_id = id, "Failed to unlink deleted task from project");
    }
    tracing::info!(task_id = id, user_id = user.user_id, "Task deleted");

    publish(&state, TASK_DELETED, &task, user.user_id, payload(&task));
    Ok(Json(DataResponse::new(Empty::default())))
}

/// PUT /api/v1/tasks/{id}/status
///
/// The value must be a known status, `invoiced` is reserved for the
/// invoicing workflow, and the move must be in the transition table.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<StatusBody>,
) -> AppResult<Json<DataResponse<Task>>> {
    let to: TaskStatus = body.value()?.parse()?;
    let task = find_task(&state, id).await?;
    ensure_task_access(&user.caller(), task.assigned_to)?;

    let from: TaskStatus = task.status.parse()?;
    validate_task_transition(from, to)?;
    let stamps = task_stamps(from, to, task.started_at, chrono::Utc::now());

    let updated = TaskRepo::update_status(&state.pool, id, to.as_str(), &stamps)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    if from != to {
        tracing::info!(task_id = id, %from, %to, "Task status changed");
        let payload = TaskPayload {
            from_status: Some(from.to_string()),
            to_status: Some(to.to_string()),
            ..payload(&updated)
        };
        publish(&state, TASK_STATUS_CHANGED, &updated, user.user_id, payload);
    }

    Ok(Json(DataResponse::new(updated)))
}

/// POST /api/v1/tasks/{id}/comments
///
/// Appends a comment and returns it with the author populated.
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CommentView>>)> {
    let content = body.content.trim();
    require_non_empty("content", content)?;

    let task = find_task(&state, id).await?;
    ensure_task_access(&user.caller(), task.assigned_to)?;

    let comment = TaskComment::new(user.user_id, content.to_string(), chrono::Utc::now());
    let updated = TaskRepo::add_comment(&state.pool, id, &comment)
        .await?
        .ok_or_else(|| not_found("Task", id))?;

    let author = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .as_ref()
        .map(UserSummary::from);

    let payload = TaskPayload {
        comment: Some(comment.content.clone()),
        ..payload(&updated)
    };
    publish(&state, TASK_COMMENTED, &updated, user.user_id, payload);

    let view = CommentView {
        id: comment.id,
        content: comment.content,
        author,
        created_at: comment.created_at,
    };
    Ok((StatusCode::CREATED, Json(DataResponse::new(view))))
}

/// PUT /api/v1/tasks/{id}/time
///
/// Appends a time entry; `actualHours` is recomputed from every entry.
pub async fn log_time(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<TimeEntryRequest>,
) -> AppResult<Json<DataResponse<Task>>> {
    let hours = body
        .hours
        .ok_or_else(|| CoreError::Validation("hours is required".into()))?;
    validate_hours(hours)?;
    let description = body.description.trim();
    require_non_empty("description", description)?;

    let task = find_task(&state, id).await?;
    ensure_task_access(&user.caller(), task.assigned_to)?;

    let entry = TimeEntry {
        hours,
        description: description.to_string(),
        date: body.date.unwrap_or_else(chrono::Utc::now),
        user: user.user_id,
    };
    let updated = TaskRepo::add_time_entry(&state.pool, id, &entry)
        .await?
        .ok_or_else(|| not_found("Task", id))?;
    tracing::info!(
        task_id = id,
        hours,
        actual_hours = updated.time_tracking.actual_hours,
        "Time logged"
    );

    let payload = TaskPayload {
        hours: Some(hours),
        ..payload(&updated)
    };
    publish(&state, TASK_TIME_LOGGED, &updated, user.user_id, payload);

    Ok(Json(DataResponse::new(updated)))
}
