//! Handlers for the `/projects` resource.
//!
//! Staff only see projects they manage or belong to. The budget is redacted
//! for callers without finance visibility. Status changes follow the project
//! transition table; the status endpoint also accepts the legacy labels.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsdesk_core::access::{
    ensure_project_modify, ensure_project_view, project_list_member, sees_budget, Caller,
};
use opsdesk_core::diff::{changed_fields, PROJECT_TRACKED_FIELDS};
use opsdesk_core::error::CoreError;
use opsdesk_core::lifecycle::completion_percentage;
use opsdesk_core::numbering::SequenceKind;
use opsdesk_core::pagination::parse_sort;
use opsdesk_core::status::{validate_project_transition, ProjectStatus, TaskStatus};
use opsdesk_core::types::DbId;
use opsdesk_db::models::project::{
    CreateProject, DocumentInput, NoteInput, Project, ProjectDocument, ProjectFilter, ProjectNote,
    UpdateProject,
};
use opsdesk_db::repositories::{ClientRepo, ProjectRepo, SequenceRepo, TaskRepo, UserRepo};
use opsdesk_events::payload::ProjectPayload;
use opsdesk_events::types::{
    ENTITY_PROJECT, PROJECT_CREATED, PROJECT_DELETED, PROJECT_STATUS_CHANGED, PROJECT_UPDATED,
};
use opsdesk_events::PlatformEvent;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::handlers::snapshot;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::query::{non_blank, ProjectListParams, StatusBody};
use crate::response::{DataResponse, Empty, ListResponse};
use crate::state::AppState;

const SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("name", "name"),
    ("status", "status"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
    ("projectNumber", "project_number"),
];

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /projects/{id}/team`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRequest {
    pub user_id: DbId,
}

/// Project detail with derived progress.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub completion_percentage: u8,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Project", id))
}

fn redact(mut project: Project, caller: &Caller) -> Project {
    if !sees_budget(caller) {
        project.budget = None;
    }
    project
}

/// Every id in `ids` must name an existing user.
async fn ensure_users_exist(state: &AppState, ids: &[DbId]) -> AppResult<()> {
    for &id in ids {
        if !UserRepo::exists(&state.pool, id).await? {
            return Err(not_found("User", id));
        }
    }
    Ok(())
}

fn payload(project: &Project) -> ProjectPayload {
    ProjectPayload {
        project_number: project.project_number.clone(),
        name: project.name.clone(),
        ..Default::default()
    }
}

fn publish(state: &AppState, event_type: &str, project: &Project, actor: DbId, payload: ProjectPayload) {
    state.publish(
        PlatformEvent::new(event_type)
            .with_source(ENTITY_PROJECT, project.id)
            .with_actor(actor)
            .with_payload(payload),
    );
}

fn stamped_notes(notes: &[NoteInput], author: DbId) -> AppResult<Vec<ProjectNote>> {
    let now = chrono::Utc::now();
    notes
        .iter()
        .map(|note| {
            note.validate()?;
            Ok(ProjectNote {
                content: note.content.trim().to_string(),
                author,
                created_at: now,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ProjectListParams>,
) -> AppResult<Json<ListResponse<Project>>> {
    if let Some(status) = &params.status {
        status.parse::<ProjectStatus>()?;
    }
    let caller = user.caller();
    let page = params.page();
    let sort = parse_sort(params.sort.as_deref(), SORT_FIELDS);
    let filter = ProjectFilter {
        status: params.status,
        client_id: params.client,
        member: project_list_member(&caller),
        search: non_blank(params.search),
    };

    let projects = ProjectRepo::list(&state.pool, &filter, &page, &sort).await?;
    let total = ProjectRepo::count(&state.pool, &filter).await?;
    let projects = projects.into_iter().map(|p| redact(p, &caller)).collect();
    Ok(Json(ListResponse::new(projects, &page, total)))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    if let Some(status) = &input.status {
        status.parse::<ProjectStatus>()?;
    }
    if !ClientRepo::exists(&state.pool, input.client_id).await? {
        return Err(not_found("Client", input.client_id));
    }
    if let Some(manager) = input.manager_id {
        ensure_users_exist(&state, &[manager]).await?;
    }
    ensure_users_exist(&state, &input.team).await?;

    let project_number = match non_blank(input.project_number.clone()) {
        Some(number) => number,
        None => {
            SequenceRepo::next_number(&state.pool, SequenceKind::Project, chrono::Utc::now())
                .await?
        }
    };

    let project = ProjectRepo::create(&state.pool, &input, &project_number, user.user_id).await?;
    tracing::info!(
        project_id = project.id,
        project_number = %project.project_number,
        user_id = user.user_id,
        "Project created"
    );

    publish(&state, PROJECT_CREATED, &project, user.user_id, payload(&project));
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(redact(project, &user.caller()))),
    ))
}

/// GET /api/v1/projects/{id}
///
/// Enriched with `completionPercentage`.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let caller = user.caller();
    let project = find_project(&state, id).await?;
    ensure_project_view(&caller, project.manager_id, &project.team)?;

    let statuses: Vec<TaskStatus> = TaskRepo::statuses_for_project(&state.pool, id)
        .await?
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    Ok(Json(DataResponse::new(ProjectDetail {
        project: redact(project, &caller),
        completion_percentage: completion_percentage(&statuses),
    })))
}

/// PUT /api/v1/projects/{id}
///
/// Partial update. `notes` entries are appended with the caller as author.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.validate()?;
    let caller = user.caller();
    let before = find_project(&state, id).await?;
    ensure_project_modify(&caller, before.manager_id, &before.team)?;

    if let Some(client_id) = input.client_id {
        if !ClientRepo::exists(&state.pool, client_id).await? {
            return Err(not_found("Client", client_id));
        }
    }
    if let Some(manager) = input.manager_id {
        ensure_users_exist(&state, &[manager]).await?;
    }
    if let Some(team) = &input.team {
        ensure_users_exist(&state, team).await?;
    }
    if let Some(raw) = input.status.take() {
        let to: ProjectStatus = raw.parse()?;
        let from: ProjectStatus = before.status.parse()?;
        validate_project_transition(from, to)?;
        input.status = Some(to.as_str().to_string());
    }
    let notes = match &input.notes {
        Some(notes) => stamped_notes(notes, user.user_id)?,
        None => Vec::new(),
    };

    let mut after = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Project", id))?;
    if !notes.is_empty() {
        after = ProjectRepo::append_notes(&state.pool, id, &notes)
            .await?
            .ok_or_else(|| not_found("Project", id))?;
    }

    let changes = changed_fields(&snapshot(&before)?, &snapshot(&after)?, PROJECT_TRACKED_FIELDS);
    if !changes.is_empty() {
        tracing::info!(project_id = id, changed = changes.len(), "Project updated");
        let payload = ProjectPayload {
            changes: changes.iter().map(|c| c.summary()).collect(),
            ..payload(&after)
        };
        publish(&state, PROJECT_UPDATED, &after, user.user_id, payload);
    }

    Ok(Json(DataResponse::new(redact(after, &caller))))
}

/// PUT /api/v1/projects/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<StatusBody>,
) -> AppResult<Json<DataResponse<Project>>> {
    let to = ProjectStatus::parse_label(body.value()?)?;
    let caller = user.caller();
    let project = find_project(&state, id).await?;
    ensure_project_modify(&caller, project.manager_id, &project.team)?;

    let from: ProjectStatus = project.status.parse()?;
    validate_project_transition(from, to)?;

    let updated = ProjectRepo::update_status(&state.pool, id, to.as_str())
        .await?
        .ok_or_else(|| not_found("Project", id))?;

    if from != to {
        tracing::info!(project_id = id, %from, %to, "Project status changed");
        let payload = ProjectPayload {
            from_status: Some(from.to_string()),
            to_status: Some(to.to_string()),
            ..payload(&updated)
        };
        publish(&state, PROJECT_STATUS_CHANGED, &updated, user.user_id, payload);
    }

    Ok(Json(DataResponse::new(redact(updated, &caller))))
}

/// DELETE /api/v1/projects/{id}
///
/// Soft delete, refused while any non-deleted task references the project.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Empty>>> {
    let project = find_project(&state, id).await?;
    let tasks = TaskRepo::count_for_project(&state.pool, id).await?;
    if tasks > 0 {
        return Err(CoreError::Conflict(format!(
            "Project has {tasks} task(s) and cannot be deleted"
        ))
        .into());
    }
    if !ProjectRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found("Project", id));
    }
    tracing::info!(project_id = id, user_id = user.user_id, "Project deleted");

    publish(&state, PROJECT_DELETED, &project, user.user_id, payload(&project));
    Ok(Json(DataResponse::new(Empty::default())))
}

/// POST /api/v1/projects/{id}/team
pub async fn add_team_member(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(body): Json<TeamMemberRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    find_project(&state, id).await?;
    ensure_users_exist(&state, &[body.user_id]).await?;

    if ProjectRepo::add_team_member(&state.pool, id, body.user_id).await? {
        tracing::info!(project_id = id, member_id = body.user_id, "Team member added");
    }
    let project = find_project(&state, id).await?;
    Ok(Json(DataResponse::new(redact(project, &user.caller()))))
}

/// DELETE /api/v1/projects/{id}/team/{user_id}
pub async fn remove_team_member(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path((id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Project>>> {
    find_project(&state, id).await?;
    if !ProjectRepo::remove_team_member(&state.pool, id, member_id).await? {
        return Err(CoreError::Validation(format!(
            "User {member_id} is not a member of this project"
        ))
        .into());
    }
    tracing::info!(project_id = id, member_id, "Team member removed");

    let project = find_project(&state, id).await?;
    Ok(Json(DataResponse::new(redact(project, &user.caller()))))
}

/// POST /api/v1/projects/{id}/notes
pub async fn add_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<NoteInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let caller = user.caller();
    let project = find_project(&state, id).await?;
    ensure_project_modify(&caller, project.manager_id, &project.team)?;

    let notes = stamped_notes(std::slice::from_ref(&body), user.user_id)?;
    let updated = ProjectRepo::append_notes(&state.pool, id, &notes)
        .await?
        .ok_or_else(|| not_found("Project", id))?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(redact(updated, &caller)))))
}

/// POST /api/v1/projects/{id}/documents
///
/// Records a reference only; the file lives wherever `url` points.
pub async fn add_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<DocumentInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    body.validate()?;
    let caller = user.caller();
    let project = find_project(&state, id).await?;
    ensure_project_modify(&caller, project.manager_id, &project.team)?;

    let document = ProjectDocument {
        name: body.name.trim().to_string(),
        url: body.url.trim().to_string(),
        uploaded_by: user.user_id,
        uploaded_at: chrono::Utc::now(),
    };
    let updated = ProjectRepo::append_document(&state.pool, id, &document)
        .await?
        .ok_or_else(|| not_found("Project", id))?;
    tracing::info!(project_id = id, document = %document.name, "Document added");
    Ok((StatusCode::CREATED, Json(DataResponse::new(redact(updated, &caller)))))
}
