//! Handlers for the `/clients` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsdesk_core::error::CoreError;
use opsdesk_core::pagination::parse_sort;
use opsdesk_core::types::DbId;
use opsdesk_db::models::client::{
    Client, ClientFilter, CreateClient, UpdateClient, CLIENT_STATUS_ACTIVE, CLIENT_STATUS_INACTIVE,
};
use opsdesk_db::repositories::ClientRepo;
use validator::Validate;

use crate::error::{not_found, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequireManager};
use crate::query::{non_blank, ClientListParams};
use crate::response::{DataResponse, Empty, ListResponse};
use crate::state::AppState;

const SORT_FIELDS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("name", "name"),
    ("status", "status"),
];

fn validate_status(status: &str) -> Result<(), CoreError> {
    if status == CLIENT_STATUS_ACTIVE || status == CLIENT_STATUS_INACTIVE {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid client status '{status}'. Must be one of: {CLIENT_STATUS_ACTIVE}, {CLIENT_STATUS_INACTIVE}"
        )))
    }
}

/// GET /api/v1/clients
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<ClientListParams>,
) -> AppResult<Json<ListResponse<Client>>> {
    if let Some(status) = &params.status {
        validate_status(status)?;
    }
    let page = params.page();
    let sort = parse_sort(params.sort.as_deref(), SORT_FIELDS);
    let filter = ClientFilter {
        status: params.status,
        search: non_blank(params.search),
    };

    let clients = ClientRepo::list(&state.pool, &filter, &page, &sort).await?;
    let total = ClientRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(clients, &page, total)))
}

/// POST /api/v1/clients
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_status(status)?;
    }
    let client = ClientRepo::create(&state.pool, &input).await?;
    tracing::info!(client_id = client.id, user_id = user.user_id, "Client created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(client))))
}

/// GET /api/v1/clients/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Client>>> {
    let client = ClientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Client", id))?;
    Ok(Json(DataResponse::new(client)))
}

/// PUT /api/v1/clients/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateClient>,
) -> AppResult<Json<DataResponse<Client>>> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_status(status)?;
    }
    let client = ClientRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Client", id))?;
    tracing::info!(client_id = id, user_id = user.user_id, "Client updated");
    Ok(Json(DataResponse::new(client)))
}

/// DELETE /api/v1/clients/{id}
///
/// Refused while any project or invoice still references the client.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Empty>>> {
    if !ClientRepo::exists(&state.pool, id).await? {
        return Err(not_found("Client", id));
    }
    if ClientRepo::is_referenced(&state.pool, id).await? {
        return Err(CoreError::Conflict(
            "Client has projects or invoices and cannot be deleted".into(),
        )
        .into());
    }
    if !ClientRepo::delete(&state.pool, id).await? {
        return Err(not_found("Client", id));
    }
    tracing::info!(client_id = id, user_id = user.user_id, "Client deleted");
    Ok(Json(DataResponse::new(Empty::default())))
}
