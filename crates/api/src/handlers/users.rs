//! Handlers for the `/users` resource.
//!
//! Account management is admin-only. A user may read their own record.
//! Accounts are deactivated, never deleted.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsdesk_core::access::ensure_self_or_admin;
use opsdesk_core::error::CoreError;
use opsdesk_core::roles::{validate_account_status, Role, USER_STATUS_INACTIVE};
use opsdesk_core::types::DbId;
use opsdesk_db::models::user::{CreateUser, UpdateUser, User};
use opsdesk_db::repositories::UserRepo;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{not_found, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PageParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

async fn ensure_email_free(state: &AppState, email: &str, except: Option<DbId>) -> AppResult<()> {
    let existing = UserRepo::find_by_email(&state.pool, &email.trim().to_lowercase()).await?;
    match existing {
        Some(user) if Some(user.id) != except => Err(CoreError::Conflict(format!(
            "A user with email '{}' already exists",
            user.email
        ))
        .into()),
        _ => Ok(()),
    }
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ListResponse<User>>> {
    let page = params.page();
    let users = UserRepo::list(&state.pool, &page).await?;
    let total = UserRepo::count(&state.pool).await?;
    Ok(Json(ListResponse::new(users, &page, total)))
}

/// POST /api/v1/users
///
/// The role defaults to `staff`. The password is stored as an Argon2 hash.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;
    let role = match input.role.as_deref() {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::Staff,
    };
    ensure_email_free(&state, &input.email, None).await?;

    let hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {e}")))?;
    let user = UserRepo::create(&state.pool, &input, &hash, role.as_str()).await?;

    tracing::info!(user_id = user.id, role = %role, created_by = admin.user_id, "User created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<User>>> {
    ensure_self_or_admin(&user.caller(), id)?;
    let found = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;
    Ok(Json(DataResponse::new(found)))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    input.validate()?;
    if let Some(raw) = input.role.take() {
        input.role = Some(raw.parse::<Role>()?.as_str().to_string());
    }
    if let Some(status) = &input.status {
        validate_account_status(status)?;
    }
    if let Some(email) = &input.email {
        ensure_email_free(&state, email, Some(id)).await?;
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    tracing::info!(user_id = id, updated_by = admin.user_id, "User updated");
    Ok(Json(DataResponse::new(user)))
}

/// PUT /api/v1/users/{id}/deactivate
///
/// Deactivates the account. Admins cannot deactivate themselves.
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<User>>> {
    if id == admin.user_id {
        return Err(CoreError::Validation("You cannot deactivate your own account".into()).into());
    }
    let user = UserRepo::set_status(&state.pool, id, USER_STATUS_INACTIVE)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    tracing::info!(user_id = id, deactivated_by = admin.user_id, "User deactivated");
    Ok(Json(DataResponse::new(user)))
}
