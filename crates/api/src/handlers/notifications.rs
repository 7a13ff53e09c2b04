//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and only ever touch
//! the caller's own notifications.

use axum::extract::{Path, Query, State};
use axum::Json;
use opsdesk_core::types::DbId;
use opsdesk_db::models::notification::Notification;
use opsdesk_db::repositories::NotificationRepo;
use serde_json::{json, Value};

use crate::error::{not_found, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::NotificationListParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// GET /api/v1/notifications
///
/// Newest first; `?unread=true` restricts to unread ones.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationListParams>,
) -> AppResult<Json<ListResponse<Notification>>> {
    let page = params.page();
    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, params.unread, &page).await?;
    let total = NotificationRepo::count_for_user(&state.pool, auth.user_id, params.unread).await?;
    Ok(Json(ListResponse::new(notifications, &page, total)))
}

/// PUT /api/v1/notifications/{id}/read
///
/// 404 if the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id)
        .await?
        .ok_or_else(|| not_found("Notification", notification_id))?;
    Ok(Json(DataResponse::new(notification)))
}

/// PUT /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Value>>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(json!({ "updated": updated }))))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Value>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(json!({ "count": count }))))
}
