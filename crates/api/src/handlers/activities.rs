//! Handlers for the `/activities` resource.

use axum::extract::{Query, State};
use axum::Json;
use opsdesk_db::models::activity::{Activity, ActivityFilter};
use opsdesk_db::repositories::ActivityRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireManager;
use crate::query::{non_blank, ActivityListParams};
use crate::response::ListResponse;
use crate::state::AppState;

/// GET /api/v1/activities
///
/// The activity log, newest first, optionally narrowed to one entity.
pub async fn list(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
    Query(params): Query<ActivityListParams>,
) -> AppResult<Json<ListResponse<Activity>>> {
    let page = params.page();
    let filter = ActivityFilter {
        entity_type: non_blank(params.entity_type),
        entity_id: params.entity_id,
    };

    let activities = ActivityRepo::list(&state.pool, &filter, &page).await?;
    let total = ActivityRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(activities, &page, total)))
}
