//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create (admin, manager)
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete (admin)
/// PUT    /{id}/status      -> update_status
/// POST   /{id}/comments    -> add_comment
/// PUT    /{id}/time        -> log_time
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list).post(tasks::create))
        .route(
            "/{id}",
            get(tasks::get_by_id).put(tasks::update).delete(tasks::delete),
        )
        .route("/{id}/status", put(tasks::update_status))
        .route("/{id}/comments", post(tasks::add_comment))
        .route("/{id}/time", put(tasks::log_time))
}
