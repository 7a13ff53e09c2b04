//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /                 -> list (admin)
/// POST   /                 -> create (admin)
/// GET    /{id}             -> get_by_id (admin or self)
/// PUT    /{id}             -> update (admin)
/// PUT    /{id}/deactivate  -> deactivate (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/{id}", get(users::get_by_id).put(users::update))
        .route("/{id}/deactivate", put(users::deactivate))
}
