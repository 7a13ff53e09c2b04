//! Route definitions for the `/projects` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create (admin, manager)
/// GET    /{id}                    -> get_by_id
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete (admin)
/// PUT    /{id}/status             -> update_status
/// POST   /{id}/team               -> add_team_member (admin, manager)
/// DELETE /{id}/team/{user_id}     -> remove_team_member (admin, manager)
/// POST   /{id}/notes              -> add_note
/// POST   /{id}/documents          -> add_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route(
            "/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/{id}/status", put(projects::update_status))
        .route("/{id}/team", post(projects::add_team_member))
        .route("/{id}/team/{user_id}", delete(projects::remove_team_member))
        .route("/{id}/notes", post(projects::add_note))
        .route("/{id}/documents", post(projects::add_document))
}
