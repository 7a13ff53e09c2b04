//! Route definitions for the `/activities` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::activities;
use crate::state::AppState;

/// Routes mounted at `/activities`.
///
/// ```text
/// GET    /   -> list (admin, manager)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(activities::list))
}
