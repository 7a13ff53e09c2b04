//! Route definitions for the `/finance` resource.
//!
//! Everything requires the admin or finance role; invoice deletion is
//! admin-only.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::invoices;
use crate::state::AppState;

/// Routes mounted at `/finance`.
///
/// ```text
/// GET    /invoices               -> list
/// POST   /invoices               -> create
/// GET    /invoices/{id}          -> get_by_id
/// PUT    /invoices/{id}          -> update
/// DELETE /invoices/{id}          -> delete (admin)
/// PUT    /invoices/{id}/status   -> update_status
/// GET    /summary                -> summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/invoices/{id}",
            get(invoices::get_by_id)
                .put(invoices::update)
                .delete(invoices::delete),
        )
        .route("/invoices/{id}/status", put(invoices::update_status))
        .route("/summary", get(invoices::summary))
}
