pub mod activities;
pub mod clients;
pub mod finance;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket (?token=<jwt>)
///
/// /users                                list, create (admin)
/// /users/{id}                           get (admin or self), update (admin)
/// /users/{id}/deactivate                deactivate (admin)
///
/// /clients                              list, create
/// /clients/{id}                         get, update, delete
///
/// /projects                             list, create
/// /projects/{id}                        get, update, delete
/// /projects/{id}/status                 status change
/// /projects/{id}/team                   add member
/// /projects/{id}/team/{user_id}         remove member
/// /projects/{id}/notes                  append note
/// /projects/{id}/documents              append document reference
///
/// /tasks                                list, create
/// /tasks/{id}                           get, update, delete
/// /tasks/{id}/status                    status change
/// /tasks/{id}/comments                  add comment
/// /tasks/{id}/time                      log time
///
/// /finance/invoices                     list, create
/// /finance/invoices/{id}                get, update, delete
/// /finance/invoices/{id}/status         status change
/// /finance/summary                      totals
///
/// /notifications                        list
/// /notifications/read-all               mark all read
/// /notifications/unread-count           unread count
/// /notifications/{id}/read              mark one read
///
/// /activities                           activity log
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/users", users::router())
        .nest("/clients", clients::router())
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
        .nest("/finance", finance::router())
        .nest("/notifications", notifications::router())
        .nest("/activities", activities::router())
}
