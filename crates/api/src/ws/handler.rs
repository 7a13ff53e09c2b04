use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use opsdesk_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::resolve_token;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Browsers cannot set headers on a WebSocket handshake, so the bearer token
/// travels in the query string.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

/// GET /api/v1/ws?token=<jwt>
///
/// Authenticates the token before upgrading; the session is bound to that
/// user for its lifetime.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<Response> {
    let user = resolve_token(&state, &params.token).await?;
    let ws_manager = Arc::clone(&state.ws_manager);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, ws_manager, user.user_id)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// A spawned task forwards queued messages to the sink while this task
/// drains inbound frames until the client goes away.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // The push channel is one-way; inbound frames only signal liveness.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}
