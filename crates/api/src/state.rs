use std::sync::Arc;

use opsdesk_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: opsdesk_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Live WebSocket sessions, keyed by user.
    pub ws_manager: Arc<WsManager>,
    /// Handlers publish lifecycle events here after their write commits.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Publish a lifecycle event. Never fails from the handler's side.
    pub fn publish(&self, event: opsdesk_events::PlatformEvent) {
        self.event_bus.publish(event);
    }
}
