//! WebSocket live push.
//!
//! Connection management, heartbeat, and the authenticated upgrade handler.
//! Sessions receive notifications only; see [`crate::notifications`].

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
