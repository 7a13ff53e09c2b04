//! Event bus and side-effect workers for the ERP backend.
//!
//! Handlers publish a [`PlatformEvent`] after their primary write commits.
//! Independent consumers turn events into side effects:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`notify`]: derives the notifications an event produces. The API
//!   crate's router persists and pushes them.
//! - [`ActivityRecorder`]: background service appending to the activity log.
//!
//! A failing consumer logs and moves on; it never reaches the request that
//! published the event.

pub mod activity;
pub mod bus;
pub mod notify;
pub mod payload;
pub mod types;

pub use activity::ActivityRecorder;
pub use bus::{EventBus, PlatformEvent};
