//! Notification routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus and turns task
//! lifecycle events into stored notifications plus a live push.

pub mod router;

pub use router::{LivePush, NotificationRouter};
