//! Event-to-notification delivery.
//!
//! [`NotificationRouter`] subscribes to the event bus, turns each event into
//! notification drafts (`opsdesk_events::notify`), persists them, and pushes
//! each stored notification to the recipient's live sessions through a
//! [`LivePush`] capability.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use opsdesk_core::types::DbId;
use opsdesk_db::models::notification::Notification;
use opsdesk_db::models::user::UserSummary;
use opsdesk_db::repositories::{NotificationRepo, UserRepo};
use opsdesk_db::DbPool;
use opsdesk_events::notify::notification_drafts;
use opsdesk_events::payload::TaskPayload;
use opsdesk_events::PlatformEvent;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Delivers a message to whatever live sessions a user has open.
///
/// Returns the number of sessions reached; zero is not an error.
#[async_trait]
pub trait LivePush: Send + Sync {
    async fn push(&self, user_id: DbId, message: Value) -> usize;
}

#[async_trait]
impl LivePush for WsManager {
    async fn push(&self, user_id: DbId, message: Value) -> usize {
        self.send_to_user(user_id, Message::Text(message.to_string().into()))
            .await
    }
}

/// Task summary denormalized into the live message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskSummary {
    id: DbId,
    task_number: String,
    title: String,
}

/// What a connected client receives for each notification.
#[derive(Debug, Serialize)]
struct LiveNotification<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    notification: &'a Notification,
    sender: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<TaskSummary>,
}

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    push: Arc<dyn LivePush>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, push: Arc<dyn LivePush>) -> Self {
        Self { pool, push }
    }

    /// Run the routing loop until the [`EventBus`](opsdesk_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Persist and push every notification `event` produces.
    ///
    /// Returns the notifications that were stored. Persistence failures are
    /// logged and skip that draft; push outcomes are never surfaced.
    pub async fn deliver(&self, event: &PlatformEvent) -> Vec<Notification> {
        let drafts = notification_drafts(event);
        if drafts.is_empty() {
            return Vec::new();
        }

        let sender = match event.actor_user_id {
            Some(actor) => self.sender_summary(actor).await,
            None => None,
        };
        let task = event
            .payload_as::<TaskPayload>()
            .zip(event.source_entity_id)
            .map(|(payload, id)| TaskSummary {
                id,
                task_number: payload.task_number,
                title: payload.title,
            });

        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let notification = match NotificationRepo::create(&self.pool, &draft).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        event_type = %event.event_type,
                        recipient_id = draft.recipient_id,
                        "Failed to persist notification"
                    );
                    continue;
                }
            };

            let message = LiveNotification {
                kind: "notification",
                notification: &notification,
                sender: sender.clone(),
                task: task.clone(),
            };
            match serde_json::to_value(&message) {
                Ok(value) => {
                    let sessions = self.push.push(notification.recipient_id, value).await;
                    tracing::debug!(
                        notification_id = notification.id,
                        recipient_id = notification.recipient_id,
                        sessions,
                        "Notification pushed"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to serialize live notification");
                }
            }

            stored.push(notification);
        }
        stored
    }

    async fn sender_summary(&self, user_id: DbId) -> Option<UserSummary> {
        match UserRepo::find_by_id(&self.pool, user_id).await {
            Ok(user) => user.as_ref().map(UserSummary::from),
            Err(e) => {
                tracing::warn!(error = %e, user_id, "Failed to load notification sender");
                None
            }
        }
    }
}
