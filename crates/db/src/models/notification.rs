//! Notification entity model and DTO.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: DbId,
    #[serde(rename = "recipient")]
    pub recipient_id: DbId,
    #[serde(rename = "sender")]
    pub sender_id: Option<DbId>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub link: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Values for a new notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    pub recipient_id: DbId,
    pub sender_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub link: Option<String>,
}
