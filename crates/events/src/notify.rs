//! Notification drafting.
//!
//! [`notification_drafts`] is a pure function from an event to the
//! notifications it should produce. Persistence and live delivery belong to
//! the consumer, which keeps this logic testable without a database or a
//! socket.

use opsdesk_db::models::notification::CreateNotification;

use crate::bus::PlatformEvent;
use crate::payload::TaskPayload;
use crate::types::{
    entity_link, ENTITY_TASK, NOTIFY_TASK_ASSIGNED, NOTIFY_TASK_COMMENT, NOTIFY_TASK_REASSIGNED,
    NOTIFY_TASK_STATUS, NOTIFY_TASK_UPDATED, TASK_ASSIGNED, TASK_COMMENTED, TASK_REASSIGNED,
    TASK_STATUS_CHANGED, TASK_UPDATED,
};

/// Notifications for `event`. Events that notify nobody yield an empty list.
///
/// Every task notification goes to the task's (new) assignee, and nobody is
/// notified about their own action. The actor filter wins over the recipient
/// rule: a user who reassigns a task to themselves, or creates a task
/// assigned to themselves, gets no `task_reassigned` or `task_assigned`
/// notification at all. The event itself is still published and logged.
pub fn notification_drafts(event: &PlatformEvent) -> Vec<CreateNotification> {
    let Some(task_id) = event
        .source_entity_id
        .filter(|_| event.source_entity_type.as_deref() == Some(ENTITY_TASK))
    else {
        return Vec::new();
    };
    let Some(payload) = event.payload_as::<TaskPayload>() else {
        tracing::warn!(event_type = %event.event_type, "Task event without a task payload");
        return Vec::new();
    };
    let Some(recipient) = payload
        .assignee
        .filter(|assignee| Some(*assignee) != event.actor_user_id)
    else {
        return Vec::new();
    };

    let label = task_label(&payload);
    let (notification_type, title, message) = match event.event_type.as_str() {
        TASK_ASSIGNED => (
            NOTIFY_TASK_ASSIGNED,
            "New task assigned".to_string(),
            format!("You have been assigned to {label}"),
        ),
        TASK_REASSIGNED => (
            NOTIFY_TASK_REASSIGNED,
            "Task reassigned to you".to_string(),
            format!("{label} has been reassigned to you"),
        ),
        TASK_UPDATED => (
            NOTIFY_TASK_UPDATED,
            "Task updated".to_string(),
            format!("{label} was updated:\n{}", payload.changes.join("\n")),
        ),
        TASK_STATUS_CHANGED => (
            NOTIFY_TASK_STATUS,
            "Task status changed".to_string(),
            format!(
                "{label} moved from {} to {}",
                payload.from_status.as_deref().unwrap_or("none"),
                payload.to_status.as_deref().unwrap_or("none"),
            ),
        ),
        TASK_COMMENTED => (
            NOTIFY_TASK_COMMENT,
            "New comment".to_string(),
            format!(
                "New comment on {label}: {}",
                payload.comment.as_deref().unwrap_or_default()
            ),
        ),
        _ => return Vec::new(),
    };

    vec![CreateNotification {
        recipient_id: recipient,
        sender_id: event.actor_user_id,
        title,
        message,
        notification_type: notification_type.to_string(),
        entity_type: Some(ENTITY_TASK.to_string()),
        entity_id: Some(task_id),
        link: Some(entity_link(ENTITY_TASK, task_id)),
    }]
}

fn task_label(payload: &TaskPayload) -> String {
    format!("task \"{}\" ({})", payload.title, payload.task_number)
}
