//! Event names and the entity kinds events refer to.

use opsdesk_core::types::DbId;

pub const ENTITY_TASK: &str = "task";
pub const ENTITY_PROJECT: &str = "project";
pub const ENTITY_INVOICE: &str = "invoice";

pub const TASK_CREATED: &str = "task.created";
pub const TASK_ASSIGNED: &str = "task.assigned";
pub const TASK_REASSIGNED: &str = "task.reassigned";
pub const TASK_UPDATED: &str = "task.updated";
pub const TASK_STATUS_CHANGED: &str = "task.status_changed";
pub const TASK_COMMENTED: &str = "task.commented";
pub const TASK_TIME_LOGGED: &str = "task.time_logged";
pub const TASK_DELETED: &str = "task.deleted";

pub const PROJECT_CREATED: &str = "project.created";
pub const PROJECT_UPDATED: &str = "project.updated";
pub const PROJECT_STATUS_CHANGED: &str = "project.status_changed";
pub const PROJECT_DELETED: &str = "project.deleted";

pub const INVOICE_CREATED: &str = "invoice.created";
pub const INVOICE_STATUS_CHANGED: &str = "invoice.status_changed";
pub const INVOICE_DELETED: &str = "invoice.deleted";

/// Notification type tags stored on `notifications.notification_type`.
pub const NOTIFY_TASK_ASSIGNED: &str = "task_assigned";
pub const NOTIFY_TASK_REASSIGNED: &str = "task_reassigned";
pub const NOTIFY_TASK_UPDATED: &str = "task_updated";
pub const NOTIFY_TASK_STATUS: &str = "task_status";
pub const NOTIFY_TASK_COMMENT: &str = "task_comment";

/// Front-end path of an entity, used as notification and activity links.
pub fn entity_link(entity_type: &str, id: DbId) -> String {
    format!("/{entity_type}s/{id}")
}
