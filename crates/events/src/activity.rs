//! Activity log recording.
//!
//! [`ActivityRecorder`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends one `activities` row per recognized event. It runs as a
//! long-lived background task and shuts down when the bus is dropped.

use opsdesk_db::models::activity::CreateActivity;
use opsdesk_db::repositories::ActivityRepo;
use opsdesk_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::payload::{InvoicePayload, ProjectPayload, TaskPayload};
use crate::types::*;

/// Background service that turns events into activity log entries.
pub struct ActivityRecorder;

impl ActivityRecorder {
    /// Run the recording loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(activity) = activity_for_event(&event) else {
                        continue;
                    };
                    if let Err(e) = ActivityRepo::create(&pool, &activity).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            entity_id = activity.entity_id,
                            "Failed to record activity"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Activity recorder lagged, some events were not recorded");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, activity recorder shutting down");
                    break;
                }
            }
        }
    }
}

/// The activity entry an event produces, if any.
pub fn activity_for_event(event: &PlatformEvent) -> Option<CreateActivity> {
    let entity_type = event.source_entity_type.clone()?;
    let entity_id = event.source_entity_id?;

    let (title, description) = match entity_type.as_str() {
        ENTITY_TASK => task_activity(event)?,
        ENTITY_PROJECT => project_activity(event)?,
        ENTITY_INVOICE => invoice_activity(event)?,
        _ => return None,
    };

    Some(CreateActivity {
        activity_type: event.event_type.clone(),
        title,
        description,
        link: Some(entity_link(&entity_type, entity_id)),
        entity_type,
        entity_id,
        user_id: event.actor_user_id,
    })
}

fn transition(from: &Option<String>, to: &Option<String>) -> String {
    format!(
        "{} → {}",
        from.as_deref().unwrap_or("none"),
        to.as_deref().unwrap_or("none")
    )
}

fn task_activity(event: &PlatformEvent) -> Option<(String, Option<String>)> {
    let p = event.payload_as::<TaskPayload>()?;
    let subject = format!("{} {}", p.task_number, p.title);
    let entry = match event.event_type.as_str() {
        TASK_CREATED => (format!("Task created: {subject}"), None),
        TASK_REASSIGNED => (
            format!("Task reassigned: {subject}"),
            Some(format!(
                "assignedTo: {} → {}",
                p.previous_assignee.map_or("none".to_string(), |id| id.to_string()),
                p.assignee.map_or("none".to_string(), |id| id.to_string()),
            )),
        ),
        TASK_UPDATED => (format!("Task updated: {subject}"), Some(p.changes.join("\n"))),
        TASK_STATUS_CHANGED => (
            format!("Task status changed: {subject}"),
            Some(transition(&p.from_status, &p.to_status)),
        ),
        TASK_COMMENTED => (format!("Comment added: {subject}"), p.comment),
        TASK_TIME_LOGGED => (
            format!("Time logged: {subject}"),
            p.hours.map(|h| format!("{h} hours")),
        ),
        TASK_DELETED => (format!("Task deleted: {subject}"), None),
        _ => return None,
    };
    Some(entry)
}

fn project_activity(event: &PlatformEvent) -> Option<(String, Option<String>)> {
    let p = event.payload_as::<ProjectPayload>()?;
    let subject = format!("{} {}", p.project_number, p.name);
    let entry = match event.event_type.as_str() {
        PROJECT_CREATED => (format!("Project created: {subject}"), None),
        PROJECT_UPDATED => (format!("Project updated: {subject}"), Some(p.changes.join("\n"))),
        PROJECT_STATUS_CHANGED => (
            format!("Project status changed: {subject}"),
            Some(transition(&p.from_status, &p.to_status)),
        ),
        PROJECT_DELETED => (format!("Project deleted: {subject}"), None),
        _ => return None,
    };
    Some(entry)
}

fn invoice_activity(event: &PlatformEvent) -> Option<(String, Option<String>)> {
    let p = event.payload_as::<InvoicePayload>()?;
    let entry = match event.event_type.as_str() {
        INVOICE_CREATED => {
            let mut description = format!("Total {:.2}", p.total);
            if !p.skipped_tasks.is_empty() {
                description.push_str(&format!(
                    "; {} task(s) could not be invoiced",
                    p.skipped_tasks.len()
                ));
            }
            (format!("Invoice created: {}", p.invoice_number), Some(description))
        }
        INVOICE_STATUS_CHANGED => (
            format!("Invoice status changed: {}", p.invoice_number),
            Some(transition(&p.from_status, &p.to_status)),
        ),
        INVOICE_DELETED => (
            format!("Invoice deleted: {}", p.invoice_number),
            (!p.tasks.is_empty()).then(|| format!("{} task(s) reverted", p.tasks.len())),
        ),
        _ => return None,
    };
    Some(entry)
}
