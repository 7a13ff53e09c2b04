//! Task entity model and DTOs.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::UserSummary;

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: DbId,
    pub task_number: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "project")]
    pub project_id: DbId,
    pub assigned_to: Option<DbId>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<Timestamp>,
    pub tags: Vec<String>,
    #[sqlx(flatten)]
    pub time_tracking: TimeTracking,
    pub comments: Json<Vec<TaskComment>>,
    pub invoiced: bool,
    pub invoice_number: Option<String>,
    pub invoiced_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Estimated and logged hours, serialized as the nested `timeTracking` object.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTracking {
    pub estimated_hours: Option<f64>,
    /// Always the sum of `entries[].hours`.
    pub actual_hours: f64,
    #[sqlx(rename = "time_entries")]
    pub entries: Json<Vec<TimeEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub hours: f64,
    pub description: String,
    pub date: Timestamp,
    pub user: DbId,
}

/// A comment as stored. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: uuid::Uuid,
    pub content: String,
    pub author: DbId,
    pub created_at: Timestamp,
}

impl TaskComment {
    pub fn new(author: DbId, content: String, created_at: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            content,
            author,
            created_at,
        }
    }
}

/// A comment with its author populated, as returned by the comments endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: uuid::Uuid,
    pub content: String,
    pub author: Option<UserSummary>,
    pub created_at: Timestamp,
}

/// DTO for creating a new task.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    /// Generated when absent.
    pub task_number: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Task title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "project")]
    pub project_id: DbId,
    pub assigned_to: Option<DbId>,
    /// Defaults to `pending`.
    pub status: Option<String>,
    /// Defaults to `medium`.
    pub priority: Option<String>,
    pub due_date: Option<Timestamp>,
    #[validate(range(min = 0.0, message = "Estimated hours cannot be negative"))]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating an existing task. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "project")]
    pub project_id: Option<DbId>,
    pub assigned_to: Option<DbId>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<Timestamp>,
    #[validate(range(min = 0.0))]
    pub estimated_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// Filters accepted by `GET /tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub project_id: Option<DbId>,
    pub priority: Option<String>,
    pub assigned_to: Option<DbId>,
    pub due_before: Option<Timestamp>,
    pub due_after: Option<Timestamp>,
    /// Case-insensitive match on title, description, or task number.
    pub search: Option<String>,
}
