//! Project entity model and DTOs.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub project_number: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "client")]
    pub client_id: DbId,
    #[serde(rename = "manager")]
    pub manager_id: Option<DbId>,
    pub team: Vec<DbId>,
    pub status: String,
    /// Redacted (set to `None`) for callers without finance visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub tasks: Vec<DbId>,
    pub documents: Json<Vec<ProjectDocument>>,
    pub notes: Json<Vec<ProjectNote>>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A note appended to a project. Author and timestamp are server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNote {
    pub content: String,
    pub author: DbId,
    pub created_at: Timestamp,
}

/// A document reference. Storage of the file itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub name: String,
    pub url: String,
    pub uploaded_by: DbId,
    pub uploaded_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    /// Generated when absent.
    pub project_number: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Project name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "client")]
    pub client_id: DbId,
    #[serde(rename = "manager")]
    pub manager_id: Option<DbId>,
    #[serde(default)]
    pub team: Vec<DbId>,
    /// Defaults to `planning`.
    pub status: Option<String>,
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: Option<f64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// DTO for updating an existing project. All fields are optional.
///
/// `notes` entries are appended, never replaced.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "client")]
    pub client_id: Option<DbId>,
    #[serde(rename = "manager")]
    pub manager_id: Option<DbId>,
    pub team: Option<Vec<DbId>>,
    pub status: Option<String>,
    #[validate(range(min = 0.0))]
    pub budget: Option<f64>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub notes: Option<Vec<NoteInput>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NoteInput {
    #[validate(length(min = 1, message = "Note content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocumentInput {
    #[validate(length(min = 1, message = "Document name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Document url is required"))]
    pub url: String,
}

/// Filters accepted by `GET /projects`.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<String>,
    pub client_id: Option<DbId>,
    /// Restrict to projects the user manages or belongs to.
    pub member: Option<DbId>,
    /// Case-insensitive match on name or project number.
    pub search: Option<String>,
}
