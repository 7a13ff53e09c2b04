//! Typed payloads carried by [`PlatformEvent`](crate::PlatformEvent)s.
//!
//! Publishers serialize one of these with `with_payload`; consumers decode
//! with `payload_as`. Fields not relevant to a given event stay empty.

use opsdesk_core::types::DbId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPayload {
    pub task_number: String,
    pub title: String,
    pub project: Option<DbId>,
    pub assignee: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_assignee: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    /// `field: old → new` lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPayload {
    pub project_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoicePayload {
    pub invoice_number: String,
    pub client: DbId,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    /// Tasks marked invoiced (creation) or reverted (deletion).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<DbId>,
    /// Line-item tasks that could not be invoiced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_tasks: Vec<DbId>,
}
