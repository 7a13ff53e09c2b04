//! Activity log entry model and DTO.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the append-only `activities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: DbId,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub entity_type: String,
    pub entity_id: DbId,
    #[serde(rename = "user")]
    pub user_id: Option<DbId>,
    pub link: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivity {
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub entity_type: String,
    pub entity_id: DbId,
    pub user_id: Option<DbId>,
    pub link: Option<String>,
}

/// Filters accepted by `GET /activities`.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
}
