//! Client entity model and DTOs.

use opsdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const CLIENT_STATUS_ACTIVE: &str = "active";
pub const CLIENT_STATUS_INACTIVE: &str = "inactive";

/// A client row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    #[validate(length(min = 1, max = 200, message = "Client name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    /// Defaults to `active`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub status: Option<String>,
}

/// Filters accepted by `GET /clients`.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub status: Option<String>,
    /// Case-insensitive match on name, company, or email.
    pub search: Option<String>,
}
