//! Query-string and small body types shared by the handlers.
//!
//! Query parameters are camelCase to match the JSON bodies. Paging values are
//! normalized by [`PageRequest::new`].

use opsdesk_core::error::CoreError;
use opsdesk_core::pagination::PageRequest;
use opsdesk_core::types::{DbId, Timestamp};
use opsdesk_core::validation::require_non_empty;
use serde::Deserialize;

/// `?page=&limit=` on its own.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// `GET /tasks`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub project: Option<DbId>,
    pub priority: Option<String>,
    pub assigned_to: Option<DbId>,
    pub due_before: Option<Timestamp>,
    pub due_after: Option<Timestamp>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// `GET /projects`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub client: Option<DbId>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// `GET /clients`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// `GET /finance/invoices`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub client: Option<DbId>,
    pub project: Option<DbId>,
    pub sort: Option<String>,
}

/// `GET /notifications`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Only unread notifications when `true`.
    #[serde(default)]
    pub unread: bool,
}

/// `GET /activities`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
}

macro_rules! impl_page {
    ($($ty:ty),+) => {
        $(impl $ty {
            pub fn page(&self) -> PageRequest {
                PageRequest::new(self.page, self.limit)
            }
        })+
    };
}

impl_page!(
    TaskListParams,
    ProjectListParams,
    ClientListParams,
    InvoiceListParams,
    NotificationListParams,
    ActivityListParams
);

/// Body of every `PUT …/status` endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: String,
}

impl StatusBody {
    /// The trimmed status value; blank is a validation error.
    pub fn value(&self) -> Result<&str, CoreError> {
        let status = self.status.trim();
        require_non_empty("status", status)?;
        Ok(status)
    }
}

/// Treat `?search=` with only whitespace as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_status_is_rejected() {
        let body = StatusBody {
            status: "   ".into(),
        };
        assert!(body.value().is_err());

        let body = StatusBody {
            status: " paid ".into(),
        };
        assert_eq!(body.value().unwrap(), "paid");
    }

    #[test]
    fn blank_search_is_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" acme ".into())), Some("acme".into()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn task_params_use_camel_case() {
        let params: TaskListParams =
            serde_json::from_value(serde_json::json!({"assignedTo": 4, "dueBefore": "2026-10-20T00:00:00Z"}))
                .unwrap();
        assert_eq!(params.assigned_to, Some(4));
        assert!(params.due_before.is_some());
        assert_eq!(params.page(), PageRequest::default());
    }
}
