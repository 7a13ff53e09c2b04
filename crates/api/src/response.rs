//! Shared response envelope types for API handlers.
//!
//! Single records go out as `{ success, data }`; lists as
//! `{ success, count, pagination, total, data }`. Errors have their own
//! envelope in [`crate::error`].

use opsdesk_core::pagination::{PageRequest, Pagination};
use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse::new(task)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    /// Number of records in `data`.
    pub count: usize,
    pub pagination: Pagination,
    /// Number of records matching the filter across all pages.
    pub total: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, page: &PageRequest, total: i64) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination: page.pagination(total),
            total,
            data,
        }
    }
}

/// Body of responses that carry no record (deletes).
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_envelope_shape() {
        let page = PageRequest::new(Some(2), Some(2));
        let body = serde_json::to_value(ListResponse::new(vec![3, 4], &page, 5)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "count": 2,
                "pagination": {
                    "next": {"page": 3, "limit": 2},
                    "prev": {"page": 1, "limit": 2}
                },
                "total": 5,
                "data": [3, 4]
            })
        );
    }

    #[test]
    fn data_envelope_shape() {
        let body = serde_json::to_value(DataResponse::new(Empty::default())).unwrap();
        assert_eq!(body, json!({"success": true, "data": {}}));
    }
}
