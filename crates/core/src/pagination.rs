//! Page/limit pagination and whitelisted sorting shared by list endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000_000;

/// A `{page, limit}` pointer to a neighbouring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// `next` / `prev` links; each is present only when records exist in that
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// Normalized `page` / `limit` from a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamp raw values: page to `1..=MAX_PAGE`, limit to `1..=MAX_LIMIT`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        let next = (self.page.saturating_mul(self.limit) < total).then_some(PageRef {
            page: self.page.saturating_add(1),
            limit: self.limit,
        });
        let prev = (self.page > 1).then_some(PageRef {
            page: self.page - 1,
            limit: self.limit,
        });
        Pagination { next, prev }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A resolved `ORDER BY` clause. `column` always comes from a whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub fn to_sql(&self) -> String {
        format!(
            "{} {}",
            self.column,
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Resolve `field` / `-field` against `(api_field, column)` pairs.
///
/// Unknown fields fall back to `created_at DESC`.
pub fn parse_sort(raw: Option<&str>, allowed: &[(&str, &'static str)]) -> SortOrder {
    let fallback = SortOrder {
        column: "created_at",
        descending: true,
    };
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };
    let (field, descending) = match raw.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|&(_, column)| SortOrder { column, descending })
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let req = PageRequest::default();
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(-3), Some(500)).limit, MAX_LIMIT);
    }

    #[test]
    fn huge_pages_do_not_overflow() {
        let req = PageRequest::new(Some(i64::MAX), Some(MAX_LIMIT));
        assert_eq!(req.page, MAX_PAGE);
        assert_eq!(req.offset(), (MAX_PAGE - 1) * MAX_LIMIT);
        let p = req.pagination(25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: MAX_PAGE - 1, limit: MAX_LIMIT }));

        let unclamped = PageRequest { page: i64::MAX, limit: i64::MAX };
        assert_eq!(unclamped.offset(), i64::MAX);
        assert_eq!(unclamped.pagination(i64::MAX).next, None);
    }

    #[test]
    fn first_page_has_only_next() {
        let p = PageRequest::new(Some(1), Some(10)).pagination(25);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn last_page_has_only_prev() {
        let p = PageRequest::new(Some(3), Some(10)).pagination(25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn exact_fit_has_no_next() {
        let p = PageRequest::new(Some(2), Some(10)).pagination(20);
        assert_eq!(p.next, None);
    }

    #[test]
    fn empty_links_are_omitted_from_json() {
        let json = serde_json::to_value(Pagination::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn sort_parsing() {
        let allowed = [("dueDate", "due_date"), ("priority", "priority")];
        assert_eq!(
            parse_sort(Some("-dueDate"), &allowed),
            SortOrder { column: "due_date", descending: true }
        );
        assert_eq!(parse_sort(Some("priority"), &allowed).to_sql(), "priority ASC");
        assert_eq!(parse_sort(Some("password"), &allowed).to_sql(), "created_at DESC");
        assert_eq!(parse_sort(None, &allowed).to_sql(), "created_at DESC");
    }
}
