//! Dynamic `WHERE` clause assembly for filtered list queries.
//!
//! Conditions are rendered with positional placeholders (`$1`, `$2`, ...)
//! and the matching values are bound in the same order afterwards.

use opsdesk_core::types::Timestamp;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{QueryAs, QueryScalar};

/// Typed bind value for dynamically-built queries.
#[derive(Debug, Clone)]
pub(crate) enum BindValue {
    BigInt(i64),
    Text(String),
    Timestamp(Timestamp),
}

#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    conditions: Vec<String>,
    binds: Vec<BindValue>,
}

impl WhereClause {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A condition without a bound value, e.g. `deleted_at IS NULL`.
    pub(crate) fn raw(&mut self, condition: &str) -> &mut Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// A condition built around the next placeholder. `render` receives the
    /// placeholder (`$3`) and may use it more than once.
    pub(crate) fn with(
        &mut self,
        value: BindValue,
        render: impl FnOnce(&str) -> String,
    ) -> &mut Self {
        let placeholder = format!("${}", self.binds.len() + 1);
        self.conditions.push(render(&placeholder));
        self.binds.push(value);
        self
    }

    /// `column = $n`
    pub(crate) fn eq(&mut self, column: &str, value: BindValue) -> &mut Self {
        self.with(value, |p| format!("{column} = {p}"))
    }

    /// Case-insensitive substring match over any of `columns`.
    pub(crate) fn search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let pattern = format!("%{}%", term.trim());
        self.with(BindValue::Text(pattern), |p| {
            let parts: Vec<String> = columns.iter().map(|c| format!("{c} ILIKE {p}")).collect();
            format!("({})", parts.join(" OR "))
        })
    }

    /// Empty when no conditions are present, otherwise starts with `WHERE `.
    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Index of the first placeholder after the filter values.
    pub(crate) fn next_index(&self) -> usize {
        self.binds.len() + 1
    }

    pub(crate) fn bind_as<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value {
                BindValue::BigInt(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
                BindValue::Timestamp(v) => query.bind(*v),
            };
        }
        query
    }

    pub(crate) fn bind_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            query = match value {
                BindValue::BigInt(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.clone()),
                BindValue::Timestamp(v) => query.bind(*v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clause_renders_nothing() {
        let clause = WhereClause::new();
        assert_eq!(clause.sql(), "");
        assert_eq!(clause.next_index(), 1);
    }

    #[test]
    fn placeholders_follow_bind_order() {
        let mut clause = WhereClause::new();
        clause
            .raw("deleted_at IS NULL")
            .eq("status", BindValue::Text("pending".into()))
            .search(&["title", "description"], "audit")
            .with(BindValue::BigInt(7), |p| format!("(manager_id = {p} OR {p} = ANY(team))"));

        assert_eq!(
            clause.sql(),
            "WHERE deleted_at IS NULL AND status = $1 AND (title ILIKE $2 OR description ILIKE $2) \
             AND (manager_id = $3 OR $3 = ANY(team))"
        );
        assert_eq!(clause.next_index(), 4);
    }
}
