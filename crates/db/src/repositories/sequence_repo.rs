//! Repository for the `sequence_counters` table.
//!
//! Counters are advanced with a single upsert so concurrent creations in the
//! same scope never observe the same value.

use opsdesk_core::numbering::{format_number, next_seq_after, SequenceKind};
use opsdesk_core::types::Timestamp;
use sqlx::PgPool;

/// Hands out record numbers.
pub struct SequenceRepo;

impl SequenceRepo {
    /// Reserve the next number for `kind` in the period containing `at`.
    ///
    /// The counter never falls behind the highest number already stored in
    /// the scope, so numbers supplied by callers or predating the counter row
    /// are skipped rather than reissued.
    pub async fn next_number(
        pool: &PgPool,
        kind: SequenceKind,
        at: Timestamp,
    ) -> Result<String, sqlx::Error> {
        let scope = kind.scope(at);
        let highest = Self::highest_number(pool, kind, &scope).await?;
        let seed = next_seq_after(highest.as_deref());

        let value: i64 = sqlx::query_scalar(
            "INSERT INTO sequence_counters (scope, value) VALUES ($1, $2)
             ON CONFLICT (scope) DO UPDATE
                SET value = GREATEST(sequence_counters.value + 1, EXCLUDED.value), updated_at = NOW()
             RETURNING value",
        )
        .bind(&scope)
        .bind(seed)
        .fetch_one(pool)
        .await?;

        Ok(format_number(kind, at, value))
    }

    /// Highest well-formed number within `scope`, soft-deleted rows included.
    ///
    /// Sequences are compared by digit count first so that a number that has
    /// outgrown its padding still sorts above the padded ones.
    pub async fn highest_number(
        pool: &PgPool,
        kind: SequenceKind,
        scope: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let (table, column) = match kind {
            SequenceKind::Project => ("projects", "project_number"),
            SequenceKind::Task => ("tasks", "task_number"),
            SequenceKind::Invoice => ("invoices", "invoice_number"),
        };
        let query = format!(
            "SELECT {column} FROM {table}
             WHERE starts_with({column}, $1) AND substr({column}, length($1) + 1) ~ '^[0-9]+$'
             ORDER BY length({column}) DESC, {column} DESC LIMIT 1"
        );
        sqlx::query_scalar::<_, String>(&query)
            .bind(format!("{scope}-"))
            .fetch_optional(pool)
            .await
    }
}
