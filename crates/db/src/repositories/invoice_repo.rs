//! Repository for the `invoices` table.

use opsdesk_core::invoice::InvoiceStamps;
use opsdesk_core::pagination::{PageRequest, SortOrder};
use opsdesk_core::status::InvoiceStatus;
use opsdesk_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use super::filter::{BindValue, WhereClause};
use super::TaskRepo;
use crate::models::invoice::{
    FinanceSummary, Invoice, InvoiceChanges, InvoiceDeletion, InvoiceFilter, NewInvoice,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, invoice_number, client_id, project_id, line_items, status, subtotal, \
                       tax_rate, tax_amount, discount, total, amount_paid, issue_date, due_date, \
                       sent_at, paid_at, notes, created_by, created_at, updated_at";

/// Provides CRUD and lifecycle operations for invoices.
pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Insert a fully computed invoice as a draft.
    pub async fn create(pool: &PgPool, input: &NewInvoice) -> Result<Invoice, sqlx::Error> {
        let query = format!(
            "INSERT INTO invoices
                (invoice_number, client_id, project_id, line_items, subtotal, tax_rate,
                 tax_amount, discount, total, issue_date, due_date, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(&input.invoice_number)
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(Json(&input.line_items))
            .bind(input.subtotal)
            .bind(input.tax_rate)
            .bind(input.tax_amount)
            .bind(input.discount)
            .bind(input.total)
            .bind(input.issue_date)
            .bind(input.due_date)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of invoices matching `filter`.
    pub async fn list(
        pool: &PgPool,
        filter: &InvoiceFilter,
        page: &PageRequest,
        sort: &SortOrder,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let clause = build_invoice_filter(filter);
        let idx = clause.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM invoices {} ORDER BY {}, id DESC LIMIT ${idx} OFFSET ${}",
            clause.sql(),
            sort.to_sql(),
            idx + 1
        );
        clause
            .bind_as(sqlx::query_as::<_, Invoice>(&query))
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &InvoiceFilter) -> Result<i64, sqlx::Error> {
        let clause = build_invoice_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM invoices {}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Apply computed changes. Only non-`None` fields are written.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET
                line_items = COALESCE($2, line_items),
                subtotal = COALESCE($3, subtotal),
                tax_rate = COALESCE($4, tax_rate),
                tax_amount = COALESCE($5, tax_amount),
                discount = COALESCE($6, discount),
                total = COALESCE($7, total),
                issue_date = COALESCE($8, issue_date),
                due_date = COALESCE($9, due_date),
                notes = COALESCE($10, notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(changes.line_items.as_ref().map(Json))
            .bind(changes.subtotal)
            .bind(changes.tax_rate)
            .bind(changes.tax_amount)
            .bind(changes.discount)
            .bind(changes.total)
            .bind(changes.issue_date)
            .bind(changes.due_date)
            .bind(&changes.notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        stamps: &InvoiceStamps,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "UPDATE invoices SET
                status = $2,
                sent_at = COALESCE($3, sent_at),
                paid_at = COALESCE($4, paid_at),
                amount_paid = COALESCE($5, amount_paid)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(status)
            .bind(stamps.sent_at)
            .bind(stamps.paid_at)
            .bind(stamps.amount_paid)
            .fetch_optional(pool)
            .await
    }

    /// Revert the invoice's linked tasks and delete the invoice in one
    /// transaction.
    ///
    /// The status is re-read under a row lock, so an invoice sent or paid
    /// after the caller loaded it is left untouched.
    pub async fn delete_and_revert_tasks(
        pool: &PgPool,
        invoice: &Invoice,
    ) -> Result<InvoiceDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1 FOR UPDATE")
                .bind(invoice.id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(status) = status else {
            tx.rollback().await?;
            return Ok(InvoiceDeletion::Missing);
        };
        if matches!(status.parse::<InvoiceStatus>(), Ok(InvoiceStatus::Sent | InvoiceStatus::Paid)) {
            tx.rollback().await?;
            return Ok(InvoiceDeletion::Locked { status });
        }

        let reverted_tasks = TaskRepo::revert_invoiced(&mut *tx, &invoice.invoice_number).await?;

        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(InvoiceDeletion::Deleted { reverted_tasks })
    }

    /// Totals over every non-cancelled invoice.
    pub async fn summary(pool: &PgPool) -> Result<FinanceSummary, sqlx::Error> {
        sqlx::query_as::<_, FinanceSummary>(
            "SELECT
                COALESCE(SUM(total), 0)::DOUBLE PRECISION AS total_invoiced,
                COALESCE(SUM(amount_paid), 0)::DOUBLE PRECISION AS total_paid,
                COALESCE(SUM(total - amount_paid), 0)::DOUBLE PRECISION AS outstanding,
                COUNT(*) FILTER (WHERE status = 'overdue') AS overdue_count
             FROM invoices
             WHERE status <> 'cancelled'",
        )
        .fetch_one(pool)
        .await
    }
}

fn build_invoice_filter(filter: &InvoiceFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    if let Some(status) = &filter.status {
        clause.eq("status", BindValue::Text(status.clone()));
    }
    if let Some(client_id) = filter.client_id {
        clause.eq("client_id", BindValue::BigInt(client_id));
    }
    if let Some(project_id) = filter.project_id {
        clause.eq("project_id", BindValue::BigInt(project_id));
    }
    clause
}
