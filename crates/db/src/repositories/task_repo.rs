//! Repository for the `tasks` table.

use opsdesk_core::lifecycle::TaskStamps;
use opsdesk_core::pagination::{PageRequest, SortOrder};
use opsdesk_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use super::filter::{BindValue, WhereClause};
use crate::models::task::{CreateTask, Task, TaskComment, TaskFilter, TimeEntry, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_number, title, description, project_id, assigned_to, status, \
                       priority, due_date, tags, estimated_hours, actual_hours, time_entries, \
                       comments, invoiced, invoice_number, invoiced_at, started_at, completed_at, \
                       created_by, deleted_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task, returning the created row.
    ///
    /// `stamps` carries the start/completion times implied by the initial
    /// status.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTask,
        task_number: &str,
        stamps: &TaskStamps,
        created_by: DbId,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks
                (task_number, title, description, project_id, assigned_to, status,
                 priority, due_date, estimated_hours, tags, started_at, completed_at, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'pending'), COALESCE($7, 'medium'),
                     $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(task_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.project_id)
            .bind(input.assigned_to)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.due_date)
            .bind(input.estimated_hours)
            .bind(&input.tags)
            .bind(stamps.started_at)
            .bind(stamps.completed_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a task by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of non-deleted tasks matching `filter`.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        page: &PageRequest,
        sort: &SortOrder,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let clause = build_task_filter(filter);
        let idx = clause.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM tasks {} ORDER BY {}, id DESC LIMIT ${idx} OFFSET ${}",
            clause.sql(),
            sort.to_sql(),
            idx + 1
        );
        clause
            .bind_as(sqlx::query_as::<_, Task>(&query))
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Count non-deleted tasks matching `filter`.
    pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let clause = build_task_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM tasks {}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update plus whatever lifecycle stamps the status
    /// change (if any) requires.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTask,
        stamps: &TaskStamps,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                project_id = COALESCE($4, project_id),
                assigned_to = COALESCE($5, assigned_to),
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                due_date = COALESCE($8, due_date),
                estimated_hours = COALESCE($9, estimated_hours),
                tags = COALESCE($10, tags),
                started_at = COALESCE($11, started_at),
                completed_at = COALESCE($12, completed_at)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.project_id)
            .bind(input.assigned_to)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.due_date)
            .bind(input.estimated_hours)
            .bind(&input.tags)
            .bind(stamps.started_at)
            .bind(stamps.completed_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        stamps: &TaskStamps,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                status = $2,
                started_at = COALESCE($3, started_at),
                completed_at = COALESCE($4, completed_at)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status)
            .bind(stamps.started_at)
            .bind(stamps.completed_at)
            .fetch_optional(pool)
            .await
    }

    /// Append a time entry and recompute `actual_hours` from the full entry
    /// set in the same statement.
    pub async fn add_time_entry(
        pool: &PgPool,
        id: DbId,
        entry: &TimeEntry,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                time_entries = time_entries || $2::jsonb,
                actual_hours = (
                    SELECT COALESCE(SUM((e->>'hours')::DOUBLE PRECISION), 0)
                    FROM jsonb_array_elements(time_entries || $2::jsonb) AS e
                )
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(Json([entry]))
            .fetch_optional(pool)
            .await
    }

    pub async fn add_comment(
        pool: &PgPool,
        id: DbId,
        comment: &TaskComment,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET comments = comments || $2::jsonb
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(Json([comment]))
            .fetch_optional(pool)
            .await
    }

    /// Mark a task invoiced under `invoice_number`.
    ///
    /// Only tasks currently `completed` or `invoiceable` are touched; returns
    /// `false` when the task is missing, deleted, or not ready for invoicing.
    pub async fn mark_invoiced(
        pool: &PgPool,
        id: DbId,
        invoice_number: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET
                invoiced = TRUE, invoice_number = $2, invoiced_at = $3, status = 'invoiced'
             WHERE id = $1 AND deleted_at IS NULL AND status IN ('completed', 'invoiceable')",
        )
        .bind(id)
        .bind(invoice_number)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revert every task still linked to `invoice_number` back to
    /// `completed`, whether or not a line item still references it. Returns
    /// the number of tasks reverted.
    pub async fn revert_invoiced<'e, E>(executor: E, invoice_number: &str) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE tasks SET
                invoiced = FALSE, invoice_number = NULL, invoiced_at = NULL, status = 'completed'
             WHERE invoiced AND invoice_number = $1",
        )
        .bind(invoice_number)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Number of non-deleted tasks in a project.
    pub async fn count_for_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM tasks WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    /// Status strings of every non-deleted task in a project.
    pub async fn statuses_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT status FROM tasks WHERE project_id = $1 AND deleted_at IS NULL")
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete a task by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn build_task_filter(filter: &TaskFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    clause.raw("deleted_at IS NULL");
    if let Some(status) = &filter.status {
        clause.eq("status", BindValue::Text(status.clone()));
    }
    if let Some(project_id) = filter.project_id {
        clause.eq("project_id", BindValue::BigInt(project_id));
    }
    if let Some(priority) = &filter.priority {
        clause.eq("priority", BindValue::Text(priority.clone()));
    }
    if let Some(assigned_to) = filter.assigned_to {
        clause.eq("assigned_to", BindValue::BigInt(assigned_to));
    }
    if let Some(before) = filter.due_before {
        clause.with(BindValue::Timestamp(before), |p| format!("due_date <= {p}"));
    }
    if let Some(after) = filter.due_after {
        clause.with(BindValue::Timestamp(after), |p| format!("due_date >= {p}"));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clause.search(&["title", "description", "task_number"], search);
    }
    clause
}
