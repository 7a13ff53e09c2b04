//! Repository for the `projects` table.
//!
//! `team` and `tasks` are `BIGINT[]` reference sets owned by the project;
//! membership changes are single-statement array updates.

use opsdesk_core::pagination::{PageRequest, SortOrder};
use opsdesk_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use super::filter::{BindValue, WhereClause};
use crate::models::project::{
    CreateProject, Project, ProjectDocument, ProjectFilter, ProjectNote, UpdateProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_number, name, description, client_id, manager_id, team, \
                       status, budget, tasks, documents, notes, start_date, end_date, \
                       created_by, deleted_at, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Duplicate team members in the input are collapsed. `status` defaults
    /// to `planning`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
        project_number: &str,
        created_by: DbId,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (project_number, name, description, client_id, manager_id, team,
                 status, budget, start_date, end_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'planning'), $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(project_number)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.client_id)
            .bind(input.manager_id)
            .bind(dedup(&input.team))
            .bind(&input.status)
            .bind(input.budget)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by ID, including soft-deleted rows.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of non-deleted projects matching `filter`.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
        page: &PageRequest,
        sort: &SortOrder,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let clause = build_project_filter(filter);
        let idx = clause.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM projects {} ORDER BY {}, id DESC LIMIT ${idx} OFFSET ${}",
            clause.sql(),
            sort.to_sql(),
            idx + 1
        );
        clause
            .bind_as(sqlx::query_as::<_, Project>(&query))
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Count non-deleted projects matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
        let clause = build_project_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM projects {}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied;
    /// `input.notes` is ignored here (see [`ProjectRepo::append_notes`]).
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                client_id = COALESCE($4, client_id),
                manager_id = COALESCE($5, manager_id),
                team = COALESCE($6, team),
                status = COALESCE($7, status),
                budget = COALESCE($8, budget),
                start_date = COALESCE($9, start_date),
                end_date = COALESCE($10, end_date)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.client_id)
            .bind(input.manager_id)
            .bind(input.team.as_deref().map(dedup))
            .bind(&input.status)
            .bind(input.budget)
            .bind(input.start_date)
            .bind(input.end_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET status = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Add `user_id` to the team unless already present.
    ///
    /// Returns `true` if the team changed.
    pub async fn add_team_member(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET team = array_append(team, $2)
             WHERE id = $1 AND deleted_at IS NULL AND NOT (team @> ARRAY[$2]::BIGINT[])",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove `user_id` from the team. Returns `true` if the team changed.
    pub async fn remove_team_member(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET team = array_remove(team, $2)
             WHERE id = $1 AND deleted_at IS NULL AND team @> ARRAY[$2]::BIGINT[]",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record `task_id` in the project's task set (idempotent).
    pub async fn append_task(pool: &PgPool, id: DbId, task_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET tasks = array_append(tasks, $2)
             WHERE id = $1 AND NOT (tasks @> ARRAY[$2]::BIGINT[])",
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_task(pool: &PgPool, id: DbId, task_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET tasks = array_remove(tasks, $2)
             WHERE id = $1 AND tasks @> ARRAY[$2]::BIGINT[]",
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append notes, keeping existing ones.
    pub async fn append_notes(
        pool: &PgPool,
        id: DbId,
        notes: &[ProjectNote],
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET notes = notes || $2::jsonb
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(Json(notes))
            .fetch_optional(pool)
            .await
    }

    pub async fn append_document(
        pool: &PgPool,
        id: DbId,
        document: &ProjectDocument,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET documents = documents || $2::jsonb
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(Json([document]))
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a project by ID. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn build_project_filter(filter: &ProjectFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    clause.raw("deleted_at IS NULL");
    if let Some(status) = &filter.status {
        clause.eq("status", BindValue::Text(status.clone()));
    }
    if let Some(client_id) = filter.client_id {
        clause.eq("client_id", BindValue::BigInt(client_id));
    }
    if let Some(member) = filter.member {
        clause.with(BindValue::BigInt(member), |p| {
            format!("(manager_id = {p} OR {p} = ANY(team))")
        });
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clause.search(&["name", "project_number"], search);
    }
    clause
}

/// Collapse duplicates, keeping first occurrence order.
fn dedup(ids: &[DbId]) -> Vec<DbId> {
    let mut out: Vec<DbId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup(&[]).is_empty());
    }
}
