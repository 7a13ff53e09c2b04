//! Repository for the `clients` table.

use opsdesk_core::pagination::{PageRequest, SortOrder};
use opsdesk_core::types::DbId;
use sqlx::PgPool;

use super::filter::{BindValue, WhereClause};
use crate::models::client::{Client, ClientFilter, CreateClient, UpdateClient};

const COLUMNS: &str = "id, name, email, phone, company, address, contact_person, status, \
                       created_at, updated_at";

/// Provides CRUD operations for clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a new client. `status` defaults to `active`.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (name, email, phone, company, address, contact_person, status)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'active'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(&input.address)
            .bind(&input.contact_person)
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// List one page of clients matching `filter`.
    pub async fn list(
        pool: &PgPool,
        filter: &ClientFilter,
        page: &PageRequest,
        sort: &SortOrder,
    ) -> Result<Vec<Client>, sqlx::Error> {
        let clause = build_client_filter(filter);
        let idx = clause.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM clients {} ORDER BY {}, id DESC LIMIT ${idx} OFFSET ${}",
            clause.sql(),
            sort.to_sql(),
            idx + 1
        );
        clause
            .bind_as(sqlx::query_as::<_, Client>(&query))
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Count clients matching `filter` (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &ClientFilter) -> Result<i64, sqlx::Error> {
        let clause = build_client_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM clients {}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Update a client. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                company = COALESCE($5, company),
                address = COALESCE($6, address),
                contact_person = COALESCE($7, contact_person),
                status = COALESCE($8, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(&input.address)
            .bind(&input.contact_person)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Whether any project (soft-deleted included) or invoice references the client.
    pub async fn is_referenced(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE client_id = $1)
                 OR EXISTS(SELECT 1 FROM invoices WHERE client_id = $1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Permanently delete a client. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn build_client_filter(filter: &ClientFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    if let Some(status) = &filter.status {
        clause.eq("status", BindValue::Text(status.clone()));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clause.search(&["name", "company", "email"], search);
    }
    clause
}
