//! Repository for the append-only `activities` table.

use opsdesk_core::pagination::PageRequest;
use sqlx::PgPool;

use super::filter::{BindValue, WhereClause};
use crate::models::activity::{Activity, ActivityFilter, CreateActivity};

const COLUMNS: &str =
    "id, activity_type, title, description, entity_type, entity_id, user_id, link, created_at";

pub struct ActivityRepo;

impl ActivityRepo {
    pub async fn create(pool: &PgPool, input: &CreateActivity) -> Result<Activity, sqlx::Error> {
        let query = format!(
            "INSERT INTO activities
                (activity_type, title, description, entity_type, entity_id, user_id, link)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activity>(&query)
            .bind(&input.activity_type)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(input.user_id)
            .bind(&input.link)
            .fetch_one(pool)
            .await
    }

    /// Newest entries first.
    pub async fn list(
        pool: &PgPool,
        filter: &ActivityFilter,
        page: &PageRequest,
    ) -> Result<Vec<Activity>, sqlx::Error> {
        let clause = build_activity_filter(filter);
        let idx = clause.next_index();
        let query = format!(
            "SELECT {COLUMNS} FROM activities {} \
             ORDER BY created_at DESC, id DESC LIMIT ${idx} OFFSET ${}",
            clause.sql(),
            idx + 1
        );
        clause
            .bind_as(sqlx::query_as::<_, Activity>(&query))
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &ActivityFilter) -> Result<i64, sqlx::Error> {
        let clause = build_activity_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM activities {}", clause.sql());
        clause
            .bind_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }
}

fn build_activity_filter(filter: &ActivityFilter) -> WhereClause {
    let mut clause = WhereClause::new();
    if let Some(entity_type) = &filter.entity_type {
        clause.eq("entity_type", BindValue::Text(entity_type.clone()));
    }
    if let Some(entity_id) = filter.entity_id {
        clause.eq("entity_id", BindValue::BigInt(entity_id));
    }
    clause
}
