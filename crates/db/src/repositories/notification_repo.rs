//! Repository for the `notifications` table.

use opsdesk_core::pagination::PageRequest;
use opsdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, recipient_id, sender_id, title, message, notification_type, \
                       entity_type, entity_id, link, is_read, read_at, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Persist a notification, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications
                (recipient_id, sender_id, title, message, notification_type,
                 entity_type, entity_id, link)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.recipient_id)
            .bind(input.sender_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(&input.notification_type)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(&input.link)
            .fetch_one(pool)
            .await
    }

    /// List notifications for a user, newest first.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only { "AND is_read = false" } else { "" };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let filter = if unread_only { "AND is_read = false" } else { "" };
        let query = format!(
            "SELECT COUNT(*)::BIGINT FROM notifications WHERE recipient_id = $1 {filter}"
        );
        sqlx::query_scalar(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `None` if the notification does not belong to `user_id`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND recipient_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        Self::count_for_user(pool, user_id, true).await
    }
}
