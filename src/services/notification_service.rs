use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::notification::{NewNotification, Notification};
use crate::utils::pagination::{Page, Pagination};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, link, read_at, created_at";

/// Counters re-derived on every inbox poll.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InboxCounts {
    pub unread_messages: i64,
    pub unread_notifications: i64,
    pub new_alert_matches: i64,
}

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts on the caller's connection so the notification commits with
    /// the change it reports.
    pub async fn insert(conn: &mut PgConnection, new: &NewNotification) -> Result<Notification> {
        let sql = format!(
            "INSERT INTO notifications (user_id, kind, title, body, link) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(new.user_id)
            .bind(new.kind.as_str())
            .bind(&new.title)
            .bind(&new.body)
            .bind(&new.link)
            .fetch_one(&mut *conn)
            .await?;
        Ok(notification)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> Result<Page<Notification>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            NOTIFICATION_COLUMNS
        );
        let items = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(pagination.per_page)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR read_at IS NULL)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        let sql = format!(
            "UPDATE notifications SET read_at = COALESCE(read_at, NOW()) WHERE id = $1 AND user_id = $2 RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Notification not found".into()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn inbox_counts(&self, user_id: Uuid) -> Result<InboxCounts> {
        let counts = sqlx::query_as::<_, InboxCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM messages m
                   JOIN conversations c ON c.id = m.conversation_id
                  WHERE (c.participant_low = $1 OR c.participant_high = $1)
                    AND m.sender_id <> $1
                    AND m.read_at IS NULL) AS unread_messages,
                (SELECT COUNT(*) FROM notifications n
                  WHERE n.user_id = $1 AND n.read_at IS NULL) AS unread_notifications,
                (SELECT COUNT(*) FROM alert_matches am
                   JOIN alerts a ON a.id = am.alert_id
                  WHERE a.owner_id = $1 AND am.seen_at IS NULL) AS new_alert_matches
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
