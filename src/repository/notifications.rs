//! Notifications repository: append-only outbox plus read-state operations

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    domain::notify::NotificationIntent,
    error::{AppError, AppResult},
    models::{notification::NotificationQuery, Notification},
    repository::page_limits,
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one outbox row inside the caller's transaction, so the
    /// notification commits or rolls back together with the transition
    /// that triggered it.
    pub async fn append(
        conn: &mut PgConnection,
        user_id: i64,
        intent: &NotificationIntent,
    ) -> AppResult<()> {
        let draft = intent.render();
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, kind, read, sent_at, payload)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(&draft.title)
        .bind(&draft.message)
        .bind(draft.kind)
        .bind(Utc::now())
        .bind(&draft.payload)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// List a user's notifications, newest first
    pub async fn list(
        &self,
        user_id: i64,
        query: &NotificationQuery,
    ) -> AppResult<Vec<Notification>> {
        let (limit, offset) = page_limits(query.page, query.per_page);
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY sent_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(query.kind.map(|k| k.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    /// List unread notifications, newest first
    pub async fn list_unread(&self, user_id: i64) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND read = FALSE ORDER BY sent_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    /// Mark one notification read; scoped to the owner
    pub async fn mark_read(&self, id: i64, user_id: i64) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = TRUE, read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }

    /// Mark everything read; returns the number of rows flipped
    pub async fn mark_all_read(&self, user_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, read_at = $2 WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one notification; scoped to the owner
    pub async fn delete(&self, id: i64, user_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Notification with id {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Delete all read notifications; returns the number deleted
    pub async fn delete_read(&self, user_id: i64) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND read = TRUE")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
