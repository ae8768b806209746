use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub title: String,
    pub message: String,
    #[serde(skip)]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub read: bool,
}

impl Notification {
    pub fn date(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn view(self) -> NotificationView {
        let read = self.is_read();
        NotificationView {
            notification: self,
            read,
        }
    }

    pub async fn create<'e, E>(exec: E, user_id: i64, title: &str, message: &str) -> Result<(), AppError>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query("INSERT INTO notifications (user_id, title, message, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(title)
            .bind(message)
            .bind(Utc::now())
            .execute(exec)
            .await?;
        Ok(())
    }

    /// Send the same notification to several users.
    pub async fn notify_all(pool: &SqlitePool, user_ids: &[i64], title: &str, message: &str) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        for &user_id in user_ids {
            Self::create(&mut *tx, user_id, title, message).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn for_user(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET read_at = ? WHERE user_id = ? AND read_at IS NULL")
            .bind(Utc::now())
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
