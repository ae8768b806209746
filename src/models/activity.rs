use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    Register,
    UserCreated,
    UserUpdated,
    UserDeleted,
    Announcement,
    ClassCreated,
    AssignmentCreated,
    Submission,
    Grade,
    Attendance,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    #[serde(skip)]
    pub user_id: Option<i64>,
    #[serde(rename = "user")]
    pub actor: String,
    pub kind: ActivityKind,
    pub description: String,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
}

impl Activity {
    pub fn when(&self) -> String {
        self.occurred_at.format("%b %-d, %Y %H:%M").to_string()
    }

    /// Append an entry to the audit trail. Failures are logged, not returned:
    /// the action being recorded has already happened.
    pub async fn record(pool: &SqlitePool, actor: Option<&User>, kind: ActivityKind, description: impl Into<String>) {
        let description = description.into();
        let result = sqlx::query(
            "INSERT INTO activities (user_id, actor, kind, description, occurred_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(actor.map(|u| u.id))
        .bind(actor.map(User::full_name).unwrap_or_else(|| "System".to_string()))
        .bind(kind)
        .bind(&description)
        .bind(Utc::now())
        .execute(pool)
        .await;
        if let Err(e) = result {
            tracing::warn!(?kind, "Failed to record activity: {e}");
        }
    }

    pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities ORDER BY occurred_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(activities)
    }

    /// Timestamps of activities of the given kinds (all kinds when empty) in `[from, to)`.
    pub async fn timestamps_between(
        pool: &SqlitePool,
        kinds: &[ActivityKind],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let rows: Vec<(ActivityKind, DateTime<Utc>)> = sqlx::query_as(
            "SELECT kind, occurred_at FROM activities WHERE occurred_at >= ? AND occurred_at < ? ORDER BY occurred_at",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter(|(kind, _)| kinds.is_empty() || kinds.contains(kind))
            .map(|(_, at)| at)
            .collect())
    }

    pub async fn count_between(
        pool: &SqlitePool,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM activities WHERE kind = ? AND occurred_at >= ? AND occurred_at < ?",
        )
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    pub async fn distinct_users_between(
        pool: &SqlitePool,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT user_id) FROM activities WHERE kind = ? AND occurred_at >= ? AND occurred_at < ?",
        )
        .bind(kind)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
