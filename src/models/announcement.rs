use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::notification::Notification;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Audience {
    All,
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Audience {
    pub const ALL: [Audience; 5] = [
        Audience::All,
        Audience::Admin,
        Audience::Teacher,
        Audience::Student,
        Audience::Parent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Admin => "admin",
            Audience::Teacher => "teacher",
            Audience::Student => "student",
            Audience::Parent => "parent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Audience::All => "Everyone",
            Audience::Admin => "Admins",
            Audience::Teacher => "Teachers",
            Audience::Student => "Students",
            Audience::Parent => "Parents",
        }
    }
}

impl FromStr for Audience {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Audience::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| AppError::BadRequest(format!("Unknown audience: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    #[serde(skip)]
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncement {
    pub title: String,
    pub body: String,
    pub audience: Audience,
}

impl Announcement {
    pub fn posted(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }

    /// Publish an announcement and notify every active user in its audience.
    pub async fn publish(pool: &SqlitePool, author: &User, input: CreateAnnouncement) -> Result<Announcement, AppError> {
        if input.title.trim().is_empty() || input.body.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Announcements need a title and a message".to_string(),
            ));
        }

        let mut tx = pool.begin().await?;
        let announcement = sqlx::query_as::<_, Announcement>(
            "INSERT INTO announcements (title, body, audience, author_id, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(input.title.trim())
        .bind(input.body.trim())
        .bind(input.audience)
        .bind(author.id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let recipients: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE status = 'active' AND (?1 = 'all' OR role = ?1)",
        )
        .bind(input.audience)
        .fetch_all(&mut *tx)
        .await?;
        for (user_id,) in &recipients {
            Notification::create(&mut *tx, *user_id, &announcement.title, &announcement.body).await?;
        }
        tx.commit().await?;

        tracing::info!(
            announcement_id = announcement.id,
            recipients = recipients.len(),
            "Announcement published"
        );
        Activity::record(
            pool,
            Some(author),
            ActivityKind::Announcement,
            format!("Posted announcement \"{}\"", announcement.title),
        )
        .await;
        Ok(announcement)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Announcement>, AppError> {
        let announcements = sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(announcements)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM announcements")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
