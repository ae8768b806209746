use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::auth::{generate_token, hash_token};
use crate::error::AppError;
use crate::models::user::User;

/// Server-side half of a login session. Only the SHA-256 of the cookie
/// token is stored.
pub struct Session;

impl Session {
    /// Open a session for `user_id` and return the raw cookie token.
    pub async fn create(pool: &SqlitePool, user_id: i64, ttl_hours: i64) -> Result<String, AppError> {
        let raw_token = generate_token();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(hash_token(&raw_token))
        .bind(now + Duration::hours(ttl_hours))
        .bind(now)
        .execute(pool)
        .await?;
        Ok(raw_token)
    }

    /// The active user behind a cookie token, if the session is still valid.
    pub async fn user_for_token(pool: &SqlitePool, raw_token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.* FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token_hash = ? AND s.expires_at > ? AND u.status = 'active'",
        )
        .bind(hash_token(raw_token))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(pool: &SqlitePool, raw_token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(raw_token))
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn delete_for_user(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Drop expired sessions; returns how many were removed.
    pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
