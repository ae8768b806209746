use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::{generate_password, hash_password};
use crate::error::AppError;
use crate::forms::ValidNewUser;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Teacher, Role::Student, Role::Parent];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Parent => "Parent",
        }
    }

    /// Dashboard a signed-in user of this role lands on.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Teacher => "/teacher",
            Role::Student => "/student",
            Role::Parent => "/parent",
        }
    }

    /// Administrators are only ever created by another admin or the CLI.
    pub fn self_registrable(self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            other => Err(AppError::BadRequest(format!("Unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Pending,
    Inactive,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Active, UserStatus::Pending, UserStatus::Inactive];

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Pending => "pending",
            UserStatus::Inactive => "inactive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Pending => "Pending",
            UserStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "pending" => Ok(UserStatus::Pending),
            "inactive" => Ok(UserStatus::Inactive),
            other => Err(AppError::BadRequest(format!("Unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub grade_level: Option<i64>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What the API exposes about a user; never includes the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub grade_level: Option<i64>,
}

#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub grade_level: Option<i64>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn initial(&self) -> String {
        self.first_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.full_name(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
            grade_level: self.grade_level,
        }
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn create(pool: &SqlitePool, input: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, email, password_hash, role, status, grade_level, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.email.trim())
        .bind(&input.password_hash)
        .bind(input.role)
        .bind(input.status)
        .bind(input.grade_level)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            other => AppError::Database(other),
        })?;
        Ok(user)
    }

    /// All users, optionally narrowed to those whose name or email contains `search`.
    pub async fn list(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<User>, AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE (?1 IS NULL OR (first_name || ' ' || last_name) LIKE ?1 OR email LIKE ?1) ORDER BY last_name, first_name",
        )
        .bind(pattern)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn list_by_role(pool: &SqlitePool, role: Role) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = ? ORDER BY last_name, first_name",
        )
        .bind(role)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn update_access(
        pool: &SqlitePool,
        id: i64,
        role: Option<Role>,
        status: Option<UserStatus>,
    ) -> Result<User, AppError> {
        let existing = Self::get(pool, id).await?;
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = ?2, status = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(role.unwrap_or(existing.role))
        .bind(status.unwrap_or(existing.status))
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {id} not found")));
        }
        Ok(())
    }

    pub async fn touch_login(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn count_with_status(pool: &SqlitePool, status: UserStatus) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE status = ?")
            .bind(status)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Students linked to a parent account.
    pub async fn children_of(pool: &SqlitePool, parent_id: i64) -> Result<Vec<User>, AppError> {
        let children = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u JOIN guardians g ON g.student_id = u.id WHERE g.parent_id = ? ORDER BY u.first_name",
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await?;
        Ok(children)
    }

    pub async fn parents_of(pool: &SqlitePool, student_id: i64) -> Result<Vec<User>, AppError> {
        let parents = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u JOIN guardians g ON g.parent_id = u.id WHERE g.student_id = ?",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(parents)
    }

    pub async fn link_guardian(
        pool: &SqlitePool,
        parent_id: i64,
        student_id: i64,
    ) -> Result<(), AppError> {
        let parent = Self::get(pool, parent_id).await?;
        let student = Self::get(pool, student_id).await?;
        if parent.role != Role::Parent || student.role != Role::Student {
            return Err(AppError::BadRequest(
                "Guardian links join a parent to a student".to_string(),
            ));
        }
        sqlx::query("INSERT OR IGNORE INTO guardians (parent_id, student_id) VALUES (?, ?)")
            .bind(parent_id)
            .bind(student_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Account management from the admin console.
impl User {
    /// Create an account with a one-time password, returned for the admin
    /// to hand over.
    pub async fn provision(pool: &SqlitePool, admin: &User, input: ValidNewUser) -> Result<(User, String), AppError> {
        let password = generate_password();
        let user = Self::create(
            pool,
            NewUser {
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                password_hash: hash_password(&password)?,
                role: input.role,
                status: input.status,
                grade_level: input.grade_level,
            },
        )
        .await?;
        Activity::record(
            pool,
            Some(admin),
            ActivityKind::UserCreated,
            format!("Created {} account for {}", user.role.label().to_lowercase(), user.full_name()),
        )
        .await;
        tracing::info!(user_id = user.id, admin_id = admin.id, "account provisioned");
        Ok((user, password))
    }

    /// Change a user's role or status. Admins cannot lock themselves out,
    /// and deactivated users lose their sessions.
    pub async fn change_access(
        pool: &SqlitePool,
        admin: &User,
        id: i64,
        role: Option<Role>,
        status: Option<UserStatus>,
    ) -> Result<User, AppError> {
        if id == admin.id
            && (role.is_some_and(|r| r != Role::Admin) || status.is_some_and(|s| s != UserStatus::Active))
        {
            return Err(AppError::BadRequest(
                "You cannot demote or deactivate your own account".to_string(),
            ));
        }
        let user = Self::update_access(pool, id, role, status).await?;
        if user.status != UserStatus::Active {
            Session::delete_for_user(pool, user.id).await?;
        }
        Activity::record(
            pool,
            Some(admin),
            ActivityKind::UserUpdated,
            format!("Set {} to {} ({})", user.full_name(), user.role, user.status),
        )
        .await;
        Ok(user)
    }

    pub async fn remove(pool: &SqlitePool, admin: &User, id: i64) -> Result<(), AppError> {
        if id == admin.id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }
        let user = Self::get(pool, id).await?;
        Self::delete(pool, id).await?;
        Activity::record(
            pool,
            Some(admin),
            ActivityKind::UserDeleted,
            format!("Deleted {} ({})", user.full_name(), user.email),
        )
        .await;
        tracing::info!(user_id = id, admin_id = admin.id, "account deleted");
        Ok(())
    }

    /// A parent's children, or just the one picked. Picking a student who
    /// is not theirs is forbidden.
    pub async fn select_children(pool: &SqlitePool, parent_id: i64, child_id: Option<i64>) -> Result<Vec<User>, AppError> {
        let children = Self::children_of(pool, parent_id).await?;
        match child_id {
            None => Ok(children),
            Some(id) => {
                let child = children.into_iter().find(|c| c.id == id).ok_or_else(|| {
                    AppError::Forbidden("You can only view your own children".to_string())
                })?;
                Ok(vec![child])
            }
        }
    }
}
