use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::attendance::AttendanceTally;
use crate::models::schedule::{self, NewSlot};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Science,
    English,
    History,
    Art,
    Pe,
}

impl Subject {
    pub const ALL: [Subject; 6] = [
        Subject::Math,
        Subject::Science,
        Subject::English,
        Subject::History,
        Subject::Art,
        Subject::Pe,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Science => "science",
            Subject::English => "english",
            Subject::History => "history",
            Subject::Art => "art",
            Subject::Pe => "pe",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Subject::Math => "Mathematics",
            Subject::Science => "Science",
            Subject::English => "English",
            Subject::History => "History",
            Subject::Art => "Art",
            Subject::Pe => "Physical Education",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.key().eq_ignore_ascii_case(s) || subject.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown subject: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: i64,
    pub name: String,
    pub subject: Subject,
    #[serde(rename = "grade")]
    pub grade_level: i64,
    pub room: String,
    pub schedule: String,
    pub teacher_id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClass {
    pub name: String,
    pub subject: Subject,
    pub grade_level: i64,
    pub room: String,
    #[serde(default)]
    pub schedule: String,
    /// Weekly periods shown on enrolled students' schedules.
    #[serde(default)]
    pub slots: Vec<NewSlot>,
}

/// A class card: the class plus roster size and running averages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOverview {
    #[serde(flatten)]
    pub class: SchoolClass,
    pub students: i64,
    pub attendance: f64,
    pub average_performance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub attendance: f64,
    pub performance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetail {
    #[serde(flatten)]
    pub overview: ClassOverview,
    pub student_list: Vec<RosterEntry>,
}

impl SchoolClass {
    /// Open a class for `teacher` together with its weekly periods.
    pub async fn create(pool: &SqlitePool, teacher: &User, input: CreateClass) -> Result<SchoolClass, AppError> {
        if input.name.trim().is_empty() {
            return Err(AppError::BadRequest("Class name is required".to_string()));
        }
        if input.room.trim().is_empty() {
            return Err(AppError::BadRequest("Room is required".to_string()));
        }
        if !(1..=12).contains(&input.grade_level) {
            return Err(AppError::BadRequest("Grade level must be between 1 and 12".to_string()));
        }
        for slot in &input.slots {
            slot.times()?;
        }

        let mut tx = pool.begin().await?;
        let class = sqlx::query_as::<_, SchoolClass>(
            "INSERT INTO classes (name, subject, grade_level, room, schedule, teacher_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.subject)
        .bind(input.grade_level)
        .bind(input.room.trim())
        .bind(input.schedule.trim())
        .bind(teacher.id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        for slot in &input.slots {
            schedule::add_slot(&mut *tx, class.id, slot).await?;
        }
        tx.commit().await?;

        tracing::info!(class_id = class.id, slots = input.slots.len(), "class created");
        Activity::record(
            pool,
            Some(teacher),
            ActivityKind::ClassCreated,
            format!("Created class {}", class.name),
        )
        .await;
        Ok(class)
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<SchoolClass, AppError> {
        sqlx::query_as::<_, SchoolClass>("SELECT * FROM classes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {id} not found")))
    }

    /// A class taught by `teacher_id`. Other teachers' classes read as missing.
    pub async fn get_owned(pool: &SqlitePool, id: i64, teacher_id: i64) -> Result<SchoolClass, AppError> {
        let class = Self::get(pool, id).await?;
        if class.teacher_id != teacher_id {
            return Err(AppError::NotFound(format!("Class {id} not found")));
        }
        Ok(class)
    }

    pub async fn for_teacher(pool: &SqlitePool, teacher_id: i64) -> Result<Vec<SchoolClass>, AppError> {
        let classes = sqlx::query_as::<_, SchoolClass>(
            "SELECT * FROM classes WHERE teacher_id = ? ORDER BY name",
        )
        .bind(teacher_id)
        .fetch_all(pool)
        .await?;
        Ok(classes)
    }

    pub async fn for_student(pool: &SqlitePool, student_id: i64) -> Result<Vec<SchoolClass>, AppError> {
        let classes = sqlx::query_as::<_, SchoolClass>(
            "SELECT c.* FROM classes c JOIN enrollments e ON e.class_id = c.id WHERE e.student_id = ? ORDER BY c.name",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(classes)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM classes")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn is_enrolled(pool: &SqlitePool, class_id: i64, student_id: i64) -> Result<bool, AppError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE class_id = ? AND student_id = ?)",
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    pub async fn enroll(pool: &SqlitePool, class_id: i64, student: &User) -> Result<(), AppError> {
        if student.role != Role::Student {
            return Err(AppError::BadRequest(format!(
                "{} is not a student account",
                student.email
            )));
        }
        let result = sqlx::query("INSERT OR IGNORE INTO enrollments (class_id, student_id) VALUES (?, ?)")
            .bind(class_id)
            .bind(student.id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "{} is already enrolled",
                student.full_name()
            )));
        }
        Ok(())
    }

    pub async fn roster(pool: &SqlitePool, class_id: i64) -> Result<Vec<User>, AppError> {
        let students = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u JOIN enrollments e ON e.student_id = u.id WHERE e.class_id = ? ORDER BY u.last_name, u.first_name",
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;
        Ok(students)
    }

    pub async fn teacher_name(&self, pool: &SqlitePool) -> Result<String, AppError> {
        Ok(User::get(pool, self.teacher_id).await?.full_name())
    }

    /// Mean percentage over graded submissions in this class, optionally for one student.
    pub async fn average_score(&self, pool: &SqlitePool, student_id: Option<i64>) -> Result<f64, AppError> {
        let row: (Option<f64>,) = sqlx::query_as(
            "SELECT AVG(s.score * 100.0 / a.points) FROM submissions s JOIN assignments a ON a.id = s.assignment_id WHERE a.class_id = ?1 AND s.score IS NOT NULL AND (?2 IS NULL OR s.student_id = ?2)",
        )
        .bind(self.id)
        .bind(student_id)
        .fetch_one(pool)
        .await?;
        Ok(round1(row.0.unwrap_or(0.0)))
    }

    pub async fn overview(self, pool: &SqlitePool) -> Result<ClassOverview, AppError> {
        let (students,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE class_id = ?")
            .bind(self.id)
            .fetch_one(pool)
            .await?;
        let attendance = AttendanceTally::load(pool, None, Some(self.id), None, None)
            .await?
            .rate();
        let average_performance = self.average_score(pool, None).await?;
        Ok(ClassOverview {
            class: self,
            students,
            attendance,
            average_performance,
        })
    }

    pub async fn detail(self, pool: &SqlitePool) -> Result<ClassDetail, AppError> {
        let roster = Self::roster(pool, self.id).await?;
        let mut student_list = Vec::with_capacity(roster.len());
        for student in roster {
            let attendance = AttendanceTally::load(pool, Some(student.id), Some(self.id), None, None)
                .await?
                .rate();
            let performance = self.average_score(pool, Some(student.id)).await?;
            student_list.push(RosterEntry {
                id: student.id,
                name: student.full_name(),
                email: student.email,
                attendance,
                performance,
            });
        }
        Ok(ClassDetail {
            overview: self.overview(pool).await?,
            student_list,
        })
    }
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
