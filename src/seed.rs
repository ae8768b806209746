//! Demo school used by `portal seed-demo` and the integration tests.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday as ChronoWeekday};
use sqlx::SqlitePool;

use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::announcement::{Announcement, Audience, CreateAnnouncement};
use crate::models::attendance::AttendanceStatus;
use crate::models::class::{CreateClass, SchoolClass, Subject};
use crate::models::schedule::MeetingDays;
use crate::models::user::{NewUser, Role, User, UserStatus};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "demo1234";

#[derive(Debug, Default)]
pub struct SeedSummary {
    pub users: usize,
    pub classes: usize,
    pub assignments: usize,
    pub attendance: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Seeded {} users, {} classes, {} assignments and {} attendance marks (password: {DEMO_PASSWORD})",
            self.users, self.classes, self.assignments, self.attendance
        )
    }
}

struct Seeder<'a> {
    pool: &'a SqlitePool,
    password_hash: String,
    summary: SeedSummary,
}

impl Seeder<'_> {
    async fn user(
        &mut self,
        first: &str,
        last: &str,
        email: &str,
        role: Role,
        grade_level: Option<i64>,
    ) -> Result<User, AppError> {
        let user = User::create(
            self.pool,
            NewUser {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                password_hash: self.password_hash.clone(),
                role,
                status: UserStatus::Active,
                grade_level,
            },
        )
        .await?;
        self.summary.users += 1;
        Ok(user)
    }

    async fn class(
        &mut self,
        teacher: &User,
        name: &str,
        subject: Subject,
        room: &str,
        start: &str,
        end: &str,
    ) -> Result<SchoolClass, AppError> {
        let class = SchoolClass::create(
            self.pool,
            teacher,
            CreateClass {
                name: name.to_string(),
                subject,
                grade_level: 7,
                room: room.to_string(),
                schedule: format!("Mon-Fri {start}"),
                slots: MeetingDays::Daily.slots(start, end),
            },
        )
        .await?;
        self.summary.classes += 1;
        Ok(class)
    }

    /// Insert an assignment directly so past due dates and statuses can be set.
    async fn assignment(
        &mut self,
        class: &SchoolClass,
        title: &str,
        due_in_days: i64,
        points: i64,
        status: &str,
    ) -> Result<i64, AppError> {
        let now = Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO assignments (class_id, title, description, due_at, points, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(class.id)
        .bind(title)
        .bind(format!("{title} for {}", class.name))
        .bind(now + Duration::days(due_in_days))
        .bind(points)
        .bind(status)
        .bind(now - Duration::days(due_in_days.abs() + 7))
        .fetch_one(self.pool)
        .await?;
        self.summary.assignments += 1;
        Ok(id)
    }

    async fn submission(
        &self,
        assignment_id: i64,
        student: &User,
        days_ago: i64,
        score: Option<f64>,
        feedback: Option<&str>,
    ) -> Result<(), AppError> {
        let submitted_at = Utc::now() - Duration::days(days_ago);
        sqlx::query(
            "INSERT INTO submissions (assignment_id, student_id, content, submitted_at, score, feedback, graded_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(assignment_id)
        .bind(student.id)
        .bind(format!("Work by {}", student.full_name()))
        .bind(submitted_at)
        .bind(score)
        .bind(feedback)
        .bind(score.map(|_| submitted_at + Duration::days(1)))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn attendance(
        &mut self,
        student: &User,
        class: &SchoolClass,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO attendance (student_id, class_id, date, status, notes) VALUES (?, ?, ?, ?, '')")
            .bind(student.id)
            .bind(class.id)
            .bind(date)
            .bind(status)
            .execute(self.pool)
            .await?;
        self.summary.attendance += 1;
        Ok(())
    }
}

/// The last `count` school days before today, oldest first.
fn recent_school_days(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = std::iter::successors(today.pred_opt(), |d| d.pred_opt())
        .filter(|d| !matches!(d.weekday(), ChronoWeekday::Sat | ChronoWeekday::Sun))
        .take(count)
        .collect();
    days.reverse();
    days
}

/// Fill an empty database with a small demo school. Refuses to touch a
/// database that already has accounts.
pub async fn seed_demo(pool: &SqlitePool) -> Result<SeedSummary, AppError> {
    if User::count(pool).await? > 0 {
        return Err(AppError::Conflict(
            "Database already has users; refusing to seed".to_string(),
        ));
    }

    let mut seeder = Seeder {
        pool,
        password_hash: hash_password(DEMO_PASSWORD)?,
        summary: SeedSummary::default(),
    };

    let admin = seeder.user("Alice", "Morgan", "admin@school.test", Role::Admin, None).await?;
    let garcia = seeder.user("Maria", "Garcia", "teacher@school.test", Role::Teacher, None).await?;
    let chen = seeder.user("David", "Chen", "dchen@school.test", Role::Teacher, None).await?;
    let sam = seeder.user("Sam", "Lee", "student@school.test", Role::Student, Some(7)).await?;
    let emma = seeder.user("Emma", "Lee", "emma@school.test", Role::Student, Some(7)).await?;
    let noah = seeder.user("Noah", "Patel", "noah@school.test", Role::Student, Some(7)).await?;
    let parent = seeder.user("Jordan", "Lee", "parent@school.test", Role::Parent, None).await?;
    User::link_guardian(pool, parent.id, sam.id).await?;
    User::link_guardian(pool, parent.id, emma.id).await?;

    let algebra = seeder.class(&garcia, "Algebra I", Subject::Math, "Room 101", "08:00", "08:50").await?;
    let english = seeder.class(&garcia, "English 7", Subject::English, "Room 110", "09:00", "09:50").await?;
    let science = seeder.class(&chen, "Life Science", Subject::Science, "Lab 204", "10:00", "10:50").await?;

    let students = [&sam, &emma, &noah];
    for class in [&algebra, &english, &science] {
        for student in students {
            SchoolClass::enroll(pool, class.id, student).await?;
        }
    }

    let quiz = seeder.assignment(&algebra, "Linear Equations Quiz", -10, 20, "closed").await?;
    seeder.submission(quiz, &sam, 11, Some(18.0), Some("Strong work on word problems")).await?;
    seeder.submission(quiz, &emma, 11, Some(15.5), Some("Check your signs")).await?;
    seeder.submission(quiz, &noah, 9, Some(11.0), None).await?;

    let essay = seeder.assignment(&english, "Personal Narrative", -5, 50, "grading").await?;
    seeder.submission(essay, &sam, 6, Some(44.0), Some("Vivid details")).await?;
    seeder.submission(essay, &emma, 5, None, None).await?;

    let lab = seeder.assignment(&science, "Cell Structure Lab", -3, 30, "active").await?;
    seeder.submission(lab, &sam, 2, None, None).await?;
    seeder.submission(lab, &noah, 4, Some(24.0), Some("Good diagrams")).await?;

    seeder.assignment(&algebra, "Graphing Worksheet", 2, 10, "active").await?;
    seeder.assignment(&english, "Vocabulary Unit 4", 6, 15, "active").await?;
    seeder.assignment(&science, "Ecosystem Project", 12, 100, "active").await?;
    seeder.assignment(&algebra, "Unit Test Review", 20, 25, "pending").await?;

    let today = Utc::now().date_naive();
    for (i, date) in recent_school_days(today, 10).into_iter().enumerate() {
        for class in [&algebra, &english, &science] {
            for (j, student) in students.iter().enumerate() {
                let status = match (i + j) % 9 {
                    4 => AttendanceStatus::Late,
                    7 if j == 2 => AttendanceStatus::Absent,
                    8 if i == 0 => AttendanceStatus::Excused,
                    _ => AttendanceStatus::Present,
                };
                seeder.attendance(student, class, date, status).await?;
            }
        }
    }

    Announcement::publish(
        pool,
        &admin,
        CreateAnnouncement {
            title: "Welcome back".to_string(),
            body: "The portal is live. Check your dashboard for classes and assignments.".to_string(),
            audience: Audience::All,
        },
    )
    .await?;

    tracing::info!(users = seeder.summary.users, "Demo school seeded");
    Ok(seeder.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_days_skip_weekends() {
        // 2026-10-19 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let days = recent_school_days(monday, 3);
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            ]
        );
    }
}
