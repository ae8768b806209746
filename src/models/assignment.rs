use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::class::{SchoolClass, Subject, round1};
use crate::models::notification::Notification;
use crate::models::user::User;

/// How far ahead the teacher dashboard looks for due work.
pub const UPCOMING_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Pending,
    Closed,
    Grading,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 4] = [
        AssignmentStatus::Active,
        AssignmentStatus::Pending,
        AssignmentStatus::Closed,
        AssignmentStatus::Grading,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Closed => "closed",
            AssignmentStatus::Grading => "grading",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "Active",
            AssignmentStatus::Pending => "Pending",
            AssignmentStatus::Closed => "Closed",
            AssignmentStatus::Grading => "Grading",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AssignmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown assignment status: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_at: DateTime<Utc>,
    pub points: i64,
    pub status: AssignmentStatus,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// An assignment as the teacher sees it in listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignment {
    pub id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "dueDate")]
    pub due_at: DateTime<Utc>,
    pub points: i64,
    pub status: AssignmentStatus,
    pub submissions: i64,
    pub graded: i64,
}

impl TeacherAssignment {
    pub fn due(&self) -> String {
        self.due_at.format("%b %-d, %Y").to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    pub class_id: i64,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn for_days_left(days: i64) -> Priority {
        if days <= 2 {
            Priority::High
        } else if days <= 7 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub id: i64,
    pub title: String,
    pub class_name: String,
    pub due_date: DateTime<Utc>,
    pub days_left: i64,
    pub priority: Priority,
}

impl UpcomingTask {
    pub fn due(&self) -> String {
        self.due_date.format("%b %-d").to_string()
    }
}

/// Parse a due date from a form: `YYYY-MM-DD` (end of that day), a
/// `datetime-local` value, or RFC 3339.
pub fn parse_due(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Ok(at.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()).and_utc())
        .map_err(|_| AppError::BadRequest(format!("Invalid due date: {value:?}")))
}

/// Whole calendar days from `now` until `due`.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due.date_naive() - now.date_naive()).num_days()
}

impl Assignment {
    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {id} not found")))
    }

    pub async fn create(pool: &SqlitePool, teacher: &User, input: CreateAssignment) -> Result<Assignment, AppError> {
        if input.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if input.points <= 0 {
            return Err(AppError::BadRequest("Points must be positive".to_string()));
        }
        let due_at = parse_due(&input.due_date)?;
        let class = SchoolClass::get_owned(pool, input.class_id, teacher.id).await?;

        let assignment = sqlx::query_as::<_, Assignment>(
            "INSERT INTO assignments (class_id, title, description, due_at, points, status, created_at) VALUES (?, ?, ?, ?, ?, 'active', ?) RETURNING *",
        )
        .bind(class.id)
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(due_at)
        .bind(input.points)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Activity::record(
            pool,
            Some(teacher),
            ActivityKind::AssignmentCreated,
            format!("Created assignment \"{}\"", assignment.title),
        )
        .await;
        Ok(assignment)
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: i64,
        teacher_id: i64,
        status: AssignmentStatus,
    ) -> Result<Assignment, AppError> {
        let existing = Self::get(pool, id).await?;
        SchoolClass::get_owned(pool, existing.class_id, teacher_id).await?;
        let assignment = sqlx::query_as::<_, Assignment>(
            "UPDATE assignments SET status = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(assignment)
    }

    /// A teacher's assignments, newest due date first, optionally for one class.
    pub async fn for_teacher(
        pool: &SqlitePool,
        teacher_id: i64,
        class_id: Option<i64>,
    ) -> Result<Vec<TeacherAssignment>, AppError> {
        let rows = sqlx::query_as::<_, TeacherAssignment>(
            "SELECT a.id, a.class_id, c.name AS class_name, a.title, a.description, a.due_at, a.points, a.status, \
             (SELECT COUNT(*) FROM submissions s WHERE s.assignment_id = a.id) AS submissions, \
             (SELECT COUNT(*) FROM submissions s WHERE s.assignment_id = a.id AND s.score IS NOT NULL) AS graded \
             FROM assignments a JOIN classes c ON c.id = a.class_id \
             WHERE c.teacher_id = ?1 AND (?2 IS NULL OR a.class_id = ?2) \
             ORDER BY a.due_at DESC, a.id DESC",
        )
        .bind(teacher_id)
        .bind(class_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Open assignments due in the next [`UPCOMING_DAYS`] days, soonest first.
    pub async fn upcoming(pool: &SqlitePool, teacher_id: i64, now: DateTime<Utc>) -> Result<Vec<UpcomingTask>, AppError> {
        let rows: Vec<(i64, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT a.id, a.title, c.name, a.due_at FROM assignments a JOIN classes c ON c.id = a.class_id \
             WHERE c.teacher_id = ? AND a.status != 'closed' AND a.due_at >= ? AND a.due_at <= ? \
             ORDER BY a.due_at",
        )
        .bind(teacher_id)
        .bind(now)
        .bind(now + Duration::days(UPCOMING_DAYS))
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, title, class_name, due_date)| {
                let days_left = days_until(due_date, now);
                UpcomingTask {
                    id,
                    title,
                    class_name,
                    due_date,
                    days_left,
                    priority: Priority::for_days_left(days_left),
                }
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeSubmission {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// A submission waiting in the teacher's grading queue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentSubmission {
    pub id: i64,
    pub student_name: String,
    pub assignment_title: String,
    pub class_name: String,
    pub submitted_at: DateTime<Utc>,
}

impl RecentSubmission {
    pub fn when(&self) -> String {
        self.submitted_at.format("%b %-d, %H:%M").to_string()
    }
}

/// Everything the grading form shows about one submission.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GradingView {
    pub id: i64,
    pub student_name: String,
    pub assignment_title: String,
    pub class_name: String,
    pub content: String,
    pub points: i64,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Submission, AppError> {
        sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))
    }

    /// Hand in (or replace) a student's work. Graded work is final.
    pub async fn submit(
        pool: &SqlitePool,
        student: &User,
        assignment_id: i64,
        content: &str,
    ) -> Result<Submission, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Submission cannot be empty".to_string()));
        }
        let assignment = Assignment::get(pool, assignment_id).await?;
        if !SchoolClass::is_enrolled(pool, assignment.class_id, student.id).await? {
            return Err(AppError::NotFound(format!("Assignment {assignment_id} not found")));
        }
        if assignment.status != AssignmentStatus::Active {
            return Err(AppError::BadRequest(
                "This assignment is not accepting submissions".to_string(),
            ));
        }

        let submission = sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (assignment_id, student_id, content, submitted_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (assignment_id, student_id) DO UPDATE SET content = excluded.content, submitted_at = excluded.submitted_at \
             WHERE submissions.score IS NULL \
             RETURNING *",
        )
        .bind(assignment_id)
        .bind(student.id)
        .bind(content.trim())
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::Conflict("This assignment has already been graded".to_string()))?;
        Activity::record(
            pool,
            Some(student),
            ActivityKind::Submission,
            format!("{} submitted \"{}\"", student.full_name(), assignment.title),
        )
        .await;
        Ok(submission)
    }

    /// Score a submission in one of the teacher's classes and tell the
    /// student and their parents.
    pub async fn grade(
        pool: &SqlitePool,
        teacher: &User,
        id: i64,
        input: GradeSubmission,
    ) -> Result<Submission, AppError> {
        let submission = Self::get(pool, id).await?;
        let assignment = Assignment::get(pool, submission.assignment_id).await?;
        SchoolClass::get_owned(pool, assignment.class_id, teacher.id)
            .await
            .map_err(|_| AppError::NotFound(format!("Submission {id} not found")))?;

        if !input.score.is_finite() || input.score < 0.0 || input.score > assignment.points as f64 {
            return Err(AppError::BadRequest(format!(
                "Score must be between 0 and {}",
                assignment.points
            )));
        }

        let feedback = Some(input.feedback.trim()).filter(|f| !f.is_empty());
        let graded = sqlx::query_as::<_, Submission>(
            "UPDATE submissions SET score = ?, feedback = ?, graded_at = ? WHERE id = ? RETURNING *",
        )
        .bind(input.score)
        .bind(feedback)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(pool)
        .await?;

        let student = User::get(pool, graded.student_id).await?;
        let mut recipients: Vec<i64> = User::parents_of(pool, student.id)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        recipients.push(student.id);
        Notification::notify_all(
            pool,
            &recipients,
            "Assignment graded",
            &format!(
                "{} scored {}/{} on {}",
                student.full_name(),
                round1(input.score),
                assignment.points,
                assignment.title
            ),
        )
        .await?;
        Activity::record(
            pool,
            Some(teacher),
            ActivityKind::Grade,
            format!("Graded {} on \"{}\"", student.full_name(), assignment.title),
        )
        .await;
        Ok(graded)
    }

    /// Ungraded submissions to the teacher's classes, newest first.
    pub async fn recent_ungraded(pool: &SqlitePool, teacher_id: i64, limit: i64) -> Result<Vec<RecentSubmission>, AppError> {
        let rows = sqlx::query_as::<_, RecentSubmission>(
            "SELECT s.id, (u.first_name || ' ' || u.last_name) AS student_name, a.title AS assignment_title, \
             c.name AS class_name, s.submitted_at \
             FROM submissions s \
             JOIN assignments a ON a.id = s.assignment_id \
             JOIN classes c ON c.id = a.class_id \
             JOIN users u ON u.id = s.student_id \
             WHERE c.teacher_id = ? AND s.score IS NULL \
             ORDER BY s.submitted_at DESC, s.id DESC LIMIT ?",
        )
        .bind(teacher_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn grading_view(pool: &SqlitePool, teacher_id: i64, id: i64) -> Result<GradingView, AppError> {
        sqlx::query_as::<_, GradingView>(
            "SELECT s.id, (u.first_name || ' ' || u.last_name) AS student_name, a.title AS assignment_title, \
             c.name AS class_name, s.content, a.points, s.score, s.feedback, s.submitted_at \
             FROM submissions s \
             JOIN assignments a ON a.id = s.assignment_id \
             JOIN classes c ON c.id = a.class_id \
             JOIN users u ON u.id = s.student_id \
             WHERE s.id = ? AND c.teacher_id = ?",
        )
        .bind(id)
        .bind(teacher_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))
    }
}

/// Where a student stands on one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Pending,
    Submitted,
    Late,
    Overdue,
    Graded,
}

impl StudentStatus {
    pub fn derive(
        due_at: DateTime<Utc>,
        submitted_at: Option<DateTime<Utc>>,
        score: Option<f64>,
        now: DateTime<Utc>,
    ) -> StudentStatus {
        match (submitted_at, score) {
            (Some(_), Some(_)) => StudentStatus::Graded,
            (Some(at), None) if at > due_at => StudentStatus::Late,
            (Some(_), None) => StudentStatus::Submitted,
            (None, _) if now > due_at => StudentStatus::Overdue,
            (None, _) => StudentStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Pending => "pending",
            StudentStatus::Submitted => "submitted",
            StudentStatus::Late => "late",
            StudentStatus::Overdue => "overdue",
            StudentStatus::Graded => "graded",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StudentStatus::Pending => "Pending",
            StudentStatus::Submitted => "Submitted",
            StudentStatus::Late => "Late",
            StudentStatus::Overdue => "Overdue",
            StudentStatus::Graded => "Graded",
        }
    }

    pub fn is_handed_in(self) -> bool {
        matches!(
            self,
            StudentStatus::Submitted | StudentStatus::Late | StudentStatus::Graded
        )
    }
}

/// The status filter pills on the student assignment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Submitted,
    Graded,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Submitted,
        StatusFilter::Graded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Submitted => "submitted",
            StatusFilter::Graded => "graded",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Submitted => "Submitted",
            StatusFilter::Graded => "Graded",
        }
    }

    pub fn matches(self, status: StudentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => {
                matches!(status, StudentStatus::Pending | StudentStatus::Overdue)
            }
            StatusFilter::Submitted => {
                matches!(status, StudentStatus::Submitted | StudentStatus::Late)
            }
            StatusFilter::Graded => status == StudentStatus::Graded,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StudentAssignmentRow {
    id: i64,
    title: String,
    description: String,
    subject: Subject,
    class_name: String,
    teacher: String,
    due_at: DateTime<Utc>,
    points: i64,
    status: AssignmentStatus,
    content: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    score: Option<f64>,
    feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: Subject,
    pub subject_name: &'static str,
    pub class_name: String,
    pub teacher: String,
    pub due_date: DateTime<Utc>,
    pub points: i64,
    pub status: StudentStatus,
    /// Whether the student can still hand this in.
    pub open: bool,
    pub content: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
}

impl StudentAssignment {
    pub fn due(&self) -> String {
        self.due_date.format("%b %-d, %Y").to_string()
    }

    /// `score/points`, when graded.
    pub fn grade_display(&self) -> String {
        self.grade
            .map(|g| format!("{}/{}", round1(g), self.points))
            .unwrap_or_default()
    }

    pub fn percent(&self) -> Option<f64> {
        self.grade.map(|g| round1(g * 100.0 / self.points as f64))
    }

    /// Published assignments in the student's classes, soonest due first.
    pub async fn for_student(
        pool: &SqlitePool,
        student_id: i64,
        subject: Option<Subject>,
        filter: StatusFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentAssignment>, AppError> {
        let rows = sqlx::query_as::<_, StudentAssignmentRow>(
            "SELECT a.id, a.title, a.description, c.subject, c.name AS class_name, \
             (t.first_name || ' ' || t.last_name) AS teacher, a.due_at, a.points, a.status, \
             s.content, s.submitted_at, s.score, s.feedback \
             FROM assignments a \
             JOIN classes c ON c.id = a.class_id \
             JOIN enrollments e ON e.class_id = c.id AND e.student_id = ?1 \
             JOIN users t ON t.id = c.teacher_id \
             LEFT JOIN submissions s ON s.assignment_id = a.id AND s.student_id = ?1 \
             WHERE a.status != 'pending' AND (?2 IS NULL OR c.subject = ?2) \
             ORDER BY a.due_at, a.id",
        )
        .bind(student_id)
        .bind(subject)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let status = StudentStatus::derive(row.due_at, row.submitted_at, row.score, now);
                StudentAssignment {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    subject: row.subject,
                    subject_name: row.subject.label(),
                    class_name: row.class_name,
                    teacher: row.teacher,
                    due_date: row.due_at,
                    points: row.points,
                    status,
                    open: row.status == AssignmentStatus::Active && row.score.is_none(),
                    content: row.content,
                    submitted_at: row.submitted_at,
                    grade: row.score,
                    feedback: row.feedback,
                }
            })
            .filter(|a| filter.matches(a.status))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn student_status_derivation() {
        let due = ts(10, 23);
        assert_eq!(StudentStatus::derive(due, None, None, ts(9, 12)), StudentStatus::Pending);
        assert_eq!(StudentStatus::derive(due, None, None, ts(11, 0)), StudentStatus::Overdue);
        assert_eq!(
            StudentStatus::derive(due, Some(ts(10, 8)), None, ts(11, 0)),
            StudentStatus::Submitted
        );
        assert_eq!(
            StudentStatus::derive(due, Some(ts(11, 8)), None, ts(12, 0)),
            StudentStatus::Late
        );
        assert_eq!(
            StudentStatus::derive(due, Some(ts(11, 8)), Some(7.0), ts(12, 0)),
            StudentStatus::Graded
        );
    }

    #[test]
    fn filters_group_statuses() {
        assert!(StatusFilter::Pending.matches(StudentStatus::Overdue));
        assert!(StatusFilter::Submitted.matches(StudentStatus::Late));
        assert!(!StatusFilter::Submitted.matches(StudentStatus::Graded));
        assert!(StatusFilter::All.matches(StudentStatus::Graded));
        assert!(!StatusFilter::Graded.matches(StudentStatus::Pending));
    }

    #[test]
    fn priority_thresholds() {
        assert_eq!(Priority::for_days_left(0), Priority::High);
        assert_eq!(Priority::for_days_left(2), Priority::High);
        assert_eq!(Priority::for_days_left(3), Priority::Medium);
        assert_eq!(Priority::for_days_left(7), Priority::Medium);
        assert_eq!(Priority::for_days_left(8), Priority::Low);
    }

    #[test]
    fn due_dates_accept_form_formats() {
        assert_eq!(parse_due("2026-03-10").unwrap(), Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 0).unwrap());
        assert_eq!(parse_due("2026-03-10T09:30").unwrap(), Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap());
        assert_eq!(parse_due("2026-03-10T09:30:00Z").unwrap(), Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap());
        assert!(parse_due("next tuesday").is_err());
    }

    #[test]
    fn days_until_counts_calendar_days() {
        assert_eq!(days_until(ts(12, 1), ts(10, 23)), 2);
        assert_eq!(days_until(ts(10, 23), ts(10, 1)), 0);
    }

    #[test]
    fn status_parses() {
        assert_eq!("Grading".parse::<AssignmentStatus>().unwrap(), AssignmentStatus::Grading);
        assert!("draft".parse::<AssignmentStatus>().is_err());
    }
}
