//! Academic performance: subject grades, letter grades, term boundaries
//! and class rank.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::assignment::{StatusFilter, StudentAssignment};
use crate::models::attendance::AttendanceTally;
use crate::models::class::round1;
use crate::models::user::{Role, User};

pub const PASS_MARK: f64 = 60.0;

pub fn letter_grade(percent: f64) -> &'static str {
    match percent {
        p if p >= 90.0 => "A",
        p if p >= 80.0 => "B",
        p if p >= 70.0 => "C",
        p if p >= 60.0 => "D",
        _ => "F",
    }
}

/// The reporting window a parent picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Current,
    Last,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Current, Period::Last, Period::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Current => "current",
            Period::Last => "last",
            Period::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Current => "Current Term",
            Period::Last => "Last Term",
            Period::Year => "School Year",
        }
    }

    /// `[start, end)` of this period as seen on `today`.
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Current => term_containing(today),
            Period::Last => term_before(term_containing(today).0),
            Period::Year => school_year_containing(today),
        }
    }

    /// The window of the same kind immediately before this one.
    pub fn previous_bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let (start, _) = self.bounds(today);
        match self {
            Period::Current | Period::Last => term_before(start),
            Period::Year => school_year_containing(start.pred_opt().unwrap_or(start)),
        }
    }
}

fn ymd(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Term 1 runs September through January, term 2 February through August.
pub fn term_containing(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    match day.month() {
        9..=12 => (ymd(day.year(), 9), ymd(day.year() + 1, 2)),
        1 => (ymd(day.year() - 1, 9), ymd(day.year(), 2)),
        _ => (ymd(day.year(), 2), ymd(day.year(), 9)),
    }
}

fn term_before(term_start: NaiveDate) -> (NaiveDate, NaiveDate) {
    term_containing(term_start.pred_opt().unwrap_or(term_start))
}

pub fn school_year_containing(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start_year = if day.month() >= 9 { day.year() } else { day.year() - 1 };
    (ymd(start_year, 9), ymd(start_year + 1, 9))
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// A student's standing in one class.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrade {
    pub id: i64,
    pub name: String,
    pub student: String,
    pub grade: f64,
    pub teacher: String,
    pub comments: Option<String>,
}

impl SubjectGrade {
    pub fn letter(&self) -> &'static str {
        letter_grade(self.grade)
    }

    pub fn passed(&self) -> bool {
        self.grade >= PASS_MARK
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub overall_grade: f64,
    pub letter: &'static str,
    pub rank: String,
    pub subjects_passed: usize,
    pub total_subjects: usize,
    pub improvement: f64,
}

impl PerformanceSummary {
    pub fn build(subjects: &[SubjectGrade], previous_overall: Option<f64>, rank: String) -> Self {
        let overall = overall(subjects);
        let improvement = match (overall, previous_overall) {
            (Some(now), Some(before)) => round1(now - before),
            _ => 0.0,
        };
        let overall_grade = overall.unwrap_or(0.0);
        PerformanceSummary {
            overall_grade,
            letter: if overall.is_some() { letter_grade(overall_grade) } else { "N/A" },
            rank,
            subjects_passed: subjects.iter().filter(|s| s.passed()).count(),
            total_subjects: subjects.len(),
            improvement,
        }
    }

    pub fn improvement_display(&self) -> String {
        if self.improvement > 0.0 {
            format!("+{}", self.improvement)
        } else {
            self.improvement.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub subjects: Vec<SubjectGrade>,
}

/// Mean of subject grades, `None` when nothing has been graded.
pub fn overall(subjects: &[SubjectGrade]) -> Option<f64> {
    if subjects.is_empty() {
        return None;
    }
    let sum: f64 = subjects.iter().map(|s| s.grade).sum();
    Some(round1(sum / subjects.len() as f64))
}

/// 1-based rank of `score` among `scores` (ties share the better place).
pub fn rank_of(score: f64, scores: &[f64]) -> String {
    let position = 1 + scores.iter().filter(|&&s| s > score).count();
    format!("{position}/{}", scores.len())
}

/// Per-class grades for a student from work due in `[from, to)`.
pub async fn subject_grades(
    pool: &SqlitePool,
    student_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SubjectGrade>, AppError> {
    let mut grades = sqlx::query_as::<_, SubjectGrade>(
        "SELECT c.id, c.name, (u.first_name || ' ' || u.last_name) AS student, \
         AVG(s.score * 100.0 / a.points) AS grade, \
         (t.first_name || ' ' || t.last_name) AS teacher, \
         (SELECT s2.feedback FROM submissions s2 JOIN assignments a2 ON a2.id = s2.assignment_id \
          WHERE a2.class_id = c.id AND s2.student_id = ?1 AND s2.feedback IS NOT NULL \
          AND a2.due_at >= ?2 AND a2.due_at < ?3 \
          ORDER BY s2.graded_at DESC LIMIT 1) AS comments \
         FROM submissions s \
         JOIN assignments a ON a.id = s.assignment_id \
         JOIN classes c ON c.id = a.class_id \
         JOIN users t ON t.id = c.teacher_id \
         JOIN users u ON u.id = s.student_id \
         WHERE s.student_id = ?1 AND s.score IS NOT NULL AND a.due_at >= ?2 AND a.due_at < ?3 \
         GROUP BY c.id \
         ORDER BY c.name",
    )
    .bind(student_id)
    .bind(start_of(from))
    .bind(start_of(to))
    .fetch_all(pool)
    .await?;
    for grade in &mut grades {
        grade.grade = round1(grade.grade);
    }
    Ok(grades)
}

/// Rank of a student against classmates in the same grade level.
pub async fn rank(pool: &SqlitePool, student: &User, from: NaiveDate, to: NaiveDate) -> Result<String, AppError> {
    let Some(own) = overall(&subject_grades(pool, student.id, from, to).await?) else {
        return Ok("N/A".to_string());
    };
    let peers: Vec<User> = User::list_by_role(pool, Role::Student)
        .await?
        .into_iter()
        .filter(|u| u.grade_level == student.grade_level)
        .collect();
    let mut scores = Vec::with_capacity(peers.len());
    for peer in &peers {
        if let Some(score) = overall(&subject_grades(pool, peer.id, from, to).await?) {
            scores.push(score);
        }
    }
    Ok(rank_of(own, &scores))
}

/// Performance for one or more students over `period`. Rank is only given
/// for a single student.
pub async fn report(
    pool: &SqlitePool,
    students: &[User],
    period: Period,
    today: NaiveDate,
) -> Result<PerformanceReport, AppError> {
    let (from, to) = period.bounds(today);
    let (prev_from, prev_to) = period.previous_bounds(today);

    let mut subjects = Vec::new();
    let mut previous = Vec::new();
    for student in students {
        subjects.extend(subject_grades(pool, student.id, from, to).await?);
        previous.extend(subject_grades(pool, student.id, prev_from, prev_to).await?);
    }
    let rank = match students {
        [only] => rank(pool, only, from, to).await?,
        _ => "N/A".to_string(),
    };
    Ok(PerformanceReport {
        summary: PerformanceSummary::build(&subjects, overall(&previous), rank),
        subjects,
    })
}

/// One child's card on the parent dashboard, for the current term.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildOverview {
    pub id: i64,
    pub name: String,
    pub grade: Option<i64>,
    pub attendance: f64,
    pub current_grade: &'static str,
    pub average: f64,
}

impl ChildOverview {
    pub async fn load(pool: &SqlitePool, child: &User, today: NaiveDate) -> Result<ChildOverview, AppError> {
        let (from, to) = Period::Current.bounds(today);
        let subjects = subject_grades(pool, child.id, from, to).await?;
        let attendance = AttendanceTally::load(pool, Some(child.id), None, Some(from), Some(to))
            .await?
            .rate();
        let average = overall(&subjects);
        Ok(ChildOverview {
            id: child.id,
            name: child.full_name(),
            grade: child.grade_level,
            attendance,
            current_grade: average.map(letter_grade).unwrap_or("N/A"),
            average: average.unwrap_or(0.0),
        })
    }
}

/// A student's profile with school-year progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub grade: Option<i64>,
    pub attendance: f64,
    pub average: f64,
    pub completed_assignments: usize,
    pub total_assignments: usize,
}

impl StudentProgress {
    pub fn completion_percent(&self) -> usize {
        if self.total_assignments == 0 {
            0
        } else {
            self.completed_assignments * 100 / self.total_assignments
        }
    }

    pub async fn load(pool: &SqlitePool, student: &User, now: DateTime<Utc>) -> Result<StudentProgress, AppError> {
        let (from, to) = Period::Year.bounds(now.date_naive());
        let subjects = subject_grades(pool, student.id, from, to).await?;
        let attendance = AttendanceTally::load(pool, Some(student.id), None, Some(from), Some(to))
            .await?
            .rate();
        let assignments = StudentAssignment::for_student(pool, student.id, None, StatusFilter::All, now).await?;
        Ok(StudentProgress {
            id: student.id,
            name: student.full_name(),
            email: student.email.clone(),
            grade: student.grade_level,
            attendance,
            average: overall(&subjects).unwrap_or(0.0),
            completed_assignments: assignments.iter().filter(|a| a.status.is_handed_in()).count(),
            total_assignments: assignments.len(),
        })
    }
}
