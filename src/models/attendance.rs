use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::class::{SchoolClass, round1};
use crate::models::notification::Notification;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown attendance status: {s}")))
    }
}

/// Counts of attendance marks by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub present_days: i64,
    pub absent_days: i64,
    pub late_days: i64,
    pub excused_days: i64,
    pub attendance_rate: f64,
}

impl AttendanceTally {
    pub fn add(&mut self, status: AttendanceStatus, count: i64) {
        match status {
            AttendanceStatus::Present => self.present += count,
            AttendanceStatus::Absent => self.absent += count,
            AttendanceStatus::Late => self.late += count,
            AttendanceStatus::Excused => self.excused += count,
        }
    }

    pub fn merge(&mut self, other: AttendanceTally) {
        self.present += other.present;
        self.absent += other.absent;
        self.late += other.late;
        self.excused += other.excused;
    }

    pub fn total(&self) -> i64 {
        self.present + self.absent + self.late + self.excused
    }

    /// Percentage of countable days attended. Late counts as attended and
    /// excused days are left out entirely.
    pub fn rate(&self) -> f64 {
        let countable = self.total() - self.excused;
        if countable <= 0 {
            return 0.0;
        }
        round1((self.present + self.late) as f64 * 100.0 / countable as f64)
    }

    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary {
            present_days: self.present,
            absent_days: self.absent,
            late_days: self.late,
            excused_days: self.excused,
            attendance_rate: self.rate(),
        }
    }

    /// Tally marks, narrowed by student, class and the date range `[from, to)`.
    pub async fn load(
        pool: &SqlitePool,
        student_id: Option<i64>,
        class_id: Option<i64>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AttendanceTally, AppError> {
        let rows: Vec<(AttendanceStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM attendance \
             WHERE (?1 IS NULL OR student_id = ?1) AND (?2 IS NULL OR class_id = ?2) \
             AND (?3 IS NULL OR date >= ?3) AND (?4 IS NULL OR date < ?4) \
             GROUP BY status",
        )
        .bind(student_id)
        .bind(class_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        let mut tally = AttendanceTally::default();
        for (status, count) in rows {
            tally.add(status, count);
        }
        Ok(tally)
    }

    pub async fn load_for_students(
        pool: &SqlitePool,
        student_ids: &[i64],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AttendanceTally, AppError> {
        let mut tally = AttendanceTally::default();
        for &id in student_ids {
            tally.merge(Self::load(pool, Some(id), None, from, to).await?);
        }
        Ok(tally)
    }
}

/// First day of `month` and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid month {month}/{year}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub student_name: String,
    pub class_name: String,
    pub status: AttendanceStatus,
    pub notes: String,
}

impl AttendanceRecord {
    pub fn day(&self) -> String {
        self.date.format("%a, %b %-d").to_string()
    }

    /// Marks for the given students in `[from, to)`, newest first.
    pub async fn for_students(
        pool: &SqlitePool,
        student_ids: &[i64],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records = Vec::new();
        for &id in student_ids {
            let rows = sqlx::query_as::<_, AttendanceRecord>(
                "SELECT a.id, a.date, (u.first_name || ' ' || u.last_name) AS student_name, \
                 c.name AS class_name, a.status, a.notes \
                 FROM attendance a JOIN users u ON u.id = a.student_id JOIN classes c ON c.id = a.class_id \
                 WHERE a.student_id = ? AND a.date >= ? AND a.date < ?",
            )
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await?;
            records.extend(rows);
        }
        records.sort_by(|a, b| b.date.cmp(&a.date).then(a.student_name.cmp(&b.student_name)));
        Ok(records)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct TakeAttendance {
    pub date: NaiveDate,
    pub records: Vec<AttendanceEntry>,
}

/// Record (or correct) a day's attendance for one of the teacher's classes.
/// Parents of absent students are notified.
pub async fn record_many(
    pool: &SqlitePool,
    teacher: &User,
    class_id: i64,
    input: TakeAttendance,
) -> Result<usize, AppError> {
    let class = SchoolClass::get_owned(pool, class_id, teacher.id).await?;
    if input.records.is_empty() {
        return Err(AppError::BadRequest("No attendance records given".to_string()));
    }
    for entry in &input.records {
        if !SchoolClass::is_enrolled(pool, class.id, entry.student_id).await? {
            return Err(AppError::BadRequest(format!(
                "Student {} is not enrolled in {}",
                entry.student_id, class.name
            )));
        }
    }

    let mut tx = pool.begin().await?;
    for entry in &input.records {
        sqlx::query(
            "INSERT INTO attendance (student_id, class_id, date, status, notes) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (student_id, class_id, date) DO UPDATE SET status = excluded.status, notes = excluded.notes",
        )
        .bind(entry.student_id)
        .bind(class.id)
        .bind(input.date)
        .bind(entry.status)
        .bind(entry.notes.trim())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    for entry in input.records.iter().filter(|e| e.status == AttendanceStatus::Absent) {
        let student = User::get(pool, entry.student_id).await?;
        let parents: Vec<i64> = User::parents_of(pool, student.id)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        if parents.is_empty() {
            continue;
        }
        Notification::notify_all(
            pool,
            &parents,
            "Absence recorded",
            &format!(
                "{} was marked absent from {} on {}",
                student.full_name(),
                class.name,
                input.date.format("%b %-d, %Y")
            ),
        )
        .await?;
    }

    tracing::info!(
        class_id = class.id,
        date = %input.date,
        count = input.records.len(),
        "Attendance recorded"
    );
    Activity::record(
        pool,
        Some(teacher),
        ActivityKind::Attendance,
        format!("Took attendance for {} on {}", class.name, input.date),
    )
    .await;
    Ok(input.records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_counts_late_and_skips_excused() {
        let tally = AttendanceTally {
            present: 15,
            absent: 2,
            late: 3,
            excused: 4,
        };
        assert_eq!(tally.total(), 24);
        assert_eq!(tally.rate(), 90.0);
    }

    #[test]
    fn rate_is_zero_without_countable_days() {
        assert_eq!(AttendanceTally::default().rate(), 0.0);
        let only_excused = AttendanceTally {
            excused: 3,
            ..Default::default()
        };
        assert_eq!(only_excused.rate(), 0.0);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let tally = AttendanceTally {
            present: 2,
            absent: 1,
            ..Default::default()
        };
        assert_eq!(tally.rate(), 66.7);
    }

    #[test]
    fn month_bounds_roll_over_december() {
        let (start, end) = month_bounds(2026, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert!(month_bounds(2026, 13).is_err());
        assert!(month_bounds(2026, 0).is_err());
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "");
    }
}
