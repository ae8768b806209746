//! Admin reports: headline metrics for a date window compared with the
//! window before it, plus an activity chart and CSV/JSON export.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityKind};
use crate::models::announcement::Announcement;
use crate::models::attendance::AttendanceTally;
use crate::models::class::round1;
use crate::models::user::{User, UserStatus};

/// Headline numbers on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_announcements: i64,
    pub pending_requests: i64,
}

impl AdminStats {
    pub async fn load(pool: &SqlitePool) -> Result<AdminStats, AppError> {
        Ok(AdminStats {
            total_users: User::count(pool).await?,
            active_users: User::count_with_status(pool, UserStatus::Active).await?,
            total_announcements: Announcement::count(pool).await?,
            pending_requests: User::count_with_status(pool, UserStatus::Pending).await?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Users,
    Engagement,
    Performance,
    Analytics,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Users,
        ReportType::Engagement,
        ReportType::Performance,
        ReportType::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Users => "users",
            ReportType::Engagement => "engagement",
            ReportType::Performance => "performance",
            ReportType::Analytics => "analytics",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportType::Users => "User Activity",
            ReportType::Engagement => "Engagement",
            ReportType::Performance => "Academic Performance",
            ReportType::Analytics => "System Analytics",
        }
    }

    /// Activity kinds plotted on this report's chart; empty means all.
    fn chart_kinds(self) -> &'static [ActivityKind] {
        match self {
            ReportType::Users => &[ActivityKind::Register, ActivityKind::UserCreated],
            ReportType::Engagement => &[ActivityKind::Login, ActivityKind::Submission],
            ReportType::Performance => &[ActivityKind::Grade, ActivityKind::Attendance],
            ReportType::Analytics => &[],
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl DateRange {
    pub const ALL: [DateRange; 4] = [
        DateRange::Week,
        DateRange::Month,
        DateRange::Quarter,
        DateRange::Year,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::Quarter => "quarter",
            DateRange::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateRange::Week => "Last 7 days",
            DateRange::Month => "Last 30 days",
            DateRange::Quarter => "Last 90 days",
            DateRange::Year => "Last 12 months",
        }
    }

    pub fn days(self) -> i64 {
        match self {
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::Quarter => 90,
            DateRange::Year => 365,
        }
    }

    fn buckets(self) -> usize {
        match self {
            DateRange::Week => 7,
            DateRange::Month => 6,
            DateRange::Quarter => 13,
            DateRange::Year => 12,
        }
    }

    fn label_format(self) -> &'static str {
        match self {
            DateRange::Week => "%a",
            DateRange::Month | DateRange::Quarter => "%b %-d",
            DateRange::Year => "%b %Y",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AppError::BadRequest(format!(
                "Unsupported export format: {other}"
            ))),
        }
    }
}

/// A `[from, to)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Window {
    pub fn ending(to: DateTime<Utc>, range: DateRange) -> Self {
        Window {
            from: to - Duration::days(range.days()),
            to,
        }
    }

    pub fn previous(self) -> Self {
        Window {
            from: self.from - (self.to - self.from),
            to: self.from,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: usize,
    pub metric: String,
    pub value: String,
    pub change: f64,
}

impl ReportRow {
    pub fn change_display(&self) -> String {
        if self.change > 0.0 {
            format!("+{}%", self.change)
        } else {
            format!("{}%", self.change)
        }
    }

    pub fn is_positive(&self) -> bool {
        self.change > 0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

impl ChartData {
    pub fn max(&self) -> i64 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Label, value and bar width (percent of the largest value) per bucket.
    pub fn bars(&self) -> Vec<(String, i64, i64)> {
        let max = self.max().max(1);
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, &value)| (label.clone(), value, value * 100 / max))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<ReportRow>,
    pub chart_data: ChartData,
}

/// Percent change from `previous` to `current`, one decimal. Growth from
/// zero counts as +100%.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 { 0.0 } else { 100.0 }
    } else {
        round1((current - previous) * 100.0 / previous)
    }
}

/// Count timestamps into `buckets` equal slices of `window`.
pub fn bucketize(timestamps: &[DateTime<Utc>], window: Window, buckets: usize) -> Vec<i64> {
    let mut counts = vec![0; buckets];
    let span = (window.to - window.from).num_seconds();
    if buckets == 0 || span <= 0 {
        return counts;
    }
    for at in timestamps {
        let offset = (*at - window.from).num_seconds();
        if offset < 0 || offset >= span {
            continue;
        }
        let index = (offset as i128 * buckets as i128 / span as i128) as usize;
        counts[index.min(buckets - 1)] += 1;
    }
    counts
}

fn bucket_labels(window: Window, range: DateRange) -> Vec<String> {
    let buckets = range.buckets() as i32;
    let step = (window.to - window.from) / buckets;
    (0..buckets)
        .map(|i| (window.from + step * i).format(range.label_format()).to_string())
        .collect()
}

async fn count_in(pool: &SqlitePool, sql: &str, window: Window) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(sql)
        .bind(window.from)
        .bind(window.to)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn users_as_of(pool: &SqlitePool, at: DateTime<Utc>) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE created_at < ?")
        .bind(at)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn average_score_in(pool: &SqlitePool, window: Window) -> Result<f64, AppError> {
    let row: (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(s.score * 100.0 / a.points) FROM submissions s JOIN assignments a ON a.id = s.assignment_id \
         WHERE s.score IS NOT NULL AND s.graded_at >= ? AND s.graded_at < ?",
    )
    .bind(window.from)
    .bind(window.to)
    .fetch_one(pool)
    .await?;
    Ok(round1(row.0.unwrap_or(0.0)))
}

async fn attendance_rate_in(pool: &SqlitePool, window: Window) -> Result<f64, AppError> {
    let tally = AttendanceTally::load(
        pool,
        None,
        None,
        Some(window.from.date_naive()),
        Some(window.to.date_naive()),
    )
    .await?;
    Ok(tally.rate())
}

const NEW_USERS: &str = "SELECT COUNT(*) FROM users WHERE created_at >= ? AND created_at < ?";
const SUBMISSIONS: &str = "SELECT COUNT(*) FROM submissions WHERE submitted_at >= ? AND submitted_at < ?";
const GRADED: &str = "SELECT COUNT(*) FROM submissions WHERE graded_at >= ? AND graded_at < ?";
const ANNOUNCEMENTS: &str = "SELECT COUNT(*) FROM announcements WHERE created_at >= ? AND created_at < ?";
const NOTIFICATIONS: &str = "SELECT COUNT(*) FROM notifications WHERE created_at >= ? AND created_at < ?";
const ASSIGNMENTS: &str = "SELECT COUNT(*) FROM assignments WHERE created_at >= ? AND created_at < ?";
const CLASSES: &str = "SELECT COUNT(*) FROM classes WHERE created_at >= ? AND created_at < ?";
const ACTIVITIES: &str = "SELECT COUNT(*) FROM activities WHERE occurred_at >= ? AND occurred_at < ?";

/// A metric's value in the window and the window before.
enum Measure {
    Count(i64, i64),
    Percent(f64, f64),
}

impl Measure {
    fn row(self, id: usize, metric: &str) -> ReportRow {
        let (value, change) = match self {
            Measure::Count(now, before) => (now.to_string(), percent_change(now as f64, before as f64)),
            Measure::Percent(now, before) => (format!("{now}%"), percent_change(now, before)),
        };
        ReportRow {
            id,
            metric: metric.to_string(),
            value,
            change,
        }
    }
}

async fn counted(pool: &SqlitePool, sql: &str, window: Window) -> Result<Measure, AppError> {
    Ok(Measure::Count(
        count_in(pool, sql, window).await?,
        count_in(pool, sql, window.previous()).await?,
    ))
}

async fn metrics(pool: &SqlitePool, report_type: ReportType, window: Window) -> Result<Vec<(&'static str, Measure)>, AppError> {
    let prev = window.previous();
    let logins = Measure::Count(
        Activity::count_between(pool, ActivityKind::Login, window.from, window.to).await?,
        Activity::count_between(pool, ActivityKind::Login, prev.from, prev.to).await?,
    );
    let active_users = Measure::Count(
        Activity::distinct_users_between(pool, ActivityKind::Login, window.from, window.to).await?,
        Activity::distinct_users_between(pool, ActivityKind::Login, prev.from, prev.to).await?,
    );

    Ok(match report_type {
        ReportType::Users => {
            // Totals as of the end of each window.
            let total = Measure::Count(
                users_as_of(pool, window.to).await?,
                users_as_of(pool, prev.to).await?,
            );
            vec![
                ("Total users", total),
                ("New users", counted(pool, NEW_USERS, window).await?),
                ("Active users", active_users),
                ("Logins", logins),
            ]
        }
        ReportType::Engagement => vec![
            ("Logins", logins),
            ("Assignment submissions", counted(pool, SUBMISSIONS, window).await?),
            ("Announcements posted", counted(pool, ANNOUNCEMENTS, window).await?),
            ("Notifications sent", counted(pool, NOTIFICATIONS, window).await?),
        ],
        ReportType::Performance => vec![
            (
                "Average score",
                Measure::Percent(average_score_in(pool, window).await?, average_score_in(pool, prev).await?),
            ),
            (
                "Attendance rate",
                Measure::Percent(attendance_rate_in(pool, window).await?, attendance_rate_in(pool, prev).await?),
            ),
            ("Assignments created", counted(pool, ASSIGNMENTS, window).await?),
            ("Submissions graded", counted(pool, GRADED, window).await?),
        ],
        ReportType::Analytics => vec![
            ("Recorded activities", counted(pool, ACTIVITIES, window).await?),
            ("Active users", active_users),
            ("Classes created", counted(pool, CLASSES, window).await?),
            ("Assignments created", counted(pool, ASSIGNMENTS, window).await?),
        ],
    })
}

impl Report {
    pub async fn generate(
        pool: &SqlitePool,
        report_type: ReportType,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<Report, AppError> {
        let window = Window::ending(now, range);
        let reports = metrics(pool, report_type, window)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, (metric, measure))| measure.row(i + 1, metric))
            .collect();

        let timestamps = Activity::timestamps_between(pool, report_type.chart_kinds(), window.from, window.to).await?;
        let chart_data = ChartData {
            labels: bucket_labels(window, range),
            values: bucketize(&timestamps, window, range.buckets()),
        };

        Ok(Report {
            report_type,
            range,
            generated_at: now,
            reports,
            chart_data,
        })
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("report-{}-{}.{}", self.report_type, self.range, format.extension())
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("metric,value,change\n");
        for row in &self.reports {
            out.push_str(&format!(
                "{},{},{}\n",
                csv_quote(&row.metric),
                csv_quote(&row.value),
                row.change
            ));
        }
        out
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, AppError> {
        match format {
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| AppError::Internal(format!("report serialization failed: {e}"))),
        }
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
