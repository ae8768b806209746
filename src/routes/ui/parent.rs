use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::Redirect;
use chrono::{Datelike, Utc};

use super::{Notice, with_notice};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::HtmlError;
use crate::models::attendance::{AttendanceRecord, month_name};
use crate::models::notification::{Notification, NotificationView};
use crate::models::performance::{ChildOverview, Period, SubjectGrade};
use crate::models::user::User;
use crate::routes::api::parent::{AttendanceQuery, PerformanceQuery, load_attendance, load_performance};
use crate::ui::PageContext;
use crate::ui::components::{Badge, BadgeVariant, Select, StatCard, attendance_color, grade_color};

const NOTIFICATION_LIMIT: i64 = 10;

pub struct ChildCard {
    pub child: ChildOverview,
    pub grade_color: &'static str,
    pub attendance_color: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "parent/dashboard.html")]
pub struct DashboardPage {
    pub page: PageContext,
    pub children: Vec<ChildCard>,
    pub notifications: Vec<NotificationView>,
    pub unread: usize,
}

pub async fn dashboard(
    State(state): State<AppState>,
    parent: CurrentUser,
    Query(notice): Query<Notice>,
) -> Result<DashboardPage, HtmlError> {
    let today = Utc::now().date_naive();
    let mut children = Vec::new();
    for child in User::children_of(&state.pool, parent.id).await? {
        let child = ChildOverview::load(&state.pool, &child, today).await?;
        children.push(ChildCard {
            grade_color: grade_color(child.average),
            attendance_color: attendance_color(child.attendance),
            child,
        });
    }
    let notifications: Vec<NotificationView> = Notification::for_user(&state.pool, parent.id, NOTIFICATION_LIMIT)
        .await?
        .into_iter()
        .map(Notification::view)
        .collect();
    Ok(DashboardPage {
        page: PageContext::new(&parent, "Parent Dashboard", "/parent").with_flash(notice.notice),
        unread: notifications.iter().filter(|n| !n.read).count(),
        children,
        notifications,
    })
}

pub async fn mark_read(State(state): State<AppState>, parent: CurrentUser) -> Result<Redirect, HtmlError> {
    let updated = Notification::mark_all_read(&state.pool, parent.id).await?;
    tracing::debug!(parent_id = parent.id, updated, "notifications marked read");
    Ok(with_notice("/parent", "All notifications marked as read"))
}

/// The "all children" choice followed by one option per child.
async fn child_select(state: &AppState, parent: &User, selected: Option<&str>) -> Result<Select, HtmlError> {
    let children = User::children_of(&state.pool, parent.id).await?;
    let options = std::iter::once(("all".to_string(), "All Children".to_string()))
        .chain(children.iter().map(|c| (c.id.to_string(), c.full_name())));
    Ok(Select::new("Child", "childId", options)
        .selected(selected.unwrap_or("all"))
        .auto_submit())
}

#[derive(Template, WebTemplate)]
#[template(path = "parent/attendance.html")]
pub struct AttendancePage {
    pub page: PageContext,
    pub child: Select,
    pub month: Select,
    pub year: Select,
    pub period_label: String,
    pub stats: Vec<StatCard>,
    pub records: Vec<(AttendanceRecord, Badge)>,
}

pub async fn attendance(
    State(state): State<AppState>,
    parent: CurrentUser,
    Query(query): Query<AttendanceQuery>,
) -> Result<AttendancePage, HtmlError> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or(today.month());
    let year = query.year.unwrap_or(today.year());
    let response = load_attendance(&state, &parent, &query).await?;
    let summary = response.summary;

    Ok(AttendancePage {
        page: PageContext::new(&parent, "Attendance", "/parent/attendance"),
        child: child_select(&state, &parent, query.child_id.as_deref()).await?,
        month: Select::new(
            "Month",
            "month",
            (1..=12).map(|m: u32| (m.to_string(), month_name(m))),
        )
        .selected(month.to_string())
        .auto_submit(),
        year: Select::new(
            "Year",
            "year",
            (today.year() - 2..=today.year()).rev().map(|y| (y.to_string(), y.to_string())),
        )
        .selected(year.to_string())
        .auto_submit(),
        period_label: format!("{} {year}", month_name(month)),
        stats: vec![
            StatCard::new("Present Days", summary.present_days, "text-green-600"),
            StatCard::new("Absent Days", summary.absent_days, "text-red-600"),
            StatCard::new("Late Days", summary.late_days, "text-yellow-600"),
            StatCard::new(
                "Attendance Rate",
                format!("{}%", summary.attendance_rate),
                attendance_color(summary.attendance_rate),
            ),
        ],
        records: response
            .records
            .into_iter()
            .map(|record| {
                let badge = record.status.badge();
                (record, badge)
            })
            .collect(),
    })
}

pub struct SubjectRow {
    pub subject: SubjectGrade,
    pub color: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "parent/performance.html")]
pub struct PerformancePage {
    pub page: PageContext,
    pub child: Select,
    pub period: Select,
    pub stats: Vec<StatCard>,
    pub improvement: Badge,
    pub subjects: Vec<SubjectRow>,
}

pub async fn performance(
    State(state): State<AppState>,
    parent: CurrentUser,
    Query(query): Query<PerformanceQuery>,
) -> Result<PerformancePage, HtmlError> {
    let report = load_performance(&state, &parent, &query).await?;
    let summary = &report.summary;
    let improvement = if summary.improvement == 0.0 {
        Badge::new(summary.improvement_display(), BadgeVariant::Default)
    } else {
        Badge::change(summary.improvement, summary.improvement_display())
    };

    Ok(PerformancePage {
        page: PageContext::new(&parent, "Academic Performance", "/parent/performance"),
        child: child_select(&state, &parent, query.child_id.as_deref()).await?,
        period: Select::new(
            "Period",
            "period",
            Period::ALL.map(|p| (p.as_str(), p.label())),
        )
        .selected(query.period.as_str())
        .auto_submit(),
        stats: vec![
            StatCard::new(
                "Overall Grade",
                format!("{}% ({})", summary.overall_grade, summary.letter),
                grade_color(summary.overall_grade),
            ),
            StatCard::new("Class Rank", &summary.rank, "text-blue-600"),
            StatCard::new(
                "Subjects Passed",
                format!("{}/{}", summary.subjects_passed, summary.total_subjects),
                "text-green-600",
            ),
        ],
        improvement,
        subjects: report
            .subjects
            .into_iter()
            .map(|subject| SubjectRow {
                color: grade_color(subject.grade),
                subject,
            })
            .collect(),
    })
}
