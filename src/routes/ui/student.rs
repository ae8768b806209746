use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use chrono::{Local, Utc};
use serde::Deserialize;

use super::{Notice, finish};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::HtmlError;
use crate::models::assignment::{StatusFilter, StudentAssignment, Submission};
use crate::models::class::Subject;
use crate::models::performance::StudentProgress;
use crate::models::schedule::{self, Period, Weekday};
use crate::routes::api::student::{AssignmentQuery, ScheduleQuery, SubmitWork};
use crate::ui::components::{Badge, BadgeVariant, Select, attendance_color, grade_color, subject_color};
use crate::ui::{PageContext, Pill};

const DASHBOARD_ASSIGNMENTS: usize = 5;

/// An assignment with its status badge.
pub struct AssignmentItem {
    pub assignment: StudentAssignment,
    pub badge: Badge,
    pub grade_color: &'static str,
}

impl AssignmentItem {
    fn new(assignment: StudentAssignment) -> Self {
        AssignmentItem {
            badge: assignment.status.badge(),
            grade_color: grade_color(assignment.percent().unwrap_or(0.0)),
            assignment,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "student/dashboard.html")]
pub struct DashboardPage {
    pub page: PageContext,
    pub progress: StudentProgress,
    pub attendance_color: &'static str,
    pub average_color: &'static str,
    pub assignments: Vec<AssignmentItem>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    student: CurrentUser,
    Query(notice): Query<Notice>,
) -> Result<DashboardPage, HtmlError> {
    let now = Utc::now();
    let progress = StudentProgress::load(&state.pool, &student, now).await?;
    let assignments = StudentAssignment::for_student(&state.pool, student.id, None, StatusFilter::Pending, now)
        .await?
        .into_iter()
        .take(DASHBOARD_ASSIGNMENTS)
        .map(AssignmentItem::new)
        .collect();
    Ok(DashboardPage {
        page: PageContext::new(&student, "Student Dashboard", "/student").with_flash(notice.notice),
        attendance_color: attendance_color(progress.attendance),
        average_color: grade_color(progress.average),
        progress,
        assignments,
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "student/assignments.html")]
pub struct AssignmentsPage {
    pub page: PageContext,
    pub subject: Select,
    pub status: &'static str,
    pub pills: Vec<Pill>,
    pub assignments: Vec<AssignmentItem>,
}

/// Status filter links that keep the chosen subject.
fn status_pills(current: StatusFilter, subject: &str) -> Vec<Pill> {
    StatusFilter::ALL
        .into_iter()
        .map(|filter| Pill {
            href: format!(
                "/student/assignments?status={}&subject={subject}",
                filter.as_str()
            ),
            label: filter.label(),
            active: filter == current,
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentsParams {
    #[serde(flatten)]
    pub filter: AssignmentQuery,
    pub notice: Option<String>,
}

pub async fn assignments(
    State(state): State<AppState>,
    student: CurrentUser,
    Query(AssignmentsParams { filter, notice }): Query<AssignmentsParams>,
) -> Result<AssignmentsPage, HtmlError> {
    let subject = filter.subject()?;
    let subject_key = subject.map(Subject::key).unwrap_or("all");
    let assignments = StudentAssignment::for_student(&state.pool, student.id, subject, filter.status, Utc::now())
        .await?
        .into_iter()
        .map(AssignmentItem::new)
        .collect();
    let options = std::iter::once(("all", "All Subjects")).chain(Subject::ALL.map(|s| (s.key(), s.label())));
    Ok(AssignmentsPage {
        page: PageContext::new(&student, "My Assignments", "/student/assignments").with_flash(notice),
        subject: Select::new("Subject", "subject", options)
            .selected(subject_key)
            .auto_submit(),
        status: filter.status.as_str(),
        pills: status_pills(filter.status, subject_key),
        assignments,
    })
}

pub async fn submit(
    State(state): State<AppState>,
    student: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<SubmitWork>,
) -> Result<Redirect, HtmlError> {
    let result = Submission::submit(&state.pool, &student, id, &form.content).await;
    finish(
        "/student/assignments",
        result.map(|_| "Assignment submitted".to_string()),
    )
}

pub struct PeriodCard {
    pub period: Period,
    pub color: &'static str,
    pub badge: Option<Badge>,
}

#[derive(Template, WebTemplate)]
#[template(path = "student/schedule.html")]
pub struct SchedulePage {
    pub page: PageContext,
    pub day: &'static str,
    pub days: Vec<Pill>,
    pub periods: Vec<PeriodCard>,
}

pub async fn schedule(
    State(state): State<AppState>,
    student: CurrentUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<SchedulePage, HtmlError> {
    let day = query.day()?;
    let periods = schedule::for_student(&state.pool, student.id, day, Local::now())
        .await?
        .into_iter()
        .map(|period| PeriodCard {
            color: subject_color(&period.subject),
            badge: period
                .is_ongoing
                .then(|| Badge::new("Current Class", BadgeVariant::Success)),
            period,
        })
        .collect();
    Ok(SchedulePage {
        page: PageContext::new(&student, "Class Schedule", "/student/schedule"),
        day: day.label(),
        days: Weekday::ALL
            .into_iter()
            .map(|d| Pill {
                href: format!("/student/schedule?day={}", d.as_str()),
                label: d.label(),
                active: d == day,
            })
            .collect(),
        periods,
    })
}
