use axum::Json;
use axum::extract::{Query, State};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::forms::parse_id_filter;
use crate::models::attendance::{AttendanceRecord, AttendanceSummary, AttendanceTally, month_bounds};
use crate::models::notification::{Notification, NotificationView};
use crate::models::performance::{self, ChildOverview, Period, PerformanceReport};
use crate::models::user::User;

const NOTIFICATION_LIMIT: i64 = 20;

pub async fn children(
    State(state): State<AppState>,
    parent: CurrentUser,
) -> Result<Json<Vec<ChildOverview>>, AppError> {
    let today = Utc::now().date_naive();
    let mut overviews = Vec::new();
    for child in User::children_of(&state.pool, parent.id).await? {
        overviews.push(ChildOverview::load(&state.pool, &child, today).await?);
    }
    Ok(Json(overviews))
}

pub async fn notifications(
    State(state): State<AppState>,
    parent: CurrentUser,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    let notifications = Notification::for_user(&state.pool, parent.id, NOTIFICATION_LIMIT).await?;
    Ok(Json(notifications.into_iter().map(Notification::view).collect()))
}

pub async fn mark_notifications_read(
    State(state): State<AppState>,
    parent: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let updated = Notification::mark_all_read(&state.pool, parent.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub child_id: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
}

/// Attendance for the selected children in one calendar month.
pub async fn load_attendance(
    state: &AppState,
    parent: &User,
    query: &AttendanceQuery,
) -> Result<AttendanceResponse, AppError> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or(today.month());
    let year = query.year.unwrap_or(today.year());
    let (from, to) = month_bounds(year, month)?;

    let child_id = parse_id_filter(query.child_id.as_deref())?;
    let children = User::select_children(&state.pool, parent.id, child_id).await?;
    let ids: Vec<i64> = children.iter().map(|c| c.id).collect();

    let tally = AttendanceTally::load_for_students(&state.pool, &ids, Some(from), Some(to)).await?;
    let records = AttendanceRecord::for_students(&state.pool, &ids, from, to).await?;
    Ok(AttendanceResponse {
        summary: tally.summary(),
        records,
    })
}

pub async fn attendance(
    State(state): State<AppState>,
    parent: CurrentUser,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<AttendanceResponse>, AppError> {
    Ok(Json(load_attendance(&state, &parent, &query).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceQuery {
    pub child_id: Option<String>,
    #[serde(default)]
    pub period: Period,
}

pub async fn load_performance(
    state: &AppState,
    parent: &User,
    query: &PerformanceQuery,
) -> Result<PerformanceReport, AppError> {
    let child_id = parse_id_filter(query.child_id.as_deref())?;
    let children = User::select_children(&state.pool, parent.id, child_id).await?;
    performance::report(&state.pool, &children, query.period, Utc::now().date_naive()).await
}

pub async fn performance(
    State(state): State<AppState>,
    parent: CurrentUser,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<PerformanceReport>, AppError> {
    Ok(Json(load_performance(&state, &parent, &query).await?))
}
