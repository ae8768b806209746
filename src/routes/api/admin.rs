use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::forms::{NewUserForm, non_empty};
use crate::models::activity::Activity;
use crate::models::announcement::{Announcement, CreateAnnouncement};
use crate::models::report::{AdminStats, DateRange, ExportFormat, Report, ReportType};
use crate::models::user::{Role, User, UserStatus, UserSummary};

pub const RECENT_ACTIVITY_LIMIT: i64 = 20;

pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    Ok(Json(AdminStats::load(&state.pool).await?))
}

pub async fn activities(State(state): State<AppState>) -> Result<Json<Vec<Activity>>, AppError> {
    Ok(Json(Activity::recent(&state.pool, RECENT_ACTIVITY_LIMIT).await?))
}

#[derive(Debug, Deserialize)]
pub struct UserSearch {
    pub q: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(search): Query<UserSearch>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = User::list(&state.pool, search.q.as_deref()).await?;
    Ok(Json(users.iter().map(User::summary).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(form): Json<NewUserForm>,
) -> Result<impl IntoResponse, AppError> {
    let input = form.validate().map_err(AppError::Validation)?;
    let (user, password) = User::provision(&state.pool, &admin, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user.summary(), "temporaryPassword": password })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub role: Option<String>,
    pub status: Option<String>,
}

impl UpdateUser {
    pub fn parse(&self) -> Result<(Option<Role>, Option<UserStatus>), AppError> {
        let role = non_empty(self.role.clone()).map(|r| r.parse()).transpose()?;
        let status = non_empty(self.status.clone()).map(|s| s.parse()).transpose()?;
        if role.is_none() && status.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        Ok((role, status))
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<UserSummary>, AppError> {
    let (role, status) = input.parse()?;
    let user = User::change_access(&state.pool, &admin, id, role, status).await?;
    Ok(Json(user.summary()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    User::remove(&state.pool, &admin, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type", default)]
    pub report_type: ReportType,
    #[serde(default)]
    pub range: DateRange,
    pub format: Option<String>,
}

pub async fn reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    let report = Report::generate(&state.pool, query.report_type, query.range, Utc::now()).await?;
    Ok(Json(report))
}

pub async fn export_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let format: ExportFormat = query.format.as_deref().unwrap_or("csv").parse()?;
    let report = Report::generate(&state.pool, query.report_type, query.range, Utc::now()).await?;
    let body = report.export(format)?;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name(format));
    tracing::info!(report = %report.report_type, range = %report.range, "report exported");
    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn list_announcements(State(state): State<AppState>) -> Result<Json<Vec<Announcement>>, AppError> {
    Ok(Json(Announcement::list(&state.pool).await?))
}

pub async fn create_announcement(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(input): Json<CreateAnnouncement>,
) -> Result<impl IntoResponse, AppError> {
    let announcement = Announcement::publish(&state.pool, &admin, input).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}
