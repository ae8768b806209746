use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use serde::Deserialize;

use super::{Notice, finish, wants_modal, with_notice};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, HtmlError};
use crate::forms::{FieldErrors, NewUserForm, non_empty};
use crate::models::activity::Activity;
use crate::models::announcement::{Announcement, Audience, CreateAnnouncement};
use crate::models::report::{AdminStats, DateRange, ExportFormat, Report, ReportRow, ReportType};
use crate::models::user::{Role, User, UserStatus};
use crate::routes::api::admin::{RECENT_ACTIVITY_LIMIT, ReportQuery};
use crate::ui::PageContext;
use crate::ui::components::{Badge, Button, Input, Modal, Select, StatCard};

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardPage {
    pub page: PageContext,
    pub stats: Vec<StatCard>,
    pub activities: Vec<Activity>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(notice): Query<Notice>,
) -> Result<DashboardPage, HtmlError> {
    let stats = AdminStats::load(&state.pool).await?;
    Ok(DashboardPage {
        page: PageContext::new(&admin, "Admin Dashboard", "/admin").with_flash(notice.notice),
        stats: vec![
            StatCard::new("Total Users", stats.total_users, "text-blue-600"),
            StatCard::new("Active Users", stats.active_users, "text-green-600"),
            StatCard::new("Announcements", stats.total_announcements, "text-purple-600"),
            StatCard::new("Pending Requests", stats.pending_requests, "text-yellow-600"),
        ],
        activities: Activity::recent(&state.pool, RECENT_ACTIVITY_LIMIT).await?,
    })
}

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: &'static str,
    pub badge: Badge,
    pub role: Select,
    pub is_self: bool,
}

impl UserRow {
    fn new(user: User, admin_id: i64) -> Self {
        UserRow {
            id: user.id,
            name: user.full_name(),
            email: user.email,
            status: user.status.as_str(),
            badge: user.status.badge(),
            role: Select::new("", "role", Role::ALL.map(|r| (r.as_str(), r.label())))
                .selected(user.role.as_str())
                .auto_submit(),
            is_self: user.id == admin_id,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/add_user_form.html")]
pub struct AddUserForm {
    pub name: Input,
    pub email: Input,
    pub role: Select,
    pub status: Select,
    pub grade_level: Input,
    pub submit: Button,
}

impl AddUserForm {
    fn new(form: &NewUserForm, errors: &FieldErrors) -> Self {
        AddUserForm {
            name: Input::text("Full Name", "name")
                .value(form.name.clone())
                .placeholder("Jane Doe")
                .required()
                .error(errors.get("name")),
            email: Input::new("Email", "email", "email")
                .value(form.email.clone())
                .required()
                .error(errors.get("email")),
            role: Select::new("Role", "role", Role::ALL.map(|r| (r.as_str(), r.label())))
                .selected(form.role.clone())
                .required()
                .error(errors.get("role")),
            status: Select::new(
                "Status",
                "status",
                UserStatus::ALL.map(|s| (s.as_str(), s.label())),
            )
            .selected(form.status.clone().unwrap_or_else(|| "active".to_string()))
            .error(errors.get("status")),
            grade_level: Input::new("Grade Level (students)", "gradeLevel", "number")
                .value(form.grade_level.clone().unwrap_or_default())
                .error(errors.get("gradeLevel")),
            submit: Button::submit("Add User"),
        }
    }

    fn modal(self) -> Modal<AddUserForm> {
        Modal::new("Add New User", "/admin/users", self)
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersPage {
    pub page: PageContext,
    pub search: String,
    pub users: Vec<UserRow>,
    pub modal: Option<Modal<AddUserForm>>,
}

async fn users_page(
    state: &AppState,
    admin: &User,
    search: Option<String>,
    flash: Option<String>,
    modal: Option<Modal<AddUserForm>>,
) -> Result<UsersPage, AppError> {
    let search = non_empty(search).unwrap_or_default();
    let users = User::list(&state.pool, Some(search.as_str()).filter(|s| !s.is_empty())).await?;
    Ok(UsersPage {
        page: PageContext::new(admin, "User Management", "/admin/users").with_flash(flash),
        search,
        users: users.into_iter().map(|u| UserRow::new(u, admin.id)).collect(),
        modal,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub modal: Option<String>,
    pub notice: Option<String>,
}

pub async fn users(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(query): Query<UsersQuery>,
) -> Result<UsersPage, HtmlError> {
    let modal = wants_modal(query.modal.as_deref(), "add-user")
        .then(|| AddUserForm::new(&NewUserForm::default(), &FieldErrors::new()).modal());
    Ok(users_page(&state, &admin, query.q, query.notice, modal).await?)
}

pub async fn create_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Form(form): Form<NewUserForm>,
) -> Result<Response, HtmlError> {
    let reopen = |errors: FieldErrors| Some(AddUserForm::new(&form, &errors).modal());
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(users_page(&state, &admin, None, None, reopen(errors))
                .await?
                .into_response());
        }
    };
    match User::provision(&state.pool, &admin, input).await {
        Ok((user, password)) => {
            let message = format!(
                "Created {} ({}). Temporary password: {password}",
                user.full_name(),
                user.email
            );
            Ok(with_notice("/admin/users", &message).into_response())
        }
        Err(AppError::Conflict(message)) => {
            let mut errors = FieldErrors::new();
            errors.add("email", message);
            Ok(users_page(&state, &admin, None, None, reopen(errors))
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn set_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, HtmlError> {
    let result = async {
        let status: UserStatus = form.status.parse()?;
        let user = User::change_access(&state.pool, &admin, id, None, Some(status)).await?;
        Ok::<_, AppError>(format!("{} is now {}", user.full_name(), user.status))
    }
    .await;
    finish("/admin/users", result)
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

pub async fn set_role(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, HtmlError> {
    let result = async {
        let role: Role = form.role.parse()?;
        let user = User::change_access(&state.pool, &admin, id, Some(role), None).await?;
        Ok::<_, AppError>(format!("{} is now a {}", user.full_name(), user.role.label().to_lowercase()))
    }
    .await;
    finish("/admin/users", result)
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, HtmlError> {
    let result = User::remove(&state.pool, &admin, id)
        .await
        .map(|()| "User deleted".to_string());
    finish("/admin/users", result)
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/reports.html")]
pub struct ReportsPage {
    pub page: PageContext,
    pub report_type: Select,
    pub range: Select,
    pub heading: String,
    pub generated: String,
    pub rows: Vec<(ReportRow, Badge)>,
    pub bars: Vec<(String, i64, i64)>,
    pub export_csv: String,
    pub export_json: String,
}

pub async fn reports(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<ReportsPage, HtmlError> {
    let report = Report::generate(&state.pool, query.report_type, query.range, Utc::now()).await?;
    let export = |format: ExportFormat| {
        format!(
            "/api/admin/reports/export?type={}&range={}&format={}",
            report.report_type.as_str(),
            report.range.as_str(),
            format.extension()
        )
    };
    Ok(ReportsPage {
        page: PageContext::new(&admin, "Reports & Analytics", "/admin/reports"),
        report_type: Select::new(
            "Report Type",
            "type",
            ReportType::ALL.map(|t| (t.as_str(), t.label())),
        )
        .selected(report.report_type.as_str())
        .auto_submit(),
        range: Select::new(
            "Date Range",
            "range",
            DateRange::ALL.map(|r| (r.as_str(), r.label())),
        )
        .selected(report.range.as_str())
        .auto_submit(),
        heading: format!("{} · {}", report.report_type.label(), report.range.label()),
        generated: report.generated_at.format("%b %-d, %Y %H:%M UTC").to_string(),
        bars: report.chart_data.bars(),
        export_csv: export(ExportFormat::Csv),
        export_json: export(ExportFormat::Json),
        rows: report
            .reports
            .iter()
            .map(|row| (row.clone(), Badge::change(row.change, row.change_display())))
            .collect(),
    })
}

#[derive(Template)]
#[template(path = "admin/announcement_form.html")]
pub struct AnnouncementForm {
    pub title: Input,
    pub audience: Select,
    pub body: String,
    pub error: String,
    pub submit: Button,
}

impl AnnouncementForm {
    fn new(title: &str, body: &str, audience: Audience, error: String) -> Self {
        AnnouncementForm {
            title: Input::text("Title", "title").value(title).required(),
            audience: Select::new(
                "Audience",
                "audience",
                Audience::ALL.map(|a| (a.as_str(), a.label())),
            )
            .selected(audience.as_str()),
            body: body.to_string(),
            error,
            submit: Button::submit("Post Announcement"),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/announcements.html")]
pub struct AnnouncementsPage {
    pub page: PageContext,
    pub announcements: Vec<Announcement>,
    pub form: AnnouncementForm,
}

async fn announcements_page(
    state: &AppState,
    admin: &User,
    flash: Option<String>,
    form: AnnouncementForm,
) -> Result<AnnouncementsPage, AppError> {
    Ok(AnnouncementsPage {
        page: PageContext::new(admin, "Announcements", "/admin/announcements").with_flash(flash),
        announcements: Announcement::list(&state.pool).await?,
        form,
    })
}

pub async fn announcements(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(notice): Query<Notice>,
) -> Result<AnnouncementsPage, HtmlError> {
    let form = AnnouncementForm::new("", "", Audience::All, String::new());
    Ok(announcements_page(&state, &admin, notice.notice, form).await?)
}

pub async fn post_announcement(
    State(state): State<AppState>,
    admin: CurrentUser,
    Form(input): Form<CreateAnnouncement>,
) -> Result<Response, HtmlError> {
    let (title, body, audience) = (input.title.clone(), input.body.clone(), input.audience);
    match Announcement::publish(&state.pool, &admin, input).await {
        Ok(_) => Ok(with_notice("/admin/announcements", "Announcement posted").into_response()),
        Err(AppError::BadRequest(message)) => {
            let form = AnnouncementForm::new(&title, &body, audience, message);
            Ok(announcements_page(&state, &admin, None, form)
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
