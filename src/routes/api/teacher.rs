use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::forms::parse_id_filter;
use crate::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignment, GradeSubmission, RecentSubmission, Submission,
    TeacherAssignment, UpcomingTask,
};
use crate::models::attendance::{self, TakeAttendance};
use crate::models::class::{ClassDetail, ClassOverview, CreateClass, SchoolClass};
use crate::models::user::User;

pub const RECENT_SUBMISSION_LIMIT: i64 = 10;

pub async fn classes(
    State(state): State<AppState>,
    teacher: CurrentUser,
) -> Result<Json<Vec<ClassOverview>>, AppError> {
    let mut overviews = Vec::new();
    for class in SchoolClass::for_teacher(&state.pool, teacher.id).await? {
        overviews.push(class.overview(&state.pool).await?);
    }
    Ok(Json(overviews))
}

pub async fn class_detail(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ClassDetail>, AppError> {
    let class = SchoolClass::get_owned(&state.pool, id, teacher.id).await?;
    Ok(Json(class.detail(&state.pool).await?))
}

pub async fn create_class(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Json(input): Json<CreateClass>,
) -> Result<impl IntoResponse, AppError> {
    let class = SchoolClass::create(&state.pool, &teacher, input).await?;
    Ok((StatusCode::CREATED, Json(class.overview(&state.pool).await?)))
}

#[derive(Debug, Deserialize)]
pub struct AddStudent {
    pub email: String,
}

/// Enroll the student with `email` in one of the teacher's classes.
pub async fn enroll_by_email(state: &AppState, teacher: &User, class_id: i64, email: &str) -> Result<User, AppError> {
    let class = SchoolClass::get_owned(&state.pool, class_id, teacher.id).await?;
    let student = User::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No account with email {}", email.trim())))?;
    SchoolClass::enroll(&state.pool, class.id, &student).await?;
    tracing::info!(class_id = class.id, student_id = student.id, "student enrolled");
    Ok(student)
}

pub async fn add_student(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<AddStudent>,
) -> Result<impl IntoResponse, AppError> {
    let student = enroll_by_email(&state, &teacher, id, &input.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "student": student.summary() })),
    ))
}

pub async fn take_attendance(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<TakeAttendance>,
) -> Result<Json<Value>, AppError> {
    let recorded = attendance::record_many(&state.pool, &teacher, id, input).await?;
    Ok(Json(json!({ "recorded": recorded })))
}

pub async fn upcoming_tasks(
    State(state): State<AppState>,
    teacher: CurrentUser,
) -> Result<Json<Vec<UpcomingTask>>, AppError> {
    Ok(Json(Assignment::upcoming(&state.pool, teacher.id, Utc::now()).await?))
}

pub async fn recent_submissions(
    State(state): State<AppState>,
    teacher: CurrentUser,
) -> Result<Json<Vec<RecentSubmission>>, AppError> {
    Ok(Json(
        Submission::recent_ungraded(&state.pool, teacher.id, RECENT_SUBMISSION_LIMIT).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub class: Option<String>,
}

pub async fn assignments(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<TeacherAssignment>>, AppError> {
    let class_id = parse_id_filter(query.class.as_deref())?;
    Ok(Json(Assignment::for_teacher(&state.pool, teacher.id, class_id).await?))
}

pub async fn create_assignment(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Json(input): Json<CreateAssignment>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = Assignment::create(&state.pool, &teacher, input).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssignment {
    pub status: AssignmentStatus,
}

pub async fn update_assignment(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateAssignment>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(
        Assignment::update_status(&state.pool, id, teacher.id, input.status).await?,
    ))
}

pub async fn grade_submission(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<GradeSubmission>,
) -> Result<Json<Submission>, AppError> {
    let submission = Submission::grade(&state.pool, &teacher, id, input).await?;
    Ok(Json(submission))
}
