use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{Local, Utc};
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::forms::non_empty;
use crate::models::assignment::{StatusFilter, StudentAssignment, Submission};
use crate::models::class::Subject;
use crate::models::performance::StudentProgress;
use crate::models::schedule::{self, Period, Weekday};

pub async fn info(
    State(state): State<AppState>,
    student: CurrentUser,
) -> Result<Json<StudentProgress>, AppError> {
    Ok(Json(StudentProgress::load(&state.pool, &student, Utc::now()).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    #[serde(default)]
    pub status: StatusFilter,
    pub subject: Option<String>,
}

impl AssignmentQuery {
    /// The subject filter; `all` or blank means every subject.
    pub fn subject(&self) -> Result<Option<Subject>, AppError> {
        match non_empty(self.subject.clone()) {
            Some(s) if s != "all" => s.parse().map(Some),
            _ => Ok(None),
        }
    }
}

pub async fn assignments(
    State(state): State<AppState>,
    student: CurrentUser,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<StudentAssignment>>, AppError> {
    let assignments =
        StudentAssignment::for_student(&state.pool, student.id, query.subject()?, query.status, Utc::now()).await?;
    Ok(Json(assignments))
}

#[derive(Debug, Deserialize)]
pub struct SubmitWork {
    #[serde(default)]
    pub content: String,
}

pub async fn submit(
    State(state): State<AppState>,
    student: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<SubmitWork>,
) -> Result<Json<Submission>, AppError> {
    let submission = Submission::submit(&state.pool, &student, id, &input.content).await?;
    Ok(Json(submission))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub day: Option<String>,
}

impl ScheduleQuery {
    pub fn day(&self) -> Result<Weekday, AppError> {
        match non_empty(self.day.clone()) {
            Some(day) => day.parse(),
            None => Ok(Weekday::today()),
        }
    }
}

pub async fn schedule(
    State(state): State<AppState>,
    student: CurrentUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<Period>>, AppError> {
    let periods = schedule::for_student(&state.pool, student.id, query.day()?, Local::now()).await?;
    Ok(Json(periods))
}
