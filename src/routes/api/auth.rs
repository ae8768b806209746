use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::{self, expired_session_cookie, session_cookie};
use crate::error::AppError;
use crate::forms::{LoginForm, RegisterForm};

pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, AppError> {
    let user = auth::resolve_user(&state, &headers).await?;
    Ok(Json(json!({ "user": user.map(|u| u.summary()) })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = auth::login(&state, &form).await?;
    let cookie = session_cookie(&token, state.sessions.ttl_hours, state.sessions.secure);
    let redirect = form.safe_next().unwrap_or(user.role.home_path()).to_string();
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({
            "user": user.summary(),
            "role": user.role,
            "redirect": redirect,
        })),
    ))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse, AppError> {
    auth::logout(&state, &headers).await?;
    Ok((
        AppendHeaders([(SET_COOKIE, expired_session_cookie())]),
        Json(json!({ "success": true })),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::register(&state, &form).await?;
    let message = if user.status == crate::models::user::UserStatus::Pending {
        "Registration received; an administrator will approve your account"
    } else {
        "Registration successful"
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user.summary(), "message": message })),
    ))
}
