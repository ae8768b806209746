use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde_json::json;

use crate::forms::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Database(e) => {
                if let sqlx::Error::Database(db_err) = e
                    && db_err.is_unique_violation()
                {
                    return (StatusCode::CONFLICT, "Resource already exists".to_string());
                }
                if let sqlx::Error::Database(db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return (
                        StatusCode::BAD_REQUEST,
                        "Referenced record does not exist".to_string(),
                    );
                }
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Internal(format!("template rendering failed: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = match self {
            AppError::Validation(errors) => json!({ "message": message, "errors": errors }),
            _ => json!({ "message": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    reason: String,
    message: String,
}

/// Error type for page handlers: renders an HTML error page, and sends
/// unauthenticated or unauthorized visitors back through the login flow.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl<E> From<E> for HtmlError
where
    E: Into<AppError>,
{
    fn from(e: E) -> Self {
        HtmlError(e.into())
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Unauthorized => Redirect::to("/portal/auth/login").into_response(),
            AppError::Forbidden(_) => Redirect::to("/").into_response(),
            err => {
                let (status, message) = err.status_and_message();
                let page = ErrorPage {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("Error").to_string(),
                    message,
                };
                match page.render() {
                    Ok(html) => (status, Html(html)).into_response(),
                    Err(e) => {
                        tracing::error!("Failed to render error page: {e}");
                        (status, page.message).into_response()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn html_error_redirects_anonymous_visitors() {
        let response = HtmlError(AppError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/portal/auth/login"
        );
    }

    #[test]
    fn html_error_renders_not_found_page() {
        let response = HtmlError(AppError::NotFound("Class 9 not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
