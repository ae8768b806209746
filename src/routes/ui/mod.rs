//! Server-rendered pages. Each role gets its own guarded router; forms post
//! back to these routes and redirect with a `?notice=` message.

pub mod admin;
pub mod parent;
pub mod portal;
pub mod student;
pub mod teacher;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Redirect;
use axum::routing::{get, post};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{Guard, require_role};
use crate::error::{AppError, HtmlError};
use crate::models::user::Role;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(portal::root))
        .route("/portal", get(portal::landing))
        .route(
            "/portal/auth/login",
            get(portal::login_page).post(portal::login),
        )
        .route(
            "/portal/auth/register",
            get(portal::register_page).post(portal::register),
        )
        .route("/portal/auth/logout", post(portal::logout));

    let admin = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/users", get(admin::users).post(admin::create_user))
        .route("/admin/users/{id}/status", post(admin::set_status))
        .route("/admin/users/{id}/role", post(admin::set_role))
        .route("/admin/users/{id}/delete", post(admin::delete_user))
        .route("/admin/reports", get(admin::reports))
        .route(
            "/admin/announcements",
            get(admin::announcements).post(admin::post_announcement),
        )
        .route_layer(middleware::from_fn_with_state(
            Guard::page(state.clone(), &[Role::Admin]),
            require_role,
        ));

    let parent = Router::new()
        .route("/parent", get(parent::dashboard))
        .route("/parent/notifications/read", post(parent::mark_read))
        .route("/parent/attendance", get(parent::attendance))
        .route("/parent/performance", get(parent::performance))
        .route_layer(middleware::from_fn_with_state(
            Guard::page(state.clone(), &[Role::Parent]),
            require_role,
        ));

    let student = Router::new()
        .route("/student", get(student::dashboard))
        .route("/student/assignments", get(student::assignments))
        .route("/student/assignments/{id}/submit", post(student::submit))
        .route("/student/schedule", get(student::schedule))
        .route_layer(middleware::from_fn_with_state(
            Guard::page(state.clone(), &[Role::Student]),
            require_role,
        ));

    let teacher = Router::new()
        .route("/teacher", get(teacher::dashboard))
        .route(
            "/teacher/classes",
            get(teacher::classes).post(teacher::create_class),
        )
        .route("/teacher/classes/{id}/students", post(teacher::add_student))
        .route(
            "/teacher/classes/{id}/attendance",
            post(teacher::take_attendance),
        )
        .route(
            "/teacher/assignments",
            get(teacher::assignments).post(teacher::create_assignment),
        )
        .route(
            "/teacher/assignments/{id}/status",
            post(teacher::set_assignment_status),
        )
        .route(
            "/teacher/submissions/{id}/grade",
            get(teacher::grade_page).post(teacher::grade),
        )
        .route_layer(middleware::from_fn_with_state(
            Guard::page(state.clone(), &[Role::Teacher]),
            require_role,
        ));

    Router::new()
        .merge(public)
        .merge(admin)
        .merge(parent)
        .merge(student)
        .merge(teacher)
        .with_state(state)
}

/// The one-off message carried by a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Notice {
    pub notice: Option<String>,
}

/// Redirect to `path` with `message` shown as the page notice.
pub fn with_notice(path: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{path}{separator}notice={}",
        utf8_percent_encode(message, NON_ALPHANUMERIC)
    ))
}

/// Finish a form action by going back to `path`. Rejected input comes back
/// as a notice; session problems and server errors go through [`HtmlError`].
pub fn finish(path: &str, result: Result<String, AppError>) -> Result<Redirect, HtmlError> {
    match result {
        Ok(message) => Ok(with_notice(path, &message)),
        Err(e) => {
            let (status, message) = e.status_and_message();
            let recoverable = status.is_client_error()
                && status != StatusCode::UNAUTHORIZED
                && status != StatusCode::FORBIDDEN;
            if recoverable {
                tracing::warn!(%status, "form action rejected: {message}");
                Ok(with_notice(path, &message))
            } else {
                Err(HtmlError(e))
            }
        }
    }
}

/// Whether a `?modal=` query asks for the named dialog.
pub fn wants_modal(modal: Option<&str>, name: &str) -> bool {
    modal == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn location(redirect: Redirect) -> String {
        redirect.into_response().headers()["location"]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn notices_are_percent_encoded() {
        assert_eq!(
            location(with_notice("/admin/users", "User saved")),
            "/admin/users?notice=User%20saved"
        );
        assert_eq!(
            location(with_notice("/teacher/classes?class=2", "Done")),
            "/teacher/classes?class=2&notice=Done"
        );
    }

    #[test]
    fn rejected_actions_become_notices() {
        let redirect = finish(
            "/admin/users",
            Err(AppError::BadRequest("You cannot delete your own account".into())),
        )
        .unwrap();
        assert!(location(redirect).starts_with("/admin/users?notice=You%20cannot"));
    }

    #[test]
    fn server_errors_are_not_swallowed() {
        assert!(finish("/admin", Err(AppError::Internal("boom".into()))).is_err());
        assert!(finish("/admin", Err(AppError::Unauthorized)).is_err());
    }
}
