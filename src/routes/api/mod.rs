pub mod admin;
pub mod auth;
pub mod parent;
pub mod student;
pub mod teacher;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

use crate::AppState;
use crate::auth::{Guard, require_role};
use crate::models::user::Role;

pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/session", get(auth::session))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register));

    let admin = Router::new()
        .route("/stats", get(admin::stats))
        .route("/activities", get(admin::activities))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/reports", get(admin::reports))
        .route("/reports/export", get(admin::export_report))
        .route(
            "/announcements",
            get(admin::list_announcements).post(admin::create_announcement),
        )
        .layer(middleware::from_fn_with_state(
            Guard::api(state.clone(), &[Role::Admin]),
            require_role,
        ));

    let parent = Router::new()
        .route("/children", get(parent::children))
        .route("/notifications", get(parent::notifications))
        .route("/notifications/read", post(parent::mark_notifications_read))
        .route("/attendance", get(parent::attendance))
        .route("/performance", get(parent::performance))
        .layer(middleware::from_fn_with_state(
            Guard::api(state.clone(), &[Role::Parent]),
            require_role,
        ));

    let student = Router::new()
        .route("/info", get(student::info))
        .route("/assignments", get(student::assignments))
        .route("/assignments/{id}/submit", post(student::submit))
        .route("/schedule", get(student::schedule))
        .layer(middleware::from_fn_with_state(
            Guard::api(state.clone(), &[Role::Student]),
            require_role,
        ));

    let teacher = Router::new()
        .route("/classes", get(teacher::classes).post(teacher::create_class))
        .route("/classes/{id}", get(teacher::class_detail))
        .route("/classes/{id}/students", post(teacher::add_student))
        .route("/classes/{id}/attendance", post(teacher::take_attendance))
        .route("/upcoming-tasks", get(teacher::upcoming_tasks))
        .route("/recent-submissions", get(teacher::recent_submissions))
        .route(
            "/assignments",
            get(teacher::assignments).post(teacher::create_assignment),
        )
        .route("/assignments/{id}", put(teacher::update_assignment))
        .route("/submissions/{id}/grade", post(teacher::grade_submission))
        .layer(middleware::from_fn_with_state(
            Guard::api(state.clone(), &[Role::Teacher]),
            require_role,
        ));

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/admin", admin)
        .nest("/parent", parent)
        .nest("/student", student)
        .nest("/teacher", teacher)
        .with_state(state);

    Router::new().nest("/api", api)
}
