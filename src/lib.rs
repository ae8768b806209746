pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod routes;
pub mod seed;
pub mod ui;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl_hours: i64,
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            secure: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionSettings,
}

impl AppState {
    pub fn new(pool: SqlitePool, sessions: SessionSettings) -> Self {
        Self { pool, sessions }
    }
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let result: Result<(i32,), _> = sqlx::query_as("SELECT 1").fetch_one(&state.pool).await;
    match result {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready"),
    }
}

/// The complete HTTP application: health probes, pages and the JSON API.
pub fn app(state: AppState) -> Router {
    let probes = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state.clone());

    Router::new()
        .merge(probes)
        .merge(routes::ui::router(state.clone()))
        .merge(routes::api::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
