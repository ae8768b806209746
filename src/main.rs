use std::time::Duration;

use clap::Parser;
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

use portal::config::{Command, Config, LogFormat};
use portal::models::session::Session;
use portal::models::user::{NewUser, Role, UserStatus, User};
use portal::{AppState, auth, db, seed};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("portal=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Periodically drop expired sessions so the table does not grow unbounded.
fn spawn_session_sweeper(pool: SqlitePool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match Session::purge_expired(&pool).await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Purged {n} expired sessions"),
                Err(e) => tracing::warn!("Session purge failed: {e}"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            spawn_session_sweeper(pool.clone());
            let app = portal::app(AppState::new(pool, config.session_settings()));

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {listen_addr}");
            axum::serve(listener, app).await?;
        }
        Command::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => {
            let admin = User::create(
                &pool,
                NewUser {
                    first_name,
                    last_name,
                    email,
                    password_hash: auth::hash_password(&password)?,
                    role: Role::Admin,
                    status: UserStatus::Active,
                    grade_level: None,
                },
            )
            .await?;
            tracing::info!(user_id = admin.id, "Created admin {}", admin.email);
        }
        Command::SeedDemo => {
            let summary = seed::seed_demo(&pool).await?;
            tracing::info!("{summary}");
        }
    }

    Ok(())
}
