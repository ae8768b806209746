use clap::{Parser, ValueEnum};

/// Longest session lifetime accepted from the command line: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Parser, Debug, Clone)]
#[command(name = "portal", about = "School portal for admins, teachers, students and parents")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://portal.db?mode=rwc")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// Lifetime of a login session in hours
    #[arg(long, env = "SESSION_TTL_HOURS", default_value = "24")]
    pub session_ttl_hours: i64,

    /// Mark session cookies as Secure (enable behind HTTPS)
    #[arg(long, env = "SECURE_COOKIES", default_value = "false")]
    pub secure_cookies: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,

        #[arg(long, default_value = "Site")]
        first_name: String,

        #[arg(long, default_value = "Admin")]
        last_name: String,
    },
    /// Populate an empty database with a demo school
    SeedDemo,
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn session_settings(&self) -> crate::SessionSettings {
        crate::SessionSettings {
            ttl_hours: self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS),
            secure: self.secure_cookies,
        }
    }
}
