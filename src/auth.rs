use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::AppState;
use crate::error::AppError;
use crate::forms::{LoginForm, RegisterForm};
use crate::models::activity::{Activity, ActivityKind};
use crate::models::notification::Notification;
use crate::models::session::Session;
use crate::models::user::{NewUser, Role, User, UserStatus};

pub const SESSION_COOKIE: &str = "portal_session";

/// Hash a raw session token for storage/lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random session token.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Readable one-time password handed out when an admin creates an account.
pub fn generate_password() -> String {
    let bytes: [u8; 6] = rand::rng().random();
    hex::encode(bytes)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("salt encoding failed: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Unparseable password hash in database: {e}");
            false
        }
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, ttl_hours: i64, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(ttl_hours))
        .secure(secure)
        .build()
        .to_string()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

/// Session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// The signed-in user for this request, if any.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    match session_token(headers) {
        Some(token) => Session::user_for_token(&state.pool, &token).await,
        None => Ok(None),
    }
}

/// Check credentials and open a session. Returns the user and the raw
/// session token for the cookie.
pub async fn login(state: &AppState, form: &LoginForm) -> Result<(User, String), AppError> {
    form.validate().into_result()?;
    let user = User::find_by_email(&state.pool, &form.email).await?;
    let Some(user) = user.filter(|u| verify_password(&form.password, &u.password_hash)) else {
        tracing::warn!(email = %form.email.trim(), "failed login");
        return Err(AppError::InvalidCredentials);
    };
    match user.status {
        UserStatus::Active => {}
        UserStatus::Pending => {
            return Err(AppError::Forbidden(
                "Your account is awaiting administrator approval".to_string(),
            ));
        }
        UserStatus::Inactive => {
            return Err(AppError::Forbidden(
                "Your account has been deactivated".to_string(),
            ));
        }
    }

    let token = Session::create(&state.pool, user.id, state.sessions.ttl_hours).await?;
    User::touch_login(&state.pool, user.id).await?;
    Activity::record(&state.pool, Some(&user), ActivityKind::Login, format!("{} signed in", user.full_name())).await;
    tracing::info!(user_id = user.id, role = %user.role, "user signed in");
    Ok((user, token))
}

/// Create a self-service account. Teachers wait for an admin to approve them.
pub async fn register(state: &AppState, form: &RegisterForm) -> Result<User, AppError> {
    let role = form.validate().map_err(AppError::Validation)?;
    let status = if role == Role::Teacher {
        UserStatus::Pending
    } else {
        UserStatus::Active
    };
    let user = User::create(
        &state.pool,
        NewUser {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            password_hash: hash_password(&form.password)?,
            role,
            status,
            grade_level: None,
        },
    )
    .await?;

    Activity::record(
        &state.pool,
        Some(&user),
        ActivityKind::Register,
        format!("{} registered as {}", user.full_name(), role.label().to_lowercase()),
    )
    .await;
    if status == UserStatus::Pending {
        let admins: Vec<i64> = User::list_by_role(&state.pool, Role::Admin)
            .await?
            .iter()
            .map(|a| a.id)
            .collect();
        Notification::notify_all(
            &state.pool,
            &admins,
            "Account awaiting approval",
            &format!("{} ({}) registered as a teacher", user.full_name(), user.email),
        )
        .await?;
    }
    tracing::info!(user_id = user.id, role = %role, status = %status, "user registered");
    Ok(user)
}

/// End the session carried by `headers`, if any.
pub async fn logout(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if let Some(token) = session_token(headers) {
        Session::delete(&state.pool, &token).await?;
        tracing::info!("user signed out");
    }
    Ok(())
}

/// The authenticated user, placed in request extensions by [`require_role`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// How a guard answers a request it rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// JSON 401/403 for API clients.
    Json,
    /// Redirects for browsers: to the login page, or home for the wrong role.
    Redirect,
}

#[derive(Clone)]
pub struct Guard {
    state: AppState,
    roles: &'static [Role],
    denial: Denial,
}

impl Guard {
    pub fn api(state: AppState, roles: &'static [Role]) -> Self {
        Self {
            state,
            roles,
            denial: Denial::Json,
        }
    }

    pub fn page(state: AppState, roles: &'static [Role]) -> Self {
        Self {
            state,
            roles,
            denial: Denial::Redirect,
        }
    }

    fn deny_anonymous(&self, uri: &Uri) -> Response {
        match self.denial {
            Denial::Json => AppError::Unauthorized.into_response(),
            Denial::Redirect => Redirect::to(&login_redirect(uri)).into_response(),
        }
    }

    fn deny_role(&self, user: &User) -> Response {
        tracing::warn!(user_id = user.id, role = %user.role, "role not allowed here");
        match self.denial {
            Denial::Json => {
                AppError::Forbidden("You do not have access to this resource".to_string())
                    .into_response()
            }
            Denial::Redirect => Redirect::to("/").into_response(),
        }
    }
}

/// Login URL that brings the visitor back to `uri` afterwards.
pub fn login_redirect(uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!(
        "/portal/auth/login?next={}",
        utf8_percent_encode(target, NON_ALPHANUMERIC)
    )
}

/// Middleware that requires a valid session whose role the guard allows.
pub async fn require_role(State(guard): State<Guard>, mut request: Request, next: Next) -> Response {
    let user = match resolve_user(&guard.state, request.headers()).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    match user {
        None => guard.deny_anonymous(request.uri()),
        Some(user) if !guard.roles.contains(&user.role) => guard.deny_role(&user),
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
    }
}
