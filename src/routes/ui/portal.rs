use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{self, expired_session_cookie, session_cookie};
use crate::error::{AppError, HtmlError};
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::models::user::Role;
use crate::ui::components::{Button, Card, Input, Select};

/// `/` sends signed-in users to their dashboard and everyone else to the
/// public landing page.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Result<Redirect, HtmlError> {
    let target = match auth::resolve_user(&state, &headers).await? {
        Some(user) => user.role.home_path(),
        None => "/portal",
    };
    Ok(Redirect::to(target))
}

pub struct Feature {
    pub title: &'static str,
    pub blurb: &'static str,
    pub href: &'static str,
    pub accent: &'static str,
}

const FEATURES: [Feature; 3] = [
    Feature {
        title: "For Students",
        blurb: "See assignments, hand in work, and check today's timetable.",
        href: "/student",
        accent: "text-blue-600",
    },
    Feature {
        title: "For Teachers",
        blurb: "Manage classes, take attendance, and grade submissions.",
        href: "/teacher",
        accent: "text-green-600",
    },
    Feature {
        title: "For Parents",
        blurb: "Follow your children's attendance, grades and school news.",
        href: "/parent",
        accent: "text-purple-600",
    },
];

#[derive(Template, WebTemplate)]
#[template(path = "portal/index.html")]
pub struct LandingPage {
    pub features: &'static [Feature],
}

pub async fn landing() -> LandingPage {
    LandingPage {
        features: &FEATURES,
    }
}

#[derive(Template)]
#[template(path = "portal/login_form.html")]
pub struct LoginFields {
    pub email: Input,
    pub password: Input,
    pub next: String,
    pub error: String,
    pub submit: Button,
}

#[derive(Template, WebTemplate)]
#[template(path = "portal/login.html")]
pub struct LoginPage {
    pub registered: bool,
    pub card: Card<LoginFields>,
}

impl LoginPage {
    fn new(form: &LoginForm, errors: &FieldErrors, error: String, registered: bool) -> Self {
        let fields = LoginFields {
            email: Input::new("Email Address", "email", "email")
                .value(form.email.clone())
                .placeholder("you@school.test")
                .required()
                .error(errors.get("email")),
            password: Input::new("Password", "password", "password")
                .required()
                .error(errors.get("password")),
            next: form.safe_next().unwrap_or_default().to_string(),
            error,
            submit: Button::submit("Sign In").full_width(),
        };
        LoginPage {
            registered,
            card: Card::new("Sign in to your account", fields),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
    pub next: Option<String>,
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> LoginPage {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    let registered = query.registered.as_deref() == Some("true");
    LoginPage::new(&form, &FieldErrors::new(), String::new(), registered)
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, HtmlError> {
    match auth::login(&state, &form).await {
        Ok((user, token)) => {
            let cookie = session_cookie(&token, state.sessions.ttl_hours, state.sessions.secure);
            let target = form.safe_next().unwrap_or(user.role.home_path());
            Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(target)).into_response())
        }
        Err(AppError::Validation(errors)) => {
            Ok(LoginPage::new(&form, &errors, String::new(), false).into_response())
        }
        Err(e @ (AppError::InvalidCredentials | AppError::Forbidden(_))) => {
            let (_, message) = e.status_and_message();
            Ok(LoginPage::new(&form, &FieldErrors::new(), message, false).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Template)]
#[template(path = "portal/register_form.html")]
pub struct RegisterFields {
    pub first_name: Input,
    pub last_name: Input,
    pub email: Input,
    pub role: Select,
    pub password: Input,
    pub confirm_password: Input,
    pub error: String,
    pub submit: Button,
}

#[derive(Template, WebTemplate)]
#[template(path = "portal/register.html")]
pub struct RegisterPage {
    pub card: Card<RegisterFields>,
}

const REGISTRABLE_ROLES: [Role; 3] = [Role::Student, Role::Teacher, Role::Parent];

impl RegisterPage {
    fn new(form: &RegisterForm, errors: &FieldErrors, error: String) -> Self {
        let fields = RegisterFields {
            first_name: Input::text("First Name", "firstName")
                .value(form.first_name.clone())
                .required()
                .error(errors.get("firstName")),
            last_name: Input::text("Last Name", "lastName")
                .value(form.last_name.clone())
                .required()
                .error(errors.get("lastName")),
            email: Input::new("Email Address", "email", "email")
                .value(form.email.clone())
                .required()
                .error(errors.get("email")),
            role: Select::new(
                "I am a",
                "role",
                REGISTRABLE_ROLES.map(|r| (r.as_str(), r.label())),
            )
            .selected(form.role.clone())
            .required()
            .error(errors.get("role")),
            password: Input::new("Password", "password", "password")
                .required()
                .error(errors.get("password")),
            confirm_password: Input::new("Confirm Password", "confirmPassword", "password")
                .required()
                .error(errors.get("confirmPassword")),
            error,
            submit: Button::submit("Create Account").full_width(),
        };
        RegisterPage {
            card: Card::new("Create your account", fields),
        }
    }
}

pub async fn register_page() -> RegisterPage {
    RegisterPage::new(&RegisterForm::default(), &FieldErrors::new(), String::new())
}

pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Result<Response, HtmlError> {
    match auth::register(&state, &form).await {
        Ok(_) => Ok(Redirect::to("/portal/auth/login?registered=true").into_response()),
        Err(AppError::Validation(errors)) => Ok(RegisterPage::new(&form, &errors, String::new()).into_response()),
        Err(AppError::Conflict(message)) => {
            let mut errors = FieldErrors::new();
            errors.add("email", message);
            Ok(RegisterPage::new(&form, &errors, String::new()).into_response())
        }
        Err(AppError::BadRequest(message)) => {
            Ok(RegisterPage::new(&form, &FieldErrors::new(), message).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, HtmlError> {
    auth::logout(&state, &headers).await?;
    Ok((
        AppendHeaders([(SET_COOKIE, expired_session_cookie())]),
        Redirect::to("/portal/auth/login"),
    )
        .into_response())
}
