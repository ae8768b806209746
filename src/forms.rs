//! Form payloads shared by the JSON API and the HTML pages, with the
//! validation rules both surfaces apply.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::user::{Role, UserStatus};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Per-field error messages. Only the first error for a field is kept.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for `field`, or an empty string when the field is valid.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Invalid email format");
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors
    }

    /// The post-login destination when it is a local path.
    pub fn safe_next(&self) -> Option<&str> {
        self.next
            .as_deref()
            .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\"))
            .filter(|n| !n.chars().any(char::is_control))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default = "default_register_role")]
    pub role: String,
}

fn default_register_role() -> String {
    "student".to_string()
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            role: default_register_role(),
        }
    }
}

impl RegisterForm {
    /// Validate every field and resolve the requested role.
    pub fn validate(&self) -> Result<Role, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.first_name.trim().is_empty() {
            errors.add("firstName", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add("lastName", "Last name is required");
        }
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
        }
        let role = self
            .role
            .parse::<Role>()
            .ok()
            .filter(|r| r.self_registrable());
        if role.is_none() {
            errors.add("role", "Choose student, teacher or parent");
        }
        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(errors),
        }
    }
}

/// An account created from the admin console.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidNewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub grade_level: Option<i64>,
}

impl NewUserForm {
    pub fn validate(&self) -> Result<ValidNewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        let (first_name, last_name) = split_name(&self.name);
        if first_name.is_empty() {
            errors.add("name", "Name is required");
        }
        check_email(&mut errors, &self.email);
        let role = self.role.parse::<Role>().ok();
        if role.is_none() {
            errors.add("role", "Choose a role");
        }
        let status = match non_empty(self.status.clone()) {
            None => Some(UserStatus::Active),
            Some(s) => s.parse::<UserStatus>().ok(),
        };
        if status.is_none() {
            errors.add("status", "Choose a status");
        }
        let grade_level = match non_empty(self.grade_level.clone()) {
            None => None,
            Some(g) => match g.trim().parse::<i64>() {
                Ok(level) if (1..=12).contains(&level) => Some(level),
                _ => {
                    errors.add("gradeLevel", "Grade level must be between 1 and 12");
                    None
                }
            },
        };
        match (role, status) {
            (Some(role), Some(status)) if errors.is_empty() => Ok(ValidNewUser {
                first_name,
                last_name,
                email: self.email.trim().to_string(),
                role,
                status,
                grade_level,
            }),
            _ => Err(errors),
        }
    }
}

/// Parse an `all`-or-id selector such as `childId=all` or `class=4`.
pub fn parse_id_filter(value: Option<&str>) -> Result<Option<i64>, AppError> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid id: {raw}"))),
    }
}

/// Split a single "name" field into first and last name at the first space.
pub fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Treat empty form strings as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> RegisterForm {
        RegisterForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@school.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            role: "parent".into(),
        }
    }

    #[test]
    fn login_requires_email_and_password() {
        let errors = LoginForm::default().validate();
        assert_eq!(errors.get("email"), "Email is required");
        assert_eq!(errors.get("password"), "Password is required");

        let form = LoginForm {
            email: "not-an-email".into(),
            password: "x".into(),
            next: None,
        };
        let errors = form.validate();
        assert_eq!(errors.get("email"), "Invalid email format");
        assert_eq!(errors.get("password"), "");
    }

    #[test]
    fn register_accepts_valid_form() {
        assert_eq!(register().validate(), Ok(Role::Parent));
    }

    #[test]
    fn register_reports_every_field() {
        let form = RegisterForm {
            first_name: "  ".into(),
            last_name: String::new(),
            email: "a@b".into(),
            password: "123".into(),
            confirm_password: "1234".into(),
            role: "admin".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("firstName"), "First name is required");
        assert_eq!(errors.get("lastName"), "Last name is required");
        assert_eq!(errors.get("email"), "Invalid email format");
        assert_eq!(
            errors.get("password"),
            "Password must be at least 6 characters"
        );
        assert_eq!(errors.get("confirmPassword"), "Passwords do not match");
        assert!(!errors.get("role").is_empty());
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.get("email"), "first");
    }

    #[test]
    fn next_must_be_local() {
        let mut form = LoginForm::default();
        form.next = Some("/teacher/classes".into());
        assert_eq!(form.safe_next(), Some("/teacher/classes"));
        form.next = Some("//evil.test".into());
        assert_eq!(form.safe_next(), None);
        form.next = Some("https://evil.test".into());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/\\evil.test".into());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/teacher\r\nLocation: //evil.test".into());
        assert_eq!(form.safe_next(), None);
    }

    #[test]
    fn new_user_defaults_to_active() {
        let form = NewUserForm {
            name: "Grace Hopper".into(),
            email: "grace@school.test".into(),
            role: "teacher".into(),
            status: Some(String::new()),
            grade_level: None,
        };
        let user = form.validate().unwrap();
        assert_eq!(user.first_name, "Grace");
        assert_eq!(user.last_name, "Hopper");
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn new_user_rejects_bad_fields() {
        let form = NewUserForm {
            name: " ".into(),
            email: "nope".into(),
            role: "janitor".into(),
            status: Some("archived".into()),
            grade_level: Some("13".into()),
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "email", "role", "status", "gradeLevel"] {
            assert!(!errors.get(field).is_empty(), "{field} should fail");
        }
    }

    #[test]
    fn id_filters() {
        assert_eq!(parse_id_filter(None).unwrap(), None);
        assert_eq!(parse_id_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_id_filter(Some("42")).unwrap(), Some(42));
        assert!(parse_id_filter(Some("abc")).is_err());
    }

    #[test]
    fn splits_names() {
        assert_eq!(
            split_name(" Grace  Brewster Hopper "),
            ("Grace".to_string(), "Brewster Hopper".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }
}
