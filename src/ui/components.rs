//! Reusable page components. Each renders through its own template and is
//! embedded in pages with `{{ component|safe }}`.

use std::fmt::Display;

use askama::Template;

use crate::models::assignment::{AssignmentStatus, Priority, StudentStatus};
use crate::models::attendance::AttendanceStatus;
use crate::models::user::UserStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeVariant {
    #[default]
    Default,
    Success,
    Warning,
    Danger,
    Info,
}

impl BadgeVariant {
    pub fn classes(self) -> &'static str {
        match self {
            BadgeVariant::Default => "bg-gray-100 text-gray-800",
            BadgeVariant::Success => "bg-green-100 text-green-800",
            BadgeVariant::Warning => "bg-yellow-100 text-yellow-800",
            BadgeVariant::Danger => "bg-red-100 text-red-800",
            BadgeVariant::Info => "bg-blue-100 text-blue-800",
        }
    }

    /// Variant for any status word shown in the portal; unknown words get
    /// the neutral style.
    pub fn for_status(status: &str) -> BadgeVariant {
        match status {
            "active" | "present" | "graded" => BadgeVariant::Success,
            "pending" | "late" | "medium" => BadgeVariant::Warning,
            "inactive" | "absent" | "overdue" | "high" => BadgeVariant::Danger,
            "excused" | "submitted" | "grading" | "low" => BadgeVariant::Info,
            _ => BadgeVariant::Default,
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/badge.html")]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
}

impl Badge {
    pub fn new(label: impl Into<String>, variant: BadgeVariant) -> Self {
        Badge {
            label: label.into(),
            variant,
        }
    }

    pub fn status(status: &str, label: &str) -> Self {
        Badge::new(label, BadgeVariant::for_status(status))
    }

    /// Green `+x%` for growth, red otherwise.
    pub fn change(change: f64, display: String) -> Self {
        let variant = if change > 0.0 {
            BadgeVariant::Success
        } else {
            BadgeVariant::Danger
        };
        Badge::new(display, variant)
    }
}

impl UserStatus {
    pub fn badge(self) -> Badge {
        Badge::status(self.as_str(), self.label())
    }
}

impl AttendanceStatus {
    pub fn badge(self) -> Badge {
        Badge::status(self.as_str(), self.label())
    }
}

impl AssignmentStatus {
    pub fn badge(self) -> Badge {
        // Closed assignments are neutral rather than a warning or error.
        match self {
            AssignmentStatus::Closed => Badge::new(self.label(), BadgeVariant::Default),
            _ => Badge::status(self.as_str(), self.label()),
        }
    }
}

impl StudentStatus {
    pub fn badge(self) -> Badge {
        let variant = match self {
            StudentStatus::Late => BadgeVariant::Danger,
            _ => BadgeVariant::for_status(self.as_str()),
        };
        Badge::new(self.label(), variant)
    }
}

impl Priority {
    pub fn badge(self) -> Badge {
        Badge::status(self.as_str(), self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
}

impl ButtonVariant {
    pub fn classes(self) -> &'static str {
        match self {
            ButtonVariant::Primary => "bg-blue-600 hover:bg-blue-700 text-white",
            ButtonVariant::Secondary => "bg-gray-200 hover:bg-gray-300 text-gray-800",
            ButtonVariant::Success => "bg-green-600 hover:bg-green-700 text-white",
            ButtonVariant::Danger => "bg-red-600 hover:bg-red-700 text-white",
            ButtonVariant::Warning => "bg-yellow-500 hover:bg-yellow-600 text-white",
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/button.html")]
pub struct Button {
    pub label: String,
    pub variant: ButtonVariant,
    pub button_type: &'static str,
    pub disabled: bool,
    pub class: &'static str,
}

impl Button {
    pub fn submit(label: impl Into<String>) -> Self {
        Button {
            label: label.into(),
            variant: ButtonVariant::Primary,
            button_type: "submit",
            disabled: false,
            class: "",
        }
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn full_width(mut self) -> Self {
        self.class = "w-full";
        self
    }

    pub fn classes(&self) -> String {
        let mut classes = format!(
            "px-4 py-2 rounded-md font-medium transition-colors {}",
            self.variant.classes()
        );
        if self.disabled {
            classes.push_str(" opacity-50 cursor-not-allowed");
        }
        if !self.class.is_empty() {
            classes.push(' ');
            classes.push_str(self.class);
        }
        classes
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/input.html")]
pub struct Input {
    pub label: String,
    pub name: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub placeholder: String,
    pub required: bool,
    pub error: String,
}

impl Input {
    pub fn new(label: impl Into<String>, name: &'static str, input_type: &'static str) -> Self {
        Input {
            label: label.into(),
            name,
            input_type,
            value: String::new(),
            placeholder: String::new(),
            required: false,
            error: String::new(),
        }
    }

    pub fn text(label: impl Into<String>, name: &'static str) -> Self {
        Self::new(label, name, "text")
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn error(mut self, error: &str) -> Self {
        self.error = error.to_string();
        self
    }

    pub fn border_class(&self) -> &'static str {
        if self.error.is_empty() {
            "border-gray-300"
        } else {
            "border-red-500"
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/select.html")]
pub struct Select {
    pub label: String,
    pub name: &'static str,
    pub options: Vec<(String, String)>,
    pub selected: String,
    pub required: bool,
    pub error: String,
    /// Submit the enclosing form when the choice changes.
    pub auto_submit: bool,
}

impl Select {
    pub fn new<V, L>(label: impl Into<String>, name: &'static str, options: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<String>,
        L: Into<String>,
    {
        Select {
            label: label.into(),
            name,
            options: options
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
            selected: String::new(),
            required: false,
            error: String::new(),
            auto_submit: false,
        }
    }

    pub fn selected(mut self, value: impl Into<String>) -> Self {
        self.selected = value.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn error(mut self, error: &str) -> Self {
        self.error = error.to_string();
        self
    }

    pub fn auto_submit(mut self) -> Self {
        self.auto_submit = true;
        self
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected == value
    }

    pub fn border_class(&self) -> &'static str {
        if self.error.is_empty() {
            "border-gray-300"
        } else {
            "border-red-500"
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/card.html")]
pub struct Card<B: Display> {
    pub title: String,
    pub class: &'static str,
    pub body: B,
}

impl<B: Display> Card<B> {
    pub fn new(title: impl Into<String>, body: B) -> Self {
        Card {
            title: title.into(),
            class: "",
            body,
        }
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.class = class;
        self
    }
}

/// A dialog over the page. Pages only build one when it is open, so
/// closing is a link back to the page without the `modal` query.
#[derive(Debug, Clone, Template)]
#[template(path = "components/modal.html")]
pub struct Modal<B: Display> {
    pub title: String,
    pub close_href: String,
    pub body: B,
}

impl<B: Display> Modal<B> {
    pub fn new(title: impl Into<String>, close_href: impl Into<String>, body: B) -> Self {
        Modal {
            title: title.into(),
            close_href: close_href.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, Template)]
#[template(path = "components/stat_card.html")]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub accent: &'static str,
}

impl StatCard {
    pub fn new(label: impl Into<String>, value: impl ToString, accent: &'static str) -> Self {
        StatCard {
            label: label.into(),
            value: value.to_string(),
            accent,
        }
    }
}

/// Text colour for a percentage grade.
pub fn grade_color(percent: f64) -> &'static str {
    if percent >= 90.0 {
        "text-green-600"
    } else if percent >= 80.0 {
        "text-blue-600"
    } else if percent >= 70.0 {
        "text-yellow-600"
    } else {
        "text-red-600"
    }
}

/// Text colour for an attendance rate.
pub fn attendance_color(rate: f64) -> &'static str {
    if rate >= 90.0 {
        "text-green-600"
    } else if rate >= 80.0 {
        "text-yellow-600"
    } else {
        "text-red-600"
    }
}

/// Accent for a subject's schedule card, keyed by display name.
pub fn subject_color(subject: &str) -> &'static str {
    match subject {
        "Mathematics" => "bg-blue-100 border-blue-500",
        "Science" => "bg-green-100 border-green-500",
        "English" => "bg-purple-100 border-purple-500",
        "History" => "bg-yellow-100 border-yellow-500",
        "Physical Education" => "bg-red-100 border-red-500",
        "Art" => "bg-pink-100 border-pink-500",
        _ => "bg-gray-100 border-gray-500",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_badges() {
        assert_eq!(UserStatus::Pending.badge().variant, BadgeVariant::Warning);
        assert_eq!(UserStatus::Inactive.badge().variant, BadgeVariant::Danger);
        assert_eq!(AttendanceStatus::Excused.badge().variant, BadgeVariant::Info);
        assert_eq!(AssignmentStatus::Closed.badge().variant, BadgeVariant::Default);
        assert_eq!(AssignmentStatus::Grading.badge().variant, BadgeVariant::Info);
        assert_eq!(StudentStatus::Late.badge().variant, BadgeVariant::Danger);
        assert_eq!(StudentStatus::Submitted.badge().variant, BadgeVariant::Info);
        assert_eq!(Priority::High.badge().variant, BadgeVariant::Danger);
        assert_eq!(BadgeVariant::for_status("archived"), BadgeVariant::Default);
    }

    #[test]
    fn badge_renders_label_and_classes() {
        let html = Badge::new("Active", BadgeVariant::Success).render().unwrap();
        assert!(html.contains("Active"));
        assert!(html.contains("bg-green-100 text-green-800"));
    }

    #[test]
    fn badge_escapes_label() {
        let html = Badge::new("<b>x</b>", BadgeVariant::Default).render().unwrap();
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn disabled_button_is_dimmed() {
        let button = Button::submit("Save").variant(ButtonVariant::Danger).disabled(true);
        let classes = button.classes();
        assert!(classes.contains("bg-red-600"));
        assert!(classes.ends_with("opacity-50 cursor-not-allowed"));
        assert!(button.render().unwrap().contains("disabled"));
    }

    #[test]
    fn input_marks_required_and_errors() {
        let html = Input::new("Email", "email", "email")
            .required()
            .error("Email is required")
            .render()
            .unwrap();
        assert!(html.contains("text-red-500"));
        assert!(html.contains("Email is required"));
        assert!(html.contains("border-red-500"));
        assert!(html.contains("name=\"email\""));
    }

    #[test]
    fn select_keeps_choice() {
        let select = Select::new("Role", "role", [("student", "Student"), ("teacher", "Teacher")])
            .selected("teacher");
        assert!(select.is_selected("teacher"));
        let html = select.render().unwrap();
        assert!(html.contains("value=\"teacher\" selected"));
    }

    #[test]
    fn modal_wraps_body() {
        let html = Modal::new("Add User", "/admin/users", "<form></form>").render().unwrap();
        assert!(html.contains("Add User"));
        assert!(html.contains("href=\"/admin/users\""));
        assert!(html.contains("<form></form>"));
    }

    #[test]
    fn colour_thresholds() {
        assert_eq!(grade_color(90.0), "text-green-600");
        assert_eq!(grade_color(85.0), "text-blue-600");
        assert_eq!(grade_color(70.0), "text-yellow-600");
        assert_eq!(grade_color(69.9), "text-red-600");
        assert_eq!(attendance_color(89.9), "text-yellow-600");
        assert_eq!(attendance_color(79.0), "text-red-600");
        assert_eq!(subject_color("Art"), "bg-pink-100 border-pink-500");
        assert_eq!(subject_color("Latin"), "bg-gray-100 border-gray-500");
    }
}
