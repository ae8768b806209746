//! Shared view state for the server-rendered pages: the signed-in user's
//! sidebar navigation and the reusable components in [`components`].

pub mod components;

use crate::models::user::{Role, User};

#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// A filter link drawn as a rounded toggle.
#[derive(Debug, Clone)]
pub struct Pill {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Everything `layouts/dashboard.html` needs besides the page body.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub title: String,
    pub portal_name: &'static str,
    pub user_name: String,
    pub user_initial: String,
    pub role_label: &'static str,
    pub nav: Vec<NavLink>,
    pub flash: Option<String>,
}

fn nav_items(role: Role) -> &'static [(&'static str, &'static str)] {
    match role {
        Role::Admin => &[
            ("/admin", "Dashboard"),
            ("/admin/users", "Users"),
            ("/admin/reports", "Reports"),
            ("/admin/announcements", "Announcements"),
        ],
        Role::Parent => &[
            ("/parent", "Dashboard"),
            ("/parent/attendance", "Attendance"),
            ("/parent/performance", "Performance"),
        ],
        Role::Student => &[
            ("/student", "Dashboard"),
            ("/student/assignments", "Assignments"),
            ("/student/schedule", "Schedule"),
        ],
        Role::Teacher => &[
            ("/teacher", "Dashboard"),
            ("/teacher/classes", "Classes"),
            ("/teacher/assignments", "Assignments"),
        ],
    }
}

fn portal_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin Portal",
        Role::Parent => "Parent Portal",
        Role::Student => "Student Portal",
        Role::Teacher => "Teacher Portal",
    }
}

/// A nav entry is active on its own path; section links also stay active
/// on the pages beneath them.
fn is_active(href: &str, home: &str, current: &str) -> bool {
    if href == home {
        current == home
    } else {
        current == href || current.starts_with(&format!("{href}/"))
    }
}

impl PageContext {
    pub fn new(user: &User, title: impl Into<String>, current_path: &str) -> Self {
        let home = user.role.home_path();
        let nav = nav_items(user.role)
            .iter()
            .map(|&(href, label)| NavLink {
                href,
                label,
                active: is_active(href, home, current_path),
            })
            .collect();
        PageContext {
            title: title.into(),
            portal_name: portal_name(user.role),
            user_name: user.full_name(),
            user_initial: user.initial(),
            role_label: user.role.label(),
            nav,
            flash: None,
        }
    }

    /// Attach a one-off notice, usually from a `?notice=` redirect.
    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash.filter(|f| !f.trim().is_empty());
        self
    }
}
