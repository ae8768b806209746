use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Duration, Local, NaiveDate, Utc};
use serde::Deserialize;

use super::{Notice, finish, wants_modal, with_notice};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::{AppError, HtmlError};
use crate::forms::parse_id_filter;
use crate::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignment, GradeSubmission, GradingView, RecentSubmission, Submission,
    TeacherAssignment, UpcomingTask,
};
use crate::models::attendance::{self, AttendanceEntry, AttendanceStatus, TakeAttendance};
use crate::models::class::{ClassDetail, ClassOverview, CreateClass, RosterEntry, SchoolClass, Subject};
use crate::models::schedule::MeetingDays;
use crate::models::user::User;
use crate::routes::api::teacher::{AddStudent, RECENT_SUBMISSION_LIMIT, enroll_by_email};
use crate::ui::PageContext;
use crate::ui::components::{
    Badge, Button, ButtonVariant, Input, Modal, Select, StatCard, attendance_color, grade_color,
};

async fn overviews(state: &AppState, teacher: &User) -> Result<Vec<ClassOverview>, AppError> {
    let mut overviews = Vec::new();
    for class in SchoolClass::for_teacher(&state.pool, teacher.id).await? {
        overviews.push(class.overview(&state.pool).await?);
    }
    Ok(overviews)
}

#[derive(Template, WebTemplate)]
#[template(path = "teacher/dashboard.html")]
pub struct DashboardPage {
    pub page: PageContext,
    pub stats: Vec<StatCard>,
    pub classes: Vec<ClassOverview>,
    pub tasks: Vec<(UpcomingTask, Badge)>,
    pub submissions: Vec<RecentSubmission>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Query(notice): Query<Notice>,
) -> Result<DashboardPage, HtmlError> {
    let classes = overviews(&state, &teacher).await?;
    let tasks: Vec<(UpcomingTask, Badge)> = Assignment::upcoming(&state.pool, teacher.id, Utc::now())
        .await?
        .into_iter()
        .map(|task| {
            let badge = task.priority.badge();
            (task, badge)
        })
        .collect();
    let submissions = Submission::recent_ungraded(&state.pool, teacher.id, RECENT_SUBMISSION_LIMIT).await?;
    let students: i64 = classes.iter().map(|c| c.students).sum();

    Ok(DashboardPage {
        page: PageContext::new(&teacher, "Teacher Dashboard", "/teacher").with_flash(notice.notice),
        stats: vec![
            StatCard::new("My Classes", classes.len(), "text-blue-600"),
            StatCard::new("Students", students, "text-green-600"),
            StatCard::new("Due Soon", tasks.len(), "text-yellow-600"),
            StatCard::new("To Grade", submissions.len(), "text-purple-600"),
        ],
        classes,
        tasks,
        submissions,
    })
}

/// The add-class modal's fields. Periods are picked as a meeting pattern
/// plus one start and end time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddClassInput {
    pub name: String,
    pub subject: Subject,
    pub grade_level: i64,
    pub room: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub days: MeetingDays,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl AddClassInput {
    fn to_class(&self) -> CreateClass {
        let (start, end) = (self.start_time.trim(), self.end_time.trim());
        let slots = if start.is_empty() && end.is_empty() {
            Vec::new()
        } else {
            self.days.slots(start, end)
        };
        let schedule = if self.schedule.trim().is_empty() && !slots.is_empty() {
            format!("{} {start}-{end}", self.days.label())
        } else {
            self.schedule.clone()
        };
        CreateClass {
            name: self.name.clone(),
            subject: self.subject,
            grade_level: self.grade_level,
            room: self.room.clone(),
            schedule,
            slots,
        }
    }
}

#[derive(Template)]
#[template(path = "teacher/add_class_form.html")]
pub struct AddClassForm {
    pub name: Input,
    pub subject: Select,
    pub grade_level: Input,
    pub room: Input,
    pub days: Select,
    pub start_time: Input,
    pub end_time: Input,
    pub schedule: Input,
    pub error: String,
    pub submit: Button,
}

impl AddClassForm {
    fn new(input: Option<&AddClassInput>, error: String) -> Self {
        AddClassForm {
            name: Input::text("Class Name", "name")
                .value(input.map(|i| i.name.clone()).unwrap_or_default())
                .placeholder("Algebra I")
                .required(),
            subject: Select::new(
                "Subject",
                "subject",
                Subject::ALL.map(|s| (s.key(), s.label())),
            )
            .selected(input.map(|i| i.subject.key()).unwrap_or("math"))
            .required(),
            grade_level: Input::new("Grade Level", "gradeLevel", "number")
                .value(input.map(|i| i.grade_level.to_string()).unwrap_or_default())
                .required(),
            room: Input::text("Room", "room")
                .value(input.map(|i| i.room.clone()).unwrap_or_default())
                .placeholder("204")
                .required(),
            days: Select::new(
                "Meets",
                "days",
                MeetingDays::ALL.map(|d| (d.key(), d.label())),
            )
            .selected(input.map(|i| i.days).unwrap_or_default().key()),
            start_time: Input::new("Starts", "startTime", "time")
                .value(input.map(|i| i.start_time.clone()).unwrap_or_default()),
            end_time: Input::new("Ends", "endTime", "time")
                .value(input.map(|i| i.end_time.clone()).unwrap_or_default()),
            schedule: Input::text("Schedule note", "schedule")
                .value(input.map(|i| i.schedule.clone()).unwrap_or_default())
                .placeholder("Mon/Wed/Fri 9:00-9:50"),
            error,
            submit: Button::submit("Create Class"),
        }
    }

    fn modal(self) -> Modal<AddClassForm> {
        Modal::new("Add New Class", "/teacher/classes", self)
    }
}

pub struct RosterRow {
    pub student: RosterEntry,
    pub attendance_color: &'static str,
    pub grade_color: &'static str,
}

/// The class picked on the classes page, with its roster and forms.
pub struct SelectedClass {
    pub detail: ClassDetail,
    pub roster: Vec<RosterRow>,
    pub email: Input,
    pub today: String,
    pub statuses: Vec<(&'static str, &'static str)>,
}

impl SelectedClass {
    fn new(detail: ClassDetail) -> Self {
        let roster = detail
            .student_list
            .iter()
            .cloned()
            .map(|student| RosterRow {
                attendance_color: attendance_color(student.attendance),
                grade_color: grade_color(student.performance),
                student,
            })
            .collect();
        SelectedClass {
            detail,
            roster,
            email: Input::new("Add student by email", "email", "email")
                .placeholder("student@school.test")
                .required(),
            today: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            statuses: AttendanceStatus::ALL
                .map(|s| (s.as_str(), s.label()))
                .to_vec(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "teacher/classes.html")]
pub struct ClassesPage {
    pub page: PageContext,
    pub classes: Vec<ClassOverview>,
    pub selected: Option<SelectedClass>,
    pub modal: Option<Modal<AddClassForm>>,
}

async fn classes_page(
    state: &AppState,
    teacher: &User,
    class_id: Option<i64>,
    flash: Option<String>,
    modal: Option<Modal<AddClassForm>>,
) -> Result<ClassesPage, AppError> {
    let selected = match class_id {
        Some(id) => {
            let class = SchoolClass::get_owned(&state.pool, id, teacher.id).await?;
            Some(SelectedClass::new(class.detail(&state.pool).await?))
        }
        None => None,
    };
    Ok(ClassesPage {
        page: PageContext::new(teacher, "My Classes", "/teacher/classes").with_flash(flash),
        classes: overviews(state, teacher).await?,
        selected,
        modal,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub class: Option<String>,
    pub modal: Option<String>,
    pub notice: Option<String>,
}

pub async fn classes(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<ClassesPage, HtmlError> {
    let class_id = parse_id_filter(query.class.as_deref())?;
    let modal = wants_modal(query.modal.as_deref(), "add-class").then(|| AddClassForm::new(None, String::new()).modal());
    Ok(classes_page(&state, &teacher, class_id, query.notice, modal).await?)
}

pub async fn create_class(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Form(input): Form<AddClassInput>,
) -> Result<Response, HtmlError> {
    match SchoolClass::create(&state.pool, &teacher, input.to_class()).await {
        Ok(class) => {
            let path = format!("/teacher/classes?class={}", class.id);
            Ok(with_notice(&path, "Class created").into_response())
        }
        Err(AppError::BadRequest(message)) => {
            let modal = AddClassForm::new(Some(&input), message).modal();
            Ok(classes_page(&state, &teacher, None, None, Some(modal))
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn add_student(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<AddStudent>,
) -> Result<Redirect, HtmlError> {
    let result = enroll_by_email(&state, &teacher, id, &form.email)
        .await
        .map(|student| format!("Added {} to the class", student.full_name()));
    finish(&format!("/teacher/classes?class={id}"), result)
}

/// Read the attendance form: a `date` field plus `status-{student}` and
/// optional `notes-{student}` fields per roster row.
pub fn parse_attendance_form(fields: &[(String, String)]) -> Result<TakeAttendance, AppError> {
    fn value<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
    let date = value(fields, "date")
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| AppError::BadRequest("Choose a valid date".to_string()))?;

    let mut records = Vec::new();
    for (key, status) in fields {
        let Some(id) = key.strip_prefix("status-") else {
            continue;
        };
        let student_id = id
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid student id: {id}")))?;
        records.push(AttendanceEntry {
            student_id,
            status: status.parse()?,
            notes: value(fields, &format!("notes-{student_id}")).unwrap_or_default().to_string(),
        });
    }
    Ok(TakeAttendance { date, records })
}

pub async fn take_attendance(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, HtmlError> {
    let result = async {
        let input = parse_attendance_form(&fields)?;
        let recorded = attendance::record_many(&state.pool, &teacher, id, input).await?;
        Ok::<_, AppError>(format!("Attendance saved for {recorded} students"))
    }
    .await;
    finish(&format!("/teacher/classes?class={id}"), result)
}

pub struct AssignmentRow {
    pub assignment: TeacherAssignment,
    pub badge: Badge,
    pub status: Select,
}

#[derive(Template)]
#[template(path = "teacher/create_assignment_form.html")]
pub struct CreateAssignmentForm {
    pub title: Input,
    pub description: String,
    pub due_date: Input,
    pub class: Select,
    pub points: Input,
    pub error: String,
    pub submit: Button,
}

impl CreateAssignmentForm {
    fn new(classes: &[ClassOverview], input: Option<&CreateAssignment>, error: String) -> Self {
        let default_due = (Local::now() + Duration::days(7))
            .date_naive()
            .and_hms_opt(23, 59, 0)
            .map(|d| d.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_default();
        AssignmentFormValues::from(input).into_form(classes, default_due, error)
    }

    fn modal(self) -> Modal<CreateAssignmentForm> {
        Modal::new("Create Assignment", "/teacher/assignments", self)
    }
}

/// What the create form shows: a previous submission or blanks.
struct AssignmentFormValues {
    title: String,
    description: String,
    due_date: Option<String>,
    class_id: Option<i64>,
    points: String,
}

impl From<Option<&CreateAssignment>> for AssignmentFormValues {
    fn from(input: Option<&CreateAssignment>) -> Self {
        match input {
            Some(i) => AssignmentFormValues {
                title: i.title.clone(),
                description: i.description.clone(),
                due_date: Some(i.due_date.clone()),
                class_id: Some(i.class_id),
                points: i.points.to_string(),
            },
            None => AssignmentFormValues {
                title: String::new(),
                description: String::new(),
                due_date: None,
                class_id: None,
                points: "100".to_string(),
            },
        }
    }
}

impl AssignmentFormValues {
    fn into_form(self, classes: &[ClassOverview], default_due: String, error: String) -> CreateAssignmentForm {
        let options = classes
            .iter()
            .map(|c| (c.class.id.to_string(), c.class.name.clone()));
        let mut class = Select::new("Class", "classId", options).required();
        if let Some(id) = self.class_id {
            class = class.selected(id.to_string());
        }
        CreateAssignmentForm {
            title: Input::text("Title", "title").value(self.title).required(),
            description: self.description,
            due_date: Input::new("Due Date", "dueDate", "datetime-local")
                .value(self.due_date.unwrap_or(default_due))
                .required(),
            class,
            points: Input::new("Points", "points", "number")
                .value(self.points)
                .required(),
            error,
            submit: Button::submit("Create Assignment").variant(ButtonVariant::Success),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "teacher/assignments.html")]
pub struct AssignmentsPage {
    pub page: PageContext,
    pub class_filter: Select,
    pub assignments: Vec<AssignmentRow>,
    pub has_classes: bool,
    pub modal: Option<Modal<CreateAssignmentForm>>,
}

async fn assignments_page(
    state: &AppState,
    teacher: &User,
    class_id: Option<i64>,
    flash: Option<String>,
    modal: impl FnOnce(&[ClassOverview]) -> Option<Modal<CreateAssignmentForm>>,
) -> Result<AssignmentsPage, AppError> {
    let classes = overviews(state, teacher).await?;
    let assignments = Assignment::for_teacher(&state.pool, teacher.id, class_id)
        .await?
        .into_iter()
        .map(|assignment| AssignmentRow {
            badge: assignment.status.badge(),
            status: Select::new(
                "",
                "status",
                AssignmentStatus::ALL.map(|s| (s.as_str(), s.label())),
            )
            .selected(assignment.status.as_str())
            .auto_submit(),
            assignment,
        })
        .collect();
    let options = std::iter::once(("all".to_string(), "All Classes".to_string()))
        .chain(classes.iter().map(|c| (c.class.id.to_string(), c.class.name.clone())));
    let selected = class_id.map(|id| id.to_string()).unwrap_or_else(|| "all".to_string());

    Ok(AssignmentsPage {
        page: PageContext::new(teacher, "Assignments", "/teacher/assignments").with_flash(flash),
        class_filter: Select::new("Class", "class", options)
            .selected(selected)
            .auto_submit(),
        assignments,
        has_classes: !classes.is_empty(),
        modal: modal(&classes),
    })
}

pub async fn assignments(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Query(query): Query<FilterQuery>,
) -> Result<AssignmentsPage, HtmlError> {
    let class_id = parse_id_filter(query.class.as_deref())?;
    let open = wants_modal(query.modal.as_deref(), "create");
    let page = assignments_page(&state, &teacher, class_id, query.notice, |classes| {
        open.then(|| CreateAssignmentForm::new(classes, None, String::new()).modal())
    })
    .await?;
    Ok(page)
}

pub async fn create_assignment(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Form(input): Form<CreateAssignment>,
) -> Result<Response, HtmlError> {
    match Assignment::create(&state.pool, &teacher, input.clone()).await {
        Ok(_) => Ok(with_notice("/teacher/assignments", "Assignment created").into_response()),
        Err(e @ (AppError::BadRequest(_) | AppError::NotFound(_))) => {
            let (_, message) = e.status_and_message();
            let page = assignments_page(&state, &teacher, None, None, |classes| {
                Some(CreateAssignmentForm::new(classes, Some(&input), message).modal())
            })
            .await?;
            Ok(page.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignmentStatusForm {
    pub status: AssignmentStatus,
}

pub async fn set_assignment_status(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<AssignmentStatusForm>,
) -> Result<Redirect, HtmlError> {
    let result = Assignment::update_status(&state.pool, id, teacher.id, form.status)
        .await
        .map(|a| format!("\"{}\" is now {}", a.title, a.status.label().to_lowercase()));
    finish("/teacher/assignments", result)
}

#[derive(Template, WebTemplate)]
#[template(path = "teacher/grade.html")]
pub struct GradePage {
    pub page: PageContext,
    pub submission: GradingView,
    pub score: String,
    pub feedback: String,
    pub error: String,
}

impl GradePage {
    fn new(teacher: &User, submission: GradingView, form: Option<&GradeSubmission>, error: String) -> Self {
        let score = form
            .map(|f| f.score)
            .or(submission.score)
            .map(|s| s.to_string())
            .unwrap_or_default();
        let feedback = form
            .map(|f| f.feedback.clone())
            .or_else(|| submission.feedback.clone())
            .unwrap_or_default();
        GradePage {
            page: PageContext::new(teacher, "Grade Submission", "/teacher/submissions"),
            submission,
            score,
            feedback,
            error,
        }
    }
}

pub async fn grade_page(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
) -> Result<GradePage, HtmlError> {
    let submission = Submission::grading_view(&state.pool, teacher.id, id).await?;
    Ok(GradePage::new(&teacher, submission, None, String::new()))
}

pub async fn grade(
    State(state): State<AppState>,
    teacher: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<GradeSubmission>,
) -> Result<Response, HtmlError> {
    match Submission::grade(&state.pool, &teacher, id, form.clone()).await {
        Ok(_) => Ok(with_notice("/teacher", "Submission graded").into_response()),
        Err(AppError::BadRequest(message)) => {
            let submission = Submission::grading_view(&state.pool, teacher.id, id).await?;
            Ok(GradePage::new(&teacher, submission, Some(&form), message).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
