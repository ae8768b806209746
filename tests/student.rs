mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::{Value, json};

async fn assignments(app: &TestApp, student: &str, query: &str) -> Vec<Value> {
    let (status, body) = app
        .get_json(&format!("/api/student/assignments{query}"), student)
        .await;
    assert_eq!(status, StatusCode::OK, "{query}");
    body.as_array().unwrap().clone()
}

fn titled<'a>(list: &'a [Value], title: &str) -> &'a Value {
    list.iter()
        .find(|a| a["title"] == title)
        .unwrap_or_else(|| panic!("no assignment titled {title}"))
}

#[tokio::test]
async fn info_reports_progress() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let (status, info) = app.get_json("/api/student/info", &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["email"], STUDENT);
    assert_eq!(info["totalAssignments"], 6);
    assert_eq!(info["completedAssignments"], 3);
}

#[tokio::test]
async fn unpublished_work_is_hidden() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let all = assignments(&app, &student, "").await;
    assert_eq!(all.len(), 6);
    assert!(all.iter().all(|a| a["title"] != "Unit Test Review"));
    assert_eq!(titled(&all, "Linear Equations Quiz")["status"], "graded");
    assert_eq!(titled(&all, "Cell Structure Lab")["status"], "late");
    assert_eq!(titled(&all, "Graphing Worksheet")["status"], "pending");
}

#[tokio::test]
async fn filters_combine_status_and_subject() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    assert_eq!(assignments(&app, &student, "?status=graded").await.len(), 2);
    assert_eq!(assignments(&app, &student, "?status=submitted").await.len(), 1);
    assert_eq!(assignments(&app, &student, "?status=pending").await.len(), 3);
    assert_eq!(assignments(&app, &student, "?subject=science").await.len(), 2);
    assert_eq!(
        assignments(&app, &student, "?status=pending&subject=math").await.len(),
        1
    );

    let (status, _) = app
        .get_json("/api/student/assignments?subject=astrology", &student)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submissions_can_be_replaced_until_graded() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let all = assignments(&app, &student, "").await;
    let worksheet = titled(&all, "Graphing Worksheet")["id"].as_i64().unwrap();
    let uri = format!("/api/student/assignments/{worksheet}/submit");

    let (status, _) = app.call(Method::POST, &uri, &student, json!({ "content": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = app.call(Method::POST, &uri, &student, json!({ "content": "Draft" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app.call(Method::POST, &uri, &student, json!({ "content": "Final" })).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["content"], "Final");

    let all = assignments(&app, &student, "").await;
    assert_eq!(titled(&all, "Graphing Worksheet")["status"], "submitted");
}

#[tokio::test]
async fn graded_work_cannot_be_replaced() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let all = assignments(&app, &student, "").await;
    let worksheet = titled(&all, "Graphing Worksheet")["id"].as_i64().unwrap();
    let uri = format!("/api/student/assignments/{worksheet}/submit");
    let (_, submitted) = app.call(Method::POST, &uri, &student, json!({ "content": "Answers" })).await;
    let id = submitted["id"].as_i64().unwrap();

    let teacher = app.login(TEACHER).await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/teacher/submissions/{id}/grade"),
            &teacher,
            json!({ "score": 9, "feedback": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::POST, &uri, &student, json!({ "content": "Rewrite" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let all = assignments(&app, &student, "").await;
    assert_eq!(titled(&all, "Graphing Worksheet")["status"], "graded");
    let (_, submissions) = app.get_json("/api/teacher/recent-submissions", &teacher).await;
    assert!(submissions.as_array().unwrap().iter().all(|s| s["id"] != id));
}

#[tokio::test]
async fn closed_or_foreign_assignments_refuse_work() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let all = assignments(&app, &student, "").await;
    let quiz = titled(&all, "Linear Equations Quiz")["id"].as_i64().unwrap();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/student/assignments/{quiz}/submit"),
            &student,
            json!({ "content": "Late answers" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/student/assignments/9999/submit",
            &student,
            json!({ "content": "Hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_lists_periods_in_order() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let (status, periods) = app.get_json("/api/student/schedule?day=monday", &student).await;
    assert_eq!(status, StatusCode::OK);
    let periods = periods.as_array().unwrap();
    assert_eq!(periods.len(), 3);
    assert!(periods[0]["timeSlot"].as_str().unwrap().starts_with("08:00"));
    assert!(periods[2]["timeSlot"].as_str().unwrap().starts_with("10:00"));
    assert_eq!(periods[2]["room"], "Lab 204");

    let (status, _) = app.get_json("/api/student/schedule?day=saturday", &student).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_form_redirects_with_a_notice() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    let all = assignments(&app, &student, "").await;
    let vocab = titled(&all, "Vocabulary Unit 4")["id"].as_i64().unwrap();

    let response = app
        .post_form(&format!("/student/assignments/{vocab}/submit"), Some(&student), "content=My+words")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/student/assignments?notice=Assignment%20submitted"
    );

    let response = app
        .post_form(&format!("/student/assignments/{vocab}/submit"), Some(&student), "content=")
        .await;
    assert!(location(&response).contains("Submission%20cannot%20be%20empty"));
}

#[tokio::test]
async fn student_pages_render() {
    let app = TestApp::new().await;
    let student = app.login(STUDENT).await;
    for (path, marker) in [
        ("/student", "My Progress"),
        ("/student/assignments?status=graded&subject=all", "Strong work on word problems"),
        ("/student/schedule?day=wednesday", "Life Science"),
    ] {
        let response = app.get(path, Some(&student)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains(marker), "{path}");
    }
}
