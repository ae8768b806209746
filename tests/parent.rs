mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, Utc};
use common::*;
use serde_json::json;

async fn child_ids(app: &TestApp, parent: &str) -> Vec<i64> {
    let (_, children) = app.get_json("/api/parent/children", parent).await;
    children
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn children_have_overview_cards() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    let (status, children) = app.get_json("/api/parent/children", &parent).await;
    assert_eq!(status, StatusCode::OK);
    let children = children.as_array().unwrap();
    assert_eq!(children.len(), 2);
    for child in children {
        assert_eq!(child["grade"], 7);
        let attendance = child["attendance"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&attendance));
        assert!(child["currentGrade"].is_string());
    }
}

#[tokio::test]
async fn attendance_summary_matches_records() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    let today = Utc::now().date_naive();
    let (status, body) = app
        .get_json(
            &format!("/api/parent/attendance?childId=all&month={}&year={}", today.month(), today.year()),
            &parent,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let records = body["records"].as_array().unwrap();
    let summary = &body["summary"];
    let total: i64 = ["presentDays", "absentDays", "lateDays", "excusedDays"]
        .iter()
        .map(|k| summary[k].as_i64().unwrap())
        .sum();
    assert_eq!(total as usize, records.len());
    assert!(
        records
            .iter()
            .all(|r| r["studentName"] == "Sam Lee" || r["studentName"] == "Emma Lee")
    );
}

#[tokio::test]
async fn attendance_rejects_bad_months() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    let (status, _) = app.get_json("/api/parent/attendance?month=13&year=2026", &parent).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_families_are_off_limits() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (_, users) = app.get_json("/api/admin/users?q=noah", &admin).await;
    let noah = users[0]["id"].as_i64().unwrap();

    let parent = app.login(PARENT).await;
    let (status, _) = app
        .get_json(&format!("/api/parent/attendance?childId={noah}"), &parent)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .get_json(&format!("/api/parent/performance?childId={noah}"), &parent)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rank_needs_a_single_child() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    let (status, all) = app
        .get_json("/api/parent/performance?childId=all&period=year", &parent)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["summary"]["rank"], "N/A");

    let sam = child_ids(&app, &parent).await[0];
    let (_, one) = app
        .get_json(&format!("/api/parent/performance?childId={sam}&period=year"), &parent)
        .await;
    let subjects = one["subjects"].as_array().unwrap();
    assert_eq!(one["summary"]["totalSubjects"].as_u64().unwrap() as usize, subjects.len());
    assert!(subjects.iter().all(|s| s["student"] == subjects[0]["student"]));
}

#[tokio::test]
async fn marking_notifications_read() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    let (_, before) = app.get_json("/api/parent/notifications", &parent).await;
    assert!(before.as_array().unwrap().iter().any(|n| n["read"] == false));

    let response = app.post_form("/parent/notifications/read", Some(&parent), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, after) = app.get_json("/api/parent/notifications", &parent).await;
    assert!(after.as_array().unwrap().iter().all(|n| n["read"] == true));
}

#[tokio::test]
async fn parent_pages_render() {
    let app = TestApp::new().await;
    let parent = app.login(PARENT).await;
    for (path, marker) in [
        ("/parent", "Sam Lee"),
        ("/parent/attendance?childId=all", "Attendance Rate"),
        ("/parent/performance?period=current", "Class Rank"),
    ] {
        let response = app.get(path, Some(&parent)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains(marker), "{path}");
    }
}

#[tokio::test]
async fn dashboard_lists_grade_notifications() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (_, queue) = app.get_json("/api/teacher/recent-submissions", &teacher).await;
    let id = queue[0]["id"].as_i64().unwrap();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/teacher/submissions/{id}/grade"),
            &teacher,
            json!({ "score": 40, "feedback": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let parent = app.login(PARENT).await;
    let html = body_text(app.get("/parent", Some(&parent)).await).await;
    assert!(html.contains("Assignment graded"));
    assert!(html.contains("Emma Lee scored 40/50"));
}
