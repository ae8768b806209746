mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use common::*;
use serde_json::{Value, json};

async fn user_id(app: &TestApp, admin: &str, email: &str) -> i64 {
    let (_, users) = app.get_json(&format!("/api/admin/users?q={email}"), admin).await;
    users[0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn stats_count_the_demo_school() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (status, stats) = app.get_json("/api/admin/stats", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 7);
    assert_eq!(stats["activeUsers"], 7);
    assert_eq!(stats["totalAnnouncements"], 1);
    assert_eq!(stats["pendingRequests"], 0);
}

#[tokio::test]
async fn activities_include_sign_ins() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (_, activities) = app.get_json("/api/admin/activities", &admin).await;
    let activities = activities.as_array().unwrap();
    assert!(!activities.is_empty());
    assert!(activities.len() <= 20);
    assert!(
        activities
            .iter()
            .any(|a| a["description"].as_str().unwrap().contains("signed in"))
    );
}

#[tokio::test]
async fn user_search_matches_name_or_email() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (_, users) = app.get_json("/api/admin/users?q=LEE", &admin).await;
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Jordan Lee"));

    let (_, users) = app.get_json("/api/admin/users?q=dchen", &admin).await;
    assert_eq!(users[0]["role"], "teacher");
}

#[tokio::test]
async fn created_users_get_a_temporary_password() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (status, created) = app
        .call(
            Method::POST,
            "/api/admin/users",
            &admin,
            json!({ "name": "Grace Van Dyke", "email": "grace@school.test", "role": "teacher", "status": "active" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"]["firstName"], "Grace");
    assert_eq!(created["user"]["lastName"], "Van Dyke");
    let password = created["temporaryPassword"].as_str().unwrap();

    let response = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "grace@school.test", "password": password }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admins_cannot_remove_themselves() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let me = user_id(&app, &admin, ADMIN).await;

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/users/{me}"), &admin, Value::Null)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot delete your own account");

    let (status, _) = app
        .call(Method::PUT, &format!("/api/admin/users/{me}"), &admin, json!({ "role": "student" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_users_cannot_sign_in() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let noah = user_id(&app, &admin, "noah@school.test").await;

    let (status, user) = app
        .call(Method::PUT, &format!("/api/admin/users/{noah}"), &admin, json!({ "status": "inactive" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["status"], "inactive");

    let response = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "noah@school.test", "password": "demo1234" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/admin/users/{noah}"), &admin, Value::Null)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, users) = app.get_json("/api/admin/users?q=noah", &admin).await;
    assert!(users.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reports_have_rows_and_chart_data() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    for report_type in ["users", "engagement", "performance", "analytics"] {
        let (status, report) = app
            .get_json(&format!("/api/admin/reports?type={report_type}&range=month"), &admin)
            .await;
        assert_eq!(status, StatusCode::OK, "{report_type}");
        assert!(!report["reports"].as_array().unwrap().is_empty());
        assert_eq!(
            report["chartData"]["labels"].as_array().unwrap().len(),
            report["chartData"]["values"].as_array().unwrap().len()
        );
    }
}

#[tokio::test]
async fn report_export_is_a_named_download() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let response = app
        .get("/api/admin/reports/export?type=users&range=week&format=csv", Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"report-users-week.csv\""
    );
    assert!(body_text(response).await.starts_with("metric,value,change\n"));

    let response = app
        .get("/api/admin/reports/export?type=users&range=week&format=pdf", Some(&admin))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn announcements_notify_their_audience() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/announcements",
            &admin,
            json!({ "title": "Picture day", "body": "Friday morning in the gym.", "audience": "parent" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = app.get_json("/api/admin/announcements", &admin).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let parent = app.login(PARENT).await;
    let (_, notifications) = app.get_json("/api/parent/notifications", &parent).await;
    assert!(
        notifications
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["title"] == "Picture day")
    );
}

#[tokio::test]
async fn users_page_approves_pending_teachers() {
    let app = TestApp::new().await;
    app.post_form(
        "/portal/auth/register",
        None,
        "firstName=Rosa&lastName=Diaz&email=rosa%40school.test&role=teacher&password=secret1&confirmPassword=secret1",
    )
    .await;
    let admin = app.login(ADMIN).await;
    let rosa = user_id(&app, &admin, "rosa@school.test").await;

    let page = app.get("/admin/users?q=rosa", Some(&admin)).await;
    let html = body_text(page).await;
    assert!(html.contains("Rosa Diaz"));
    assert!(html.contains("Approve"));

    let response = app
        .post_form(&format!("/admin/users/{rosa}/status"), Some(&admin), "status=active")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/admin/users?notice="));

    let (_, users) = app.get_json("/api/admin/users?q=rosa", &admin).await;
    assert_eq!(users[0]["status"], "active");
}

#[tokio::test]
async fn add_user_modal_reopens_on_errors() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    let page = app.get("/admin/users?modal=add-user", Some(&admin)).await;
    assert!(body_text(page).await.contains("Add New User"));

    let response = app
        .post_form("/admin/users", Some(&admin), "name=&email=bad&role=student&status=active")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Add New User"));
    assert!(html.contains("Invalid email format"));
}

#[tokio::test]
async fn admin_pages_render() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN).await;
    for (path, marker) in [
        ("/admin", "Total Users"),
        ("/admin/reports?type=performance&range=quarter", "Export CSV"),
        ("/admin/announcements", "Welcome back"),
    ] {
        let response = app.get(path, Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains(marker), "{path}");
    }
}
