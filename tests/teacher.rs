mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::*;
use serde_json::{Value, json};

async fn class_named(app: &TestApp, teacher: &str, name: &str) -> Value {
    let (_, classes) = app.get_json("/api/teacher/classes", teacher).await;
    classes
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .cloned()
        .unwrap_or_else(|| panic!("no class named {name}"))
}

#[tokio::test]
async fn classes_carry_roster_statistics() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (status, classes) = app.get_json("/api/teacher/classes", &teacher).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = classes
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Algebra I", "English 7"]);

    let algebra = &classes[0];
    assert_eq!(algebra["students"], 3);
    assert_eq!(algebra["subject"], "math");
    let id = algebra["id"].as_i64().unwrap();

    let (status, detail) = app.get_json(&format!("/api/teacher/classes/{id}"), &teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["studentList"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn other_teachers_classes_are_hidden() {
    let app = TestApp::new().await;
    let chen = app.login(OTHER_TEACHER).await;
    let science = class_named(&app, &chen, "Life Science").await["id"].as_i64().unwrap();

    let teacher = app.login(TEACHER).await;
    let (status, _) = app.get_json(&format!("/api/teacher/classes/{science}"), &teacher).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/teacher/classes/{science}/students"),
            &teacher,
            json!({ "email": STUDENT }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn new_classes_enroll_students_by_email() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (status, class) = app
        .call(
            Method::POST,
            "/api/teacher/classes",
            &teacher,
            json!({ "name": "Geometry", "subject": "math", "gradeLevel": 8, "room": "Room 102" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(class["students"], 0);
    let id = class["id"].as_i64().unwrap();
    let uri = format!("/api/teacher/classes/{id}/students");

    let (status, added) = app.call(Method::POST, &uri, &teacher, json!({ "email": STUDENT })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["student"]["email"], STUDENT);

    let (status, _) = app.call(Method::POST, &uri, &teacher, json!({ "email": STUDENT })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.call(Method::POST, &uri, &teacher, json!({ "email": PARENT })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .call(Method::POST, &uri, &teacher, json!({ "email": "ghost@school.test" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn periods_on(app: &TestApp, student: &str, day: &str) -> Vec<Value> {
    let (status, periods) = app
        .get_json(&format!("/api/student/schedule?day={day}"), student)
        .await;
    assert_eq!(status, StatusCode::OK, "{day}");
    periods.as_array().unwrap().clone()
}

#[tokio::test]
async fn new_class_periods_reach_the_student_schedule() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/teacher/classes",
            &teacher,
            json!({
                "name": "Geometry", "subject": "math", "gradeLevel": 8, "room": "Room 102",
                "slots": [{ "weekday": "monday", "startTime": "14:00", "endTime": "13:00" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, classes) = app.get_json("/api/teacher/classes", &teacher).await;
    assert_eq!(classes.as_array().unwrap().len(), 2);

    let (status, class) = app
        .call(
            Method::POST,
            "/api/teacher/classes",
            &teacher,
            json!({
                "name": "Geometry", "subject": "math", "gradeLevel": 8, "room": "Room 102",
                "slots": [
                    { "weekday": "monday", "startTime": "14:00", "endTime": "14:50" },
                    { "weekday": "wednesday", "startTime": "14:00", "endTime": "14:50" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = class["id"].as_i64().unwrap();
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/teacher/classes/{id}/students"),
            &teacher,
            json!({ "email": STUDENT }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let student = app.login(STUDENT).await;
    let monday = periods_on(&app, &student, "monday").await;
    let geometry = monday.iter().find(|p| p["className"] == "Geometry").unwrap();
    assert_eq!(geometry["timeSlot"], "14:00 - 14:50");
    assert_eq!(geometry["room"], "Room 102");
    assert_eq!(monday.last().unwrap()["className"], "Geometry");
    assert!(
        periods_on(&app, &student, "tuesday")
            .await
            .iter()
            .all(|p| p["className"] != "Geometry")
    );
}

#[tokio::test]
async fn add_class_form_sets_weekly_periods() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let response = app
        .post_form(
            "/teacher/classes",
            Some(&teacher),
            "name=Robotics&subject=science&gradeLevel=7&room=Lab+3&days=tue-thu&startTime=15%3A00&endTime=15%3A45&schedule=",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    let id = target
        .trim_start_matches("/teacher/classes?class=")
        .split('&')
        .next()
        .unwrap()
        .to_string();

    let (_, detail) = app.get_json(&format!("/api/teacher/classes/{id}"), &teacher).await;
    assert_eq!(detail["schedule"], "Tue/Thu 15:00-15:45");
    let response = app
        .post_form(&format!("/teacher/classes/{id}/students"), Some(&teacher), "email=student%40school.test")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let student = app.login(STUDENT).await;
    for (day, meets) in [("tuesday", true), ("thursday", true), ("monday", false)] {
        let periods = periods_on(&app, &student, day).await;
        assert_eq!(periods.iter().any(|p| p["className"] == "Robotics"), meets, "{day}");
    }
}

#[tokio::test]
async fn form_and_api_log_one_activity_each() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let response = app
        .post_form(
            "/teacher/classes",
            Some(&teacher),
            "name=Robotics&subject=science&gradeLevel=7&room=Lab+3&schedule=",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let (status, _) = app
        .call(
            Method::POST,
            "/api/teacher/classes",
            &teacher,
            json!({ "name": "Geometry", "subject": "math", "gradeLevel": 8, "room": "Room 102" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let admin = app.login(ADMIN).await;
    let (_, activities) = app.get_json("/api/admin/activities", &admin).await;
    let logged = |description: &str| {
        activities
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["description"] == description)
            .count()
    };
    assert_eq!(logged("Created class Robotics"), 1);
    assert_eq!(logged("Created class Geometry"), 1);
}

#[tokio::test]
async fn class_creation_checks_grade_level() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/teacher/classes",
            &teacher,
            json!({ "name": "Calculus", "subject": "math", "gradeLevel": 13, "room": "Room 9" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Grade level must be between 1 and 12");
}

#[tokio::test]
async fn absences_notify_parents() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let algebra = class_named(&app, &teacher, "Algebra I").await;
    let id = algebra["id"].as_i64().unwrap();
    let (_, detail) = app.get_json(&format!("/api/teacher/classes/{id}"), &teacher).await;
    let sam = detail["studentList"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "Sam Lee")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let date = (Utc::now() + Duration::days(1)).date_naive();
    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/teacher/classes/{id}/attendance"),
            &teacher,
            json!({ "date": date, "records": [{ "studentId": sam, "status": "absent", "notes": "Flu" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded"], 1);

    let parent = app.login(PARENT).await;
    let (_, notifications) = app.get_json("/api/parent/notifications", &parent).await;
    assert!(
        notifications
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["title"] == "Absence recorded")
    );

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/teacher/classes/{id}/attendance"),
            &teacher,
            json!({ "date": date, "records": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upcoming_tasks_are_prioritised() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (_, tasks) = app.get_json("/api/teacher/upcoming-tasks", &teacher).await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "Graphing Worksheet");
    assert_eq!(tasks[0]["priority"], "high");
    assert_eq!(tasks[1]["priority"], "medium");
}

#[tokio::test]
async fn assignments_filter_by_class_and_change_status() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let english = class_named(&app, &teacher, "English 7").await["id"].as_i64().unwrap();

    let (_, all) = app.get_json("/api/teacher/assignments?class=all", &teacher).await;
    assert_eq!(all.as_array().unwrap().len(), 5);
    let (_, only) = app
        .get_json(&format!("/api/teacher/assignments?class={english}"), &teacher)
        .await;
    let only = only.as_array().unwrap();
    assert_eq!(only.len(), 2);
    assert!(only.iter().all(|a| a["className"] == "English 7"));

    let due = (Utc::now() + Duration::days(3)).format("%Y-%m-%dT%H:%M").to_string();
    let (status, created) = app
        .call(
            Method::POST,
            "/api/teacher/assignments",
            &teacher,
            json!({ "title": "Poetry Response", "description": "One page", "dueDate": due, "classId": english, "points": 20 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .call(Method::PUT, &format!("/api/teacher/assignments/{id}"), &teacher, json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "closed");
}

#[tokio::test]
async fn grading_checks_score_range_and_clears_the_queue() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (_, queue) = app.get_json("/api/teacher/recent-submissions", &teacher).await;
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["studentName"], "Emma Lee");
    let id = queue[0]["id"].as_i64().unwrap();
    let uri = format!("/api/teacher/submissions/{id}/grade");

    let (status, body) = app
        .call(Method::POST, &uri, &teacher, json!({ "score": 51, "feedback": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Score must be between 0 and 50");

    let (status, graded) = app
        .call(Method::POST, &uri, &teacher, json!({ "score": 42.5, "feedback": "Nice voice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["score"], 42.5);

    let (_, queue) = app.get_json("/api/teacher/recent-submissions", &teacher).await;
    assert!(queue.as_array().unwrap().is_empty());

    let chen = app.login(OTHER_TEACHER).await;
    let (status, _) = app
        .call(Method::POST, &uri, &chen, json!({ "score": 10, "feedback": "" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attendance_form_saves_the_roster() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let algebra = class_named(&app, &teacher, "Algebra I").await["id"].as_i64().unwrap();
    let (_, detail) = app.get_json(&format!("/api/teacher/classes/{algebra}"), &teacher).await;
    let ids: Vec<i64> = detail["studentList"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();

    let page = app.get(&format!("/teacher/classes?class={algebra}"), Some(&teacher)).await;
    let html = body_text(page).await;
    assert!(html.contains(&format!("name=\"status-{}\"", ids[0])));

    let date = (Utc::now() + Duration::days(2)).date_naive();
    let mut form = format!("date={date}");
    for id in &ids {
        form.push_str(&format!("&status-{id}=late&notes-{id}=Bus"));
    }
    let response = app
        .post_form(&format!("/teacher/classes/{algebra}/attendance"), Some(&teacher), &form)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/teacher/classes?class={algebra}&notice=Attendance%20saved%20for%203%20students")
    );
}

#[tokio::test]
async fn add_class_modal_keeps_input_on_errors() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let response = app
        .post_form(
            "/teacher/classes",
            Some(&teacher),
            "name=Robotics&subject=science&gradeLevel=7&room=&schedule=",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Add New Class"));
    assert!(html.contains("Room is required"));
    assert!(html.contains("value=\"Robotics\""));

    let response = app
        .post_form(
            "/teacher/classes",
            Some(&teacher),
            "name=Robotics&subject=science&gradeLevel=7&room=Lab+3&schedule=",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/teacher/classes?class="));
}

#[tokio::test]
async fn grade_page_round_trip() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    let (_, queue) = app.get_json("/api/teacher/recent-submissions", &teacher).await;
    let id = queue[0]["id"].as_i64().unwrap();

    let page = app.get(&format!("/teacher/submissions/{id}/grade"), Some(&teacher)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_text(page).await.contains("Personal Narrative"));

    let response = app
        .post_form(&format!("/teacher/submissions/{id}/grade"), Some(&teacher), "score=-1&feedback=Hmm")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Score must be between 0 and 50"));
    assert!(html.contains("Hmm"));

    let response = app
        .post_form(&format!("/teacher/submissions/{id}/grade"), Some(&teacher), "score=45&feedback=Great")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/teacher?notice=Submission%20graded");
}

#[tokio::test]
async fn teacher_pages_render() {
    let app = TestApp::new().await;
    let teacher = app.login(TEACHER).await;
    for (path, marker) in [
        ("/teacher", "Grade Now"),
        ("/teacher/classes", "Algebra I"),
        ("/teacher/assignments?class=all", "Vocabulary Unit 4"),
        ("/teacher/assignments?modal=create", "Create Assignment"),
    ] {
        let response = app.get(path, Some(&teacher)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains(marker), "{path}");
    }
}
