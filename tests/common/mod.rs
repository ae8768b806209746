#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use portal::{AppState, SessionSettings, app, db, seed};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN: &str = "admin@school.test";
pub const TEACHER: &str = "teacher@school.test";
pub const OTHER_TEACHER: &str = "dchen@school.test";
pub const STUDENT: &str = "student@school.test";
pub const PARENT: &str = "parent@school.test";

/// A router over a freshly seeded in-memory school.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::memory_pool().await.unwrap();
        seed::seed_demo(&pool).await.unwrap();
        let state = AppState::new(pool, SessionSettings::default());
        TestApp {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign in through the API and return the `Cookie` header value.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "password": seed::DEMO_PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed for {email}");
        session_cookie(&response)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get_json(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        let response = self.get(uri, Some(cookie)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn call(&self, method: Method, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        let response = self.send(json_request(method, uri, Some(cookie), body)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }
}

pub fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` of the session cookie a response sets.
pub fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("no Set-Cookie header")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("no Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
