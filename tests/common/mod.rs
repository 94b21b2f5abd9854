//! Shared harness: the full router over an in-memory store and a fixed date

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use unitrack::api::build_router;
use unitrack::application::bootstrap;
use unitrack::config::Settings;
use unitrack::infrastructure::{FixedClock, MemoryStore};
use unitrack::AppState;

pub const PASSWORD: &str = "020304";

/// Wednesday of the first teaching week
pub fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 4).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn on(today: NaiveDate) -> Self {
        let mut settings = Settings::from_defaults().unwrap();
        settings.auth.bcrypt_cost = 4;
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::on(today)),
            &settings.auth,
        );
        bootstrap::seed(&state, &settings.bootstrap).await.unwrap();
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    /// Signs in and returns the `name=value` pair of the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .router
            .clone()
            .oneshot(json_request("POST", "/login", None, json!({"username": username, "password": password})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "login as {username}");
        session_cookie(&response)
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, Some(cookie), body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PUT", uri, Some(cookie), body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|raw| raw.split(';').next())
        .unwrap()
        .to_string()
}

/// A faculty with a dean, a curator and a running first-year group.
pub struct Campus {
    pub admin: String,
    pub faculty_id: i64,
    pub group_id: i64,
    pub dean: String,
    pub curator: String,
}

pub async fn campus(app: &TestApp, code: &str) -> Campus {
    let admin = app.login("admin", PASSWORD).await;
    let lower = code.to_lowercase();

    let (status, faculty) = app
        .post(
            "/admin/api/faculties",
            &admin,
            json!({"name": format!("Faculty {code}"), "code": lower}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{faculty}");
    let faculty_id = faculty["id"].as_i64().unwrap();

    let (status, _) = app
        .post(
            "/admin/api/academic-years",
            &admin,
            json!({"name": "2024-2025", "start_date": "2024-09-01", "end_date": "2025-06-30", "is_current": true}),
        )
        .await;
    // the second campus finds the year already there
    assert!(status == StatusCode::OK || status == StatusCode::BAD_REQUEST);

    for (username, role) in [(format!("dean_{lower}"), "dean"), (format!("cur_{lower}"), "curator")] {
        let (status, body) = app
            .post(
                "/admin/api/users",
                &admin,
                json!({"username": username, "full_name": format!("{role} of {code}"), "role": role, "faculty_id": faculty_id}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (_, users) = app.get(&format!("/admin/api/users?role=curator&faculty_id={faculty_id}"), &admin).await;
    let curator_id = users[0]["id"].as_i64().unwrap();

    let (_, courses) = app.get("/admin/api/courses", &admin).await;
    let first_year = courses
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["year"] == 1)
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let dean = app.login(&format!("dean_{lower}"), PASSWORD).await;
    let (status, group) = app
        .post(
            "/dean/api/groups",
            &dean,
            json!({"number": format!("{code}-101"), "shift": 1, "course_id": first_year, "curator_id": curator_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{group}");

    let curator = app.login(&format!("cur_{lower}"), PASSWORD).await;
    Campus {
        admin,
        faculty_id,
        group_id: group["id"].as_i64().unwrap(),
        dean,
        curator,
    }
}
