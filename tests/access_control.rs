//! Sessions, forced password changes and faculty isolation

mod common;

use axum::http::StatusCode;
use common::{campus, json_request, session_cookie, wednesday, TestApp, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn wrong_password_is_rejected_and_recorded() {
    let app = TestApp::on(wednesday()).await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({"username": "admin", "password": "999999"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    assert_eq!(body["message"], "invalid username or password");
}

#[tokio::test]
async fn new_accounts_must_change_their_password_first() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "LAW").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            None,
            json!({"username": "dean_law", "password": PASSWORD}),
        ))
        .await
        .unwrap();
    let old_cookie = session_cookie(&response);
    let (_, home) = app.get("/", &old_cookie).await;
    assert_eq!(home["redirect"], "/change-password");

    let (status, _) = app
        .post("/change-password", &old_cookie, json!({"new_password": "111111"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/change-password",
            Some(&old_cookie),
            json!({"new_password": "135790"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let new_cookie = session_cookie(&response);

    // the password change revoked every earlier session
    let (status, _) = app.get("/dean/api/stats", &old_cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/dean/api/stats", &campus.dean).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, home) = app.get("/", &new_cookie).await;
    assert_eq!(home["redirect"], "/dean/dashboard");
    let fresh = app.login("dean_law", "135790").await;
    let (status, _) = app.get("/dean/api/stats", &fresh).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn faculties_cannot_see_each_other() {
    let app = TestApp::on(wednesday()).await;
    let physics = campus(&app, "PHY").await;
    let history = campus(&app, "HIS").await;

    let (_, student) = app
        .post("/curator/api/students", &history.curator, json!({"full_name": "Rustam Saidov"}))
        .await;
    let student_id = student["id"].as_i64().unwrap();

    let (status, _) = app
        .get(&format!("/dean/api/students/{student_id}"), &physics.dean)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .get(&format!("/dean/api/students/{student_id}"), &history.dean)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put(
            &format!("/dean/api/groups/{}", history.group_id),
            &physics.dean,
            json!({"number": "stolen"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // curators only reach their own group's students
    let (status, _) = app
        .get(&format!("/curator/api/students/{student_id}"), &physics.curator)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_users_lose_their_sessions() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "ART").await;
    let (_, users) = app
        .get(&format!("/admin/api/users?role=dean&faculty_id={}", campus.faculty_id), &campus.admin)
        .await;
    let dean_id = users[0]["id"].as_i64().unwrap();

    let (status, _) = app.delete(&format!("/admin/api/users/{dean_id}"), &campus.admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/dean/api/stats", &campus.dean).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_faculty_names_cannot_be_reused() {
    let app = TestApp::on(wednesday()).await;
    let admin = app.login("admin", PASSWORD).await;
    let (status, faculty) = app
        .post("/admin/api/faculties", &admin, json!({"name": "Dup", "code": "dup"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .delete(&format!("/admin/api/faculties/{}", faculty["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/admin/api/faculties", &admin, json!({"name": "Dup", "code": "dup"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");
}
