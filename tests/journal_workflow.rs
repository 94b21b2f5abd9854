//! End-to-end journal flow through the HTTP surface: a curator keeps the
//! week's journal and the faculty office sees the accumulated hours.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{campus, wednesday, TestApp};
use serde_json::json;

#[tokio::test]
async fn curator_marks_and_dean_sees_the_hours() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "PHY").await;

    let (status, student) = app
        .post(
            "/curator/api/students",
            &campus.curator,
            json!({"full_name": "Ali Valiev", "region": "Sughd"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{student}");
    let student_id = student["id"].as_i64().unwrap();
    assert_eq!(student["student_code"], format!("STU{student_id:06}"));

    let (status, marked) = app
        .post(
            "/curator/api/journal/mark-day",
            &campus.curator,
            json!({"date": "2024-09-04", "records": [
                {"student_id": student_id, "nb_hours": 4, "comment": "late train"},
                {"student_id": 99999, "nb_hours": 2},
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{marked}");
    assert_eq!(marked["updated_count"], 1);

    let (status, week) = app.get("/curator/api/journal/week", &campus.curator).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["week_start"], "2024-09-02");
    assert_eq!(week["is_current_week"], true);
    let row = &week["students"][0];
    assert_eq!(row["total_absent_hours"], 4);
    assert_eq!(row["days"]["2024-09-04"]["nb_hours"], 4);
    assert_eq!(row["days"]["2024-09-04"]["status"], "absent");
    assert!(row["days"]["2024-09-03"].is_null());

    let (status, listing) = app.get("/dean/api/students", &campus.dean).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["students"][0]["total_absent_hours"], 4);

    let (status, history) = app
        .get(&format!("/dean/api/students/{student_id}/attendance"), &campus.dean)
        .await;
    assert_eq!(status, StatusCode::OK, "{history}");
}

#[tokio::test]
async fn past_weeks_are_read_only() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "CHM").await;
    let (_, student) = app
        .post("/curator/api/students", &campus.curator, json!({"full_name": "Zarina Karimova"}))
        .await;

    let (status, body) = app
        .post(
            "/curator/api/journal/mark",
            &campus.curator,
            json!({"student_id": student["id"], "date": "2024-08-28", "nb_hours": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["request_id"].is_string());

    let (status, _) = app
        .post(
            "/curator/api/journal/save-week",
            &campus.curator,
            json!({"week_start": "2024-08-26", "days": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get("/curator/api/journal/week?week_start=not-a-date", &campus.curator)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dates_at_the_calendar_edge_are_rejected() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "GEO").await;

    let (status, body) = app
        .get("/curator/api/journal/week?week_start=%2B262142-12-31", &campus.curator)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "week_start");

    let (status, _) = app
        .get("/dean/api/weekly-control?week_start=%2B262142-12-31", &campus.dean)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the service is still up
    let (status, _) = app.get("/curator/api/journal/week", &campus.curator).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn save_week_records_every_day_and_an_audit_entry() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "BIO").await;
    let (_, student) = app
        .post("/curator/api/students", &campus.curator, json!({"full_name": "Farrukh Nazarov"}))
        .await;
    let id = student["id"].clone();

    let (status, saved) = app
        .post(
            "/curator/api/journal/save-week",
            &campus.curator,
            json!({"week_start": "2024-09-04", "days": {
                "2024-09-02": [{"student_id": id, "nb_hours": 2}],
                "2024-09-03": [{"student_id": id, "nb_hours": 0}],
                "2024-09-09": [{"student_id": id, "nb_hours": 8}],
            }}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    assert_eq!(saved["week_start"], "2024-09-02");
    assert_eq!(saved["total_updated"], 2);

    let (_, journal) = app
        .get(&format!("/curator/api/journal/student/{}", id), &campus.curator)
        .await;
    assert_eq!(journal["total_absent_hours"], 2);
    assert_eq!(journal["records"].as_array().unwrap().len(), 2);

    let (_, log) = app.get("/admin/api/audit-log", &campus.admin).await;
    assert!(log
        .as_array()
        .unwrap()
        .iter()
        .any(|entry| entry["action"] == "WEEK_SAVED"));
}

#[tokio::test]
async fn exports_are_csv_attachments() {
    let app = TestApp::on(wednesday()).await;
    let campus = campus(&app, "MTH").await;
    app.post(
        "/curator/api/students",
        &campus.curator,
        json!({"full_name": "Malika Rahimova", "initial_nb_hours": 40}),
    )
    .await;

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/dean/api/export/nb")
            .header(header::COOKIE, &campus.dean)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=nb_2024-09-04.csv"
    );
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.lines().nth(1).unwrap().contains("Malika Rahimova"));
}
