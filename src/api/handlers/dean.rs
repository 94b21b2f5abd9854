//! `/dean` area: faculty management and analytics

use crate::api::extract::CurrentUser;
use crate::api::handlers::{faculty, profile, session};
use crate::application::faculty_analytics::{self as analytics, *};
use crate::application::AppState;
use crate::error::Result;
use axum::extract::{Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/stats/overview", get(overview))
        .route("/api/attendance", get(attendance_chart))
        .route("/api/alerts", get(alerts))
        .route("/api/weekly-stats", get(weekly_stats))
        .route("/api/daily-control", get(daily_control))
        .route("/api/weekly-control", get(weekly_control))
        .route("/api/at-risk", get(faculty::at_risk))
        .route("/api/nb-list", get(faculty::nb_list))
        .route("/api/audit-log", get(faculty::own_audit_log))
        .route("/api/groups", get(faculty::groups).post(faculty::create_group))
        .route(
            "/api/groups/{id}",
            put(faculty::update_group)
                .patch(faculty::update_group)
                .delete(faculty::delete_group),
        )
        .route("/api/groups/{id}/assign-curator", post(faculty::assign_curator))
        .route("/api/students", get(faculty::students).post(faculty::create_student))
        .route(
            "/api/students/{id}",
            get(faculty::student)
                .put(faculty::update_student)
                .delete(faculty::delete_student),
        )
        .route("/api/students/{id}/attendance", get(faculty::student_attendance))
        .route("/api/curators", get(faculty::curators).post(faculty::create_curator))
        .route(
            "/api/curators/{id}",
            put(faculty::update_curator)
                .patch(faculty::update_curator)
                .delete(faculty::delete_curator),
        )
        .route("/api/curators/{id}/reset-password", post(faculty::reset_curator_password))
        .route("/api/courses", get(faculty::courses))
        .route("/api/attendance/{id}/justify", post(faculty::justify))
        .route("/api/profile", get(profile::show).patch(profile::update))
        .route("/api/change-password", post(session::change_password_checked))
        .route("/api/export/students", get(faculty::export_students))
        .route("/api/export/nb", get(faculty::export_nb))
}

async fn stats(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<DeanStats>> {
    Ok(Json(analytics::dean_stats(&state, &actor).await?))
}

async fn overview(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<DeanOverview>> {
    Ok(Json(analytics::dean_overview(&state, &actor).await?))
}

async fn attendance_chart(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<ChartParams>,
) -> Result<Json<AttendanceChart>> {
    Ok(Json(analytics::attendance_chart(&state, &actor, params).await?))
}

async fn alerts(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<Alert>>> {
    Ok(Json(analytics::alerts(&state, &actor).await?))
}

async fn weekly_stats(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<WeekAbsence>>> {
    Ok(Json(analytics::weekly_absence(&state, &actor).await?))
}

async fn daily_control(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<DayParams>,
) -> Result<Json<DailyControl>> {
    Ok(Json(analytics::daily_control(&state, &actor, params).await?))
}

async fn weekly_control(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<WeekParams>,
) -> Result<Json<WeeklyControl>> {
    Ok(Json(analytics::weekly_control(&state, &actor, params).await?))
}
