//! `/vice-dean` area: group lifecycle, curators and monitoring

use crate::api::extract::CurrentUser;
use crate::api::handlers::{faculty, profile};
use crate::application::faculty_analytics::{self as analytics, DayParams, NoAttendanceReport, ViceDeanStats};
use crate::application::AppState;
use crate::error::Result;
use axum::extract::{Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/stats/overview", get(stats))
        .route("/api/monitoring/no-attendance", get(no_attendance))
        .route("/api/at-risk", get(faculty::at_risk))
        .route("/api/groups", get(faculty::groups).post(faculty::create_group))
        .route(
            "/api/groups/{id}",
            put(faculty::update_group).delete(faculty::delete_group),
        )
        .route("/api/groups/{id}/close", post(faculty::close_group))
        .route("/api/groups/{id}/reopen", post(faculty::reopen_group))
        .route("/api/groups/{id}/assign-curator", post(faculty::assign_curator))
        .route("/api/students", get(faculty::students))
        .route("/api/students/{id}", get(faculty::student))
        .route("/api/curators", get(faculty::curators).post(faculty::create_curator))
        .route(
            "/api/curators/{id}",
            get(faculty::curator)
                .put(faculty::update_curator)
                .delete(faculty::delete_curator),
        )
        .route("/api/curators/{id}/reset-password", post(faculty::reset_curator_password))
        .route("/api/supervisors", get(profile::supervisors))
        .route("/api/staff", get(faculty::staff))
        .route("/api/courses", get(faculty::courses))
        .route("/api/profile", get(profile::show).put(profile::update))
        .route("/api/export/students", get(faculty::export_students))
        .route("/api/export/nb", get(faculty::export_nb))
}

async fn stats(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<ViceDeanStats>> {
    Ok(Json(analytics::vice_dean_stats(&state, &actor).await?))
}

async fn no_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<DayParams>,
) -> Result<Json<NoAttendanceReport>> {
    Ok(Json(analytics::no_attendance(&state, &actor, params).await?))
}
