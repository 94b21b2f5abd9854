//! `/rector` area, read-only university reports

use crate::api::handlers::profile;
use crate::application::reports::{self, *};
use crate::application::AppState;
use crate::error::Result;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/overview", get(overview))
        .route("/api/faculties", get(faculties))
        .route("/api/students", get(students))
        .route("/api/weekly-stats", get(weekly_stats))
        .route("/api/profile", get(profile::show).patch(profile::update))
}

async fn overview(State(state): State<AppState>) -> Result<Json<Overview>> {
    Ok(Json(reports::overview(&state).await?))
}

async fn faculties(State(state): State<AppState>) -> Result<Json<Vec<FacultySummary>>> {
    Ok(Json(reports::faculties(&state).await?))
}

async fn students(
    State(state): State<AppState>,
    Query(params): Query<StudentPageParams>,
) -> Result<Json<Page<StudentItem>>> {
    Ok(Json(reports::students(&state, params).await?))
}

async fn weekly_stats(State(state): State<AppState>) -> Result<Json<WeeklyStats>> {
    Ok(Json(reports::weekly_stats(&state).await?))
}
