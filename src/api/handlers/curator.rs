//! `/curator` area: the group journal

use crate::api::extract::CurrentUser;
use crate::api::handlers::profile;
use crate::application::faculty_analytics::WeekParams;
use crate::application::faculty_office::StudentSaved;
use crate::application::journal::{self, *};
use crate::application::state::Ack;
use crate::application::AppState;
use crate::domain::StudentId;
use crate::error::Result;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/students", get(students).post(create_student))
        .route(
            "/api/students/{id}",
            get(student).put(update_student).delete(delete_student),
        )
        .route("/api/journal/week", get(week))
        .route("/api/journal/mark-day", post(mark_day))
        .route("/api/journal/mark", post(mark))
        .route("/api/journal/save-week", post(save_week))
        .route("/api/journal/student/{id}", get(student_journal))
        .route("/api/nb-stats", get(nb_stats))
        .route("/api/profile", get(profile::show).put(profile::update))
        .route("/api/supervisors", get(profile::supervisors))
}

async fn stats(State(state): State<AppState>, CurrentUser(curator): CurrentUser) -> Result<Json<GroupStats>> {
    Ok(Json(journal::stats(&state, &curator).await?))
}

async fn students(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Query(params): Query<StudentSearch>,
) -> Result<Json<Vec<GroupStudent>>> {
    Ok(Json(journal::students(&state, &curator, params).await?))
}

async fn student(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<GroupStudent>> {
    Ok(Json(journal::student(&state, &curator, id).await?))
}

async fn create_student(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Json(form): Json<NewGroupStudent>,
) -> Result<Json<StudentSaved>> {
    Ok(Json(journal::create_student(&state, &curator, form).await?))
}

async fn update_student(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Path(id): Path<StudentId>,
    Json(update): Json<GroupStudentUpdate>,
) -> Result<Json<StudentSaved>> {
    Ok(Json(journal::update_student(&state, &curator, id, update).await?))
}

async fn delete_student(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<Ack>> {
    Ok(Json(journal::delete_student(&state, &curator, id).await?))
}

async fn week(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Query(params): Query<WeekParams>,
) -> Result<Json<JournalWeek>> {
    Ok(Json(journal::week(&state, &curator, params).await?))
}

async fn mark_day(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Json(form): Json<DayMarks>,
) -> Result<Json<DayMarked>> {
    Ok(Json(journal::mark_day(&state, &curator, form).await?))
}

async fn mark(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Json(form): Json<SingleMark>,
) -> Result<Json<Marked>> {
    Ok(Json(journal::mark(&state, &curator, form).await?))
}

async fn save_week(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Json(form): Json<WeekMarks>,
) -> Result<Json<WeekSaved>> {
    Ok(Json(journal::save_week(&state, &curator, form).await?))
}

async fn student_journal(
    State(state): State<AppState>,
    CurrentUser(curator): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<StudentJournal>> {
    Ok(Json(journal::student_journal(&state, &curator, id).await?))
}

async fn nb_stats(State(state): State<AppState>, CurrentUser(curator): CurrentUser) -> Result<Json<NbStats>> {
    Ok(Json(journal::nb_stats(&state, &curator).await?))
}
