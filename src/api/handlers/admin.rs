//! `/admin` area

use crate::api::extract::CurrentUser;
use crate::application::administration::{self as admin, *};
use crate::application::state::Ack;
use crate::application::AppState;
use crate::domain::*;
use crate::error::Result;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/faculties", get(faculties).post(create_faculty))
        .route("/api/faculties/{id}", put(update_faculty).delete(delete_faculty))
        .route("/api/users", get(users).post(create_user))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
        .route("/api/users/{id}/reset-password", post(reset_password))
        .route("/api/groups", get(groups))
        .route("/api/academic-years", get(academic_years).post(create_academic_year))
        .route("/api/academic-years/{id}/set-current", post(set_current_academic_year))
        .route("/api/weeks", get(weeks).post(create_week))
        .route("/api/weeks/{id}/set-current", post(set_current_week))
        .route("/api/settings", get(settings))
        .route("/api/settings/{key}", put(update_setting))
        .route("/api/courses", get(courses))
        .route("/api/audit-log", get(audit_log))
}

async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>> {
    Ok(Json(admin::stats(&state).await?))
}

async fn faculties(State(state): State<AppState>) -> Result<Json<Vec<FacultyRow>>> {
    Ok(Json(admin::faculties(&state).await?))
}

async fn create_faculty(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<FacultyForm>,
) -> Result<Json<Faculty>> {
    Ok(Json(admin::create_faculty(&state, &actor, form).await?))
}

async fn update_faculty(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<FacultyId>,
    Json(update): Json<FacultyUpdate>,
) -> Result<Json<Faculty>> {
    Ok(Json(admin::update_faculty(&state, &actor, id, update).await?))
}

async fn delete_faculty(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<FacultyId>,
) -> Result<Json<Ack>> {
    Ok(Json(admin::delete_faculty(&state, &actor, id).await?))
}

async fn users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<UserRow>>> {
    Ok(Json(admin::users(&state, params).await?))
}

async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<UserForm>,
) -> Result<Json<UserSummary>> {
    Ok(Json(admin::create_user(&state, &actor, form).await?.summary()))
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserSummary>> {
    Ok(Json(admin::update_user(&state, &actor, id, update).await?.summary()))
}

async fn reset_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
    form: Option<Json<ResetPasswordForm>>,
) -> Result<Json<PasswordReset>> {
    let form = form
        .map(|Json(form)| form)
        .unwrap_or(ResetPasswordForm { new_password: None });
    Ok(Json(admin::reset_password(&state, &actor, id, form).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<Ack>> {
    Ok(Json(admin::delete_user(&state, &actor, id).await?))
}

async fn groups(
    State(state): State<AppState>,
    Query(params): Query<GroupListParams>,
) -> Result<Json<Vec<AdminGroupRow>>> {
    Ok(Json(admin::groups(&state, params).await?))
}

async fn academic_years(State(state): State<AppState>) -> Result<Json<Vec<AcademicYear>>> {
    Ok(Json(admin::academic_years(&state).await?))
}

async fn create_academic_year(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<AcademicYearForm>,
) -> Result<Json<AcademicYear>> {
    Ok(Json(admin::create_academic_year(&state, &actor, form).await?))
}

async fn set_current_academic_year(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<Ack>> {
    Ok(Json(admin::set_current_academic_year(&state, &actor, id).await?))
}

async fn weeks(State(state): State<AppState>) -> Result<Json<Vec<Week>>> {
    Ok(Json(admin::weeks(&state).await?))
}

async fn create_week(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<WeekForm>,
) -> Result<Json<Week>> {
    Ok(Json(admin::create_week(&state, &actor, form).await?))
}

async fn set_current_week(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<WeekId>,
) -> Result<Json<Ack>> {
    Ok(Json(admin::set_current_week(&state, &actor, id).await?))
}

async fn settings(State(state): State<AppState>) -> Result<Json<Vec<SystemSetting>>> {
    Ok(Json(admin::settings(&state).await?))
}

async fn update_setting(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(key): Path<String>,
    Json(form): Json<SettingForm>,
) -> Result<Json<SystemSetting>> {
    Ok(Json(admin::update_setting(&state, &actor, &key, form).await?))
}

async fn courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    Ok(Json(admin::courses(&state).await?))
}

async fn audit_log(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditRow>>> {
    Ok(Json(admin::audit_log(&state, params).await?))
}
