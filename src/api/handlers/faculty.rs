//! Faculty office endpoints shared by deans and vice deans

use crate::api::extract::CurrentUser;
use crate::api::headers::{content_types, CONTENT_DISPOSITION, CONTENT_TYPE};
use crate::application::administration::{self, AuditRow, PasswordReset};
use crate::application::export::{self, CsvExport, RowLabel};
use crate::application::faculty_office::{self as office, *};
use crate::application::state::Ack;
use crate::application::views::StudentRow;
use crate::application::AppState;
use crate::domain::*;
use crate::error::Result;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn groups(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<GroupRow>>> {
    Ok(Json(office::groups(&state, &actor).await?))
}

pub async fn create_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<GroupForm>,
) -> Result<Json<Group>> {
    Ok(Json(office::create_group(&state, &actor, form).await?))
}

pub async fn update_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<GroupId>,
    Json(update): Json<GroupUpdate>,
) -> Result<Json<Group>> {
    Ok(Json(office::update_group(&state, &actor, id, update).await?))
}

pub async fn assign_curator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<GroupId>,
    Json(assignment): Json<CuratorAssignment>,
) -> Result<Json<CuratorAssigned>> {
    Ok(Json(office::assign_curator(&state, &actor, id, assignment).await?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<Json<Ack>> {
    Ok(Json(office::delete_group(&state, &actor, id).await?))
}

pub async fn close_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<Json<GroupState>> {
    Ok(Json(office::close_group(&state, &actor, id).await?))
}

pub async fn reopen_group(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<Json<GroupState>> {
    Ok(Json(office::reopen_group(&state, &actor, id).await?))
}

pub async fn students(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<StudentListParams>,
) -> Result<Json<StudentListing>> {
    Ok(Json(office::students(&state, &actor, params).await?))
}

pub async fn student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<StudentDetail>> {
    Ok(Json(office::student(&state, &actor, id).await?))
}

pub async fn student_attendance(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<StudentAttendance>> {
    Ok(Json(office::student_attendance(&state, &actor, id).await?))
}

pub async fn create_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<StudentForm>,
) -> Result<Json<StudentSaved>> {
    Ok(Json(office::create_student(&state, &actor, form).await?))
}

pub async fn update_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<StudentId>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<StudentSaved>> {
    Ok(Json(office::update_student(&state, &actor, id, update).await?))
}

pub async fn delete_student(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<StudentId>,
) -> Result<Json<Ack>> {
    Ok(Json(office::delete_student(&state, &actor, id).await?))
}

pub async fn at_risk(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<RiskParams>,
) -> Result<Json<Vec<StudentRow>>> {
    Ok(Json(office::at_risk(&state, &actor, params).await?))
}

pub async fn nb_list(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<StudentRow>>> {
    Ok(Json(office::nb_list(&state, &actor).await?))
}

pub async fn justify(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<AttendanceId>,
    Json(form): Json<JustifyForm>,
) -> Result<Json<Ack>> {
    Ok(Json(office::justify(&state, &actor, id, form).await?))
}

pub async fn curators(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<CuratorRow>>> {
    Ok(Json(office::curators(&state, &actor).await?))
}

pub async fn curator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<CuratorDetail>> {
    Ok(Json(office::curator(&state, &actor, id).await?))
}

pub async fn create_curator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<CuratorForm>,
) -> Result<Json<CuratorSaved>> {
    Ok(Json(office::create_curator(&state, &actor, form).await?))
}

pub async fn update_curator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
    Json(update): Json<crate::application::profile::ProfileUpdate>,
) -> Result<Json<CuratorSaved>> {
    Ok(Json(office::update_curator(&state, &actor, id, update).await?))
}

pub async fn reset_curator_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<PasswordReset>> {
    Ok(Json(office::reset_curator_password(&state, &actor, id).await?))
}

pub async fn delete_curator(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<Ack>> {
    Ok(Json(office::delete_curator(&state, &actor, id).await?))
}

pub async fn staff(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<Json<Vec<StaffRow>>> {
    Ok(Json(office::staff(&state, &actor).await?))
}

pub async fn own_audit_log(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<OwnAuditParams>,
) -> Result<Json<Vec<AuditRow>>> {
    Ok(Json(office::own_audit_log(&state, &actor, params).await?))
}

pub async fn courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    Ok(Json(administration::courses(&state).await?))
}

impl IntoResponse for CsvExport {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            [
                (CONTENT_TYPE, content_types::CSV.to_string()),
                (CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

pub async fn export_students(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<CsvExport> {
    let label = row_label(&actor);
    export::students_csv(&state, &actor, label).await
}

pub async fn export_nb(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> Result<CsvExport> {
    let label = row_label(&actor);
    export::nb_csv(&state, &actor, label).await
}

fn row_label(actor: &User) -> RowLabel {
    if actor.role == UserRole::ViceDean {
        RowLabel::Index
    } else {
        RowLabel::Id
    }
}
