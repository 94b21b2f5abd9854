//! Faculty office: the dean's and vice dean's management of their faculty
//!
//! Every lookup is scoped to the caller's faculty. Anything outside it is
//! reported as missing, never as forbidden.

use crate::application::administration::{self, AuditRow, PasswordReset, ResetPasswordForm};
use crate::application::profile::ProfileUpdate;
use crate::application::state::{explicit, faculty_of, non_blank, Ack, AppState};
use crate::application::views::{AttendanceRow, Directory, GroupRef, StudentRow};
use crate::domain::audit::actions;
use crate::domain::calendar::parse_date;
use crate::domain::types::{FullName, GroupNumber, Shift, StudentCode, Username};
use crate::domain::*;
use crate::error::{Error, FieldContext, Result};
use crate::infrastructure::log_messages;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;
const OWN_AUDIT_LIMIT: usize = 100;

/// Groups, courses and curators of one faculty.
pub async fn faculty_directory(state: &AppState, faculty_id: FacultyId) -> Result<Directory> {
    let groups = state.store.groups(&GroupFilter::faculty(faculty_id)).await?;
    let courses = state.store.courses().await?;
    let curators = state
        .store
        .users(&UserFilter::role(UserRole::Curator).in_faculty(faculty_id))
        .await?;
    Ok(Directory::new(groups, courses, curators))
}

async fn scoped_group(state: &AppState, faculty_id: FacultyId, id: GroupId) -> Result<Group> {
    state
        .store
        .group(id)
        .await?
        .filter(|g| g.faculty_id == faculty_id)
        .ok_or_else(|| Error::not_found("group"))
}

async fn scoped_student(state: &AppState, faculty_id: FacultyId, id: StudentId) -> Result<Student> {
    state
        .store
        .student(id)
        .await?
        .filter(|s| s.faculty_id == faculty_id)
        .ok_or_else(|| Error::not_found("student"))
}

async fn scoped_curator(state: &AppState, faculty_id: FacultyId, id: UserId) -> Result<User> {
    state
        .store
        .user(id)
        .await?
        .filter(|u| u.role == UserRole::Curator && u.faculty_id == Some(faculty_id))
        .ok_or_else(|| Error::not_found("curator"))
}

// ---------------------------------------------------------------------------
// Groups

#[derive(Debug, Clone, Serialize)]
pub struct GroupRow {
    pub id: GroupId,
    pub number: String,
    pub shift: Shift,
    pub course_id: CourseId,
    pub course_year: Option<i32>,
    pub academic_year_id: AcademicYearId,
    pub curator_id: Option<UserId>,
    pub curator_name: Option<String>,
    pub curator_username: Option<String>,
    pub curator_phone: Option<String>,
    pub total_students: usize,
    pub is_active: bool,
    pub is_closed: bool,
    pub attendance_today: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn groups(state: &AppState, actor: &User) -> Result<Vec<GroupRow>> {
    let faculty_id = faculty_of(actor)?;
    let directory = faculty_directory(state, faculty_id).await?;
    let students = state.store.students(&StudentQuery::in_faculty(faculty_id)).await?;
    let today = state.today();
    let marked_today: HashSet<GroupId> = state
        .store
        .lessons(&directory.group_ids(), today, today)
        .await?
        .into_iter()
        .map(|l| l.group_id)
        .collect();

    Ok(directory
        .groups
        .iter()
        .map(|g| {
            let curator = directory.curator(g);
            GroupRow {
                id: g.id,
                number: g.number.clone(),
                shift: g.shift,
                course_id: g.course_id,
                course_year: directory.course_year(g),
                academic_year_id: g.academic_year_id,
                curator_id: g.curator_id,
                curator_name: curator.map(|c| c.full_name.clone()),
                curator_username: curator.map(|c| c.username.clone()),
                curator_phone: curator.and_then(|c| c.phone.clone()),
                total_students: students.iter().filter(|s| s.group_id == g.id).count(),
                is_active: g.is_active,
                is_closed: g.is_closed,
                attendance_today: marked_today.contains(&g.id),
                created_at: g.created_at,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupForm {
    pub number: String,
    #[serde(default = "first_shift")]
    pub shift: i16,
    pub course_id: CourseId,
    pub curator_id: Option<UserId>,
}

fn first_shift() -> i16 {
    1
}

/// Absent fields stay untouched; `curator_id: null` unassigns the curator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    pub number: Option<String>,
    pub shift: Option<i16>,
    pub course_id: Option<CourseId>,
    #[serde(default, deserialize_with = "explicit")]
    pub curator_id: Option<Option<UserId>>,
    pub is_active: Option<bool>,
}

async fn check_number(
    state: &AppState,
    faculty_id: FacultyId,
    number: &GroupNumber,
    except: Option<GroupId>,
) -> Result<()> {
    let wanted: &str = number.as_ref();
    let taken = state
        .store
        .groups(&GroupFilter::faculty(faculty_id))
        .await?
        .iter()
        .any(|g| g.number == wanted && Some(g.id) != except);
    if taken {
        return Err(Error::conflict(format!("group {number} already exists")));
    }
    Ok(())
}

async fn check_course(state: &AppState, course_id: CourseId) -> Result<()> {
    if state.store.courses().await?.iter().any(|c| c.id == course_id) {
        Ok(())
    } else {
        Err(Error::invalid_input("course_id", "course does not exist"))
    }
}

async fn check_curator(state: &AppState, faculty_id: FacultyId, curator_id: Option<UserId>) -> Result<()> {
    if let Some(id) = curator_id {
        scoped_curator(state, faculty_id, id)
            .await
            .map_err(|_| Error::invalid_input("curator_id", "not a curator of this faculty"))?;
    }
    Ok(())
}

/// The current academic year, or the newest one when none is marked.
async fn working_year(state: &AppState) -> Result<AcademicYear> {
    let years = state.store.academic_years().await?;
    years
        .iter()
        .find(|y| y.is_current)
        .or_else(|| years.first())
        .cloned()
        .ok_or_else(|| Error::validation("no academic year has been created"))
}

#[instrument(skip(state, actor, form), fields(actor = %actor.id, number = %form.number))]
pub async fn create_group(state: &AppState, actor: &User, form: GroupForm) -> Result<Group> {
    let faculty_id = faculty_of(actor)?;
    let number = GroupNumber::try_new(form.number).field("number")?;
    let shift = Shift::try_from(form.shift).field("shift")?;
    check_number(state, faculty_id, &number, None).await?;
    check_course(state, form.course_id).await?;
    check_curator(state, faculty_id, form.curator_id).await?;
    let year = working_year(state).await?;

    let group = state
        .store
        .insert_group(NewGroup {
            number,
            shift,
            course_id: form.course_id,
            academic_year_id: year.id,
            faculty_id,
            curator_id: form.curator_id,
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::GROUP_CREATED, "groups", Some(group.id.into_inner()))
                .describe(group.number.clone()),
        )
        .await;
    info!(group_id = %group.id, "group created");
    Ok(group)
}

pub async fn update_group(
    state: &AppState,
    actor: &User,
    id: GroupId,
    update: GroupUpdate,
) -> Result<Group> {
    let faculty_id = faculty_of(actor)?;
    let mut group = scoped_group(state, faculty_id, id).await?;
    group.ensure_open()?;

    if let Some(number) = update.number {
        let number = GroupNumber::try_new(number).field("number")?;
        check_number(state, faculty_id, &number, Some(id)).await?;
        group.number = number.into_inner();
    }
    if let Some(shift) = update.shift {
        group.shift = Shift::try_from(shift).field("shift")?;
    }
    if let Some(course_id) = update.course_id {
        check_course(state, course_id).await?;
        group.course_id = course_id;
    }
    if let Some(is_active) = update.is_active {
        group.is_active = is_active;
    }
    if let Some(curator_id) = update.curator_id {
        check_curator(state, faculty_id, curator_id).await?;
        group.assign_curator(curator_id)?;
    }
    state.store.update_group(&group).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::GROUP_UPDATED, "groups", Some(id.into_inner()))
                .describe(group.number.clone()),
        )
        .await;
    Ok(group)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CuratorAssignment {
    pub curator_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratorAssigned {
    pub ok: bool,
    pub group_id: GroupId,
    pub curator_id: Option<UserId>,
    pub is_active: bool,
}

pub async fn assign_curator(
    state: &AppState,
    actor: &User,
    id: GroupId,
    assignment: CuratorAssignment,
) -> Result<CuratorAssigned> {
    let faculty_id = faculty_of(actor)?;
    let mut group = scoped_group(state, faculty_id, id).await?;
    check_curator(state, faculty_id, assignment.curator_id).await?;
    group.assign_curator(assignment.curator_id)?;
    state.store.update_group(&group).await?;

    let action = if assignment.curator_id.is_some() {
        actions::CURATOR_ASSIGNED
    } else {
        actions::CURATOR_REMOVED
    };
    state
        .audit(
            NewAuditEntry::new(actor.id, action, "groups", Some(id.into_inner()))
                .describe(group.number.clone()),
        )
        .await;
    Ok(CuratorAssigned {
        ok: true,
        group_id: group.id,
        curator_id: group.curator_id,
        is_active: group.is_active,
    })
}

pub async fn delete_group(state: &AppState, actor: &User, id: GroupId) -> Result<Ack> {
    let faculty_id = faculty_of(actor)?;
    let mut group = scoped_group(state, faculty_id, id).await?;
    group.is_deleted = true;
    state.store.update_group(&group).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::GROUP_DELETED, "groups", Some(id.into_inner()))
                .describe(group.number),
        )
        .await;
    Ok(Ack::OK)
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupState {
    pub ok: bool,
    pub group_id: GroupId,
    pub number: String,
    pub is_closed: bool,
}

pub async fn close_group(state: &AppState, actor: &User, id: GroupId) -> Result<GroupState> {
    change_group_state(state, actor, id, true).await
}

pub async fn reopen_group(state: &AppState, actor: &User, id: GroupId) -> Result<GroupState> {
    change_group_state(state, actor, id, false).await
}

async fn change_group_state(
    state: &AppState,
    actor: &User,
    id: GroupId,
    close: bool,
) -> Result<GroupState> {
    let faculty_id = faculty_of(actor)?;
    let mut group = scoped_group(state, faculty_id, id).await?;
    let action = if close {
        group.close()?;
        actions::GROUP_CLOSED
    } else {
        group.reopen()?;
        actions::GROUP_REOPENED
    };
    state.store.update_group(&group).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, action, "groups", Some(id.into_inner()))
                .describe(group.number.clone()),
        )
        .await;
    Ok(GroupState {
        ok: true,
        group_id: group.id,
        number: group.number,
        is_closed: group.is_closed,
    })
}

// ---------------------------------------------------------------------------
// Students

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentListParams {
    pub group_id: Option<GroupId>,
    pub search: Option<String>,
    #[serde(alias = "course")]
    pub course_year: Option<i32>,
    pub high_nb: Option<bool>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentListing {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub nb_limit: i32,
    pub students: Vec<StudentRow>,
}

/// Students of the faculty matching the filters, one page at a time.
pub async fn students(
    state: &AppState,
    actor: &User,
    params: StudentListParams,
) -> Result<StudentListing> {
    let faculty_id = faculty_of(actor)?;
    let directory = faculty_directory(state, faculty_id).await?;
    let nb_limit = state.nb_limit().await?;

    let mut query = StudentQuery::in_faculty(faculty_id)
        .search(params.search.as_deref())
        .birth_place(params.birth_place.as_deref())
        .region(params.region.as_deref());
    if let Some(group_id) = params.group_id {
        query.group_ids = Some(vec![group_id]);
    }
    if params.high_nb.unwrap_or(false) {
        query.min_absent_hours = Some(nb_limit);
    }
    let mut found = state.store.students(&query).await?;
    if let Some(year) = params.course_year {
        found.retain(|s| {
            directory
                .group(s.group_id)
                .and_then(|g| directory.course_year(g))
                == Some(year)
        });
    }

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = found.len();
    let students = found
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|s| directory.student_row(s, nb_limit))
        .collect();
    Ok(StudentListing {
        total,
        page,
        page_size,
        nb_limit,
        students,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub row: StudentRow,
    pub group_shift: Option<Shift>,
    pub faculty_id: FacultyId,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
    pub nb_limit: i32,
    /// Absences only, newest first
    pub nb_history: Vec<AttendanceRow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub async fn student(state: &AppState, actor: &User, id: StudentId) -> Result<StudentDetail> {
    let faculty_id = faculty_of(actor)?;
    let student = scoped_student(state, faculty_id, id).await?;
    let directory = faculty_directory(state, faculty_id).await?;
    let nb_limit = state.nb_limit().await?;
    let history = state
        .store
        .attendance(&AttendanceQuery::for_student(id).absent_only())
        .await?;

    Ok(StudentDetail {
        row: directory.student_row(&student, nb_limit),
        group_shift: directory.group(student.group_id).map(|g| g.shift),
        faculty_id: student.faculty_id,
        study_start: student.study_start,
        expected_graduation: student.expected_graduation,
        nb_limit,
        nb_history: history.iter().map(AttendanceRow::from).collect(),
        created_at: student.created_at,
        updated_at: student.updated_at,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendance {
    pub student_id: StudentId,
    pub full_name: String,
    pub total_absent_hours: i32,
    pub records: Vec<AttendanceRow>,
}

/// Every journal entry of a student, newest first.
pub async fn student_attendance(
    state: &AppState,
    actor: &User,
    id: StudentId,
) -> Result<StudentAttendance> {
    let faculty_id = faculty_of(actor)?;
    let student = scoped_student(state, faculty_id, id).await?;
    let records = state.store.attendance(&AttendanceQuery::for_student(id)).await?;
    Ok(StudentAttendance {
        student_id: student.id,
        full_name: student.full_name,
        total_absent_hours: student.total_absent_hours,
        records: records.iter().map(AttendanceRow::from).collect(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentForm {
    pub full_name: String,
    pub group_id: GroupId,
    /// Generated from the id when empty
    pub student_code: Option<String>,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub group_id: Option<GroupId>,
    pub student_code: Option<String>,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSaved {
    pub id: StudentId,
    pub full_name: String,
    pub student_code: String,
}

impl From<&Student> for StudentSaved {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            full_name: student.full_name.clone(),
            student_code: student.student_code.clone(),
        }
    }
}

async fn group_in_faculty(state: &AppState, faculty_id: FacultyId, id: GroupId) -> Result<Group> {
    scoped_group(state, faculty_id, id)
        .await
        .map_err(|_| Error::invalid_input("group_id", "group does not belong to this faculty"))
}

#[instrument(skip(state, actor, form), fields(actor = %actor.id, group_id = %form.group_id))]
pub async fn create_student(state: &AppState, actor: &User, form: StudentForm) -> Result<StudentSaved> {
    let faculty_id = faculty_of(actor)?;
    let full_name = FullName::try_new(form.full_name).field("full_name")?;
    let group = group_in_faculty(state, faculty_id, form.group_id).await?;
    let student_code = non_blank(form.student_code)
        .map(|code| StudentCode::try_new(code).field("student_code"))
        .transpose()?;

    let student = state
        .store
        .insert_student(NewStudent {
            student_code,
            full_name,
            faculty_id,
            group_id: group.id,
            birth_year: form.birth_year,
            birth_place: non_blank(form.birth_place),
            region: non_blank(form.region),
            parent_phone: non_blank(form.parent_phone),
            study_start: form.study_start,
            expected_graduation: form.expected_graduation,
            total_absent_hours: 0,
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::STUDENT_CREATED, "students", Some(student.id.into_inner()))
                .describe(student.full_name.clone()),
        )
        .await;
    Ok(StudentSaved::from(&student))
}

pub async fn update_student(
    state: &AppState,
    actor: &User,
    id: StudentId,
    update: StudentUpdate,
) -> Result<StudentSaved> {
    let faculty_id = faculty_of(actor)?;
    let mut student = scoped_student(state, faculty_id, id).await?;
    if let Some(full_name) = update.full_name {
        student.full_name = FullName::try_new(full_name).field("full_name")?.into_inner();
    }
    if let Some(group_id) = update.group_id {
        student.group_id = group_in_faculty(state, faculty_id, group_id).await?.id;
    }
    if let Some(code) = non_blank(update.student_code) {
        student.student_code = StudentCode::try_new(code).field("student_code")?.into_inner();
    }
    if update.birth_year.is_some() {
        student.birth_year = update.birth_year;
    }
    if update.birth_place.is_some() {
        student.birth_place = non_blank(update.birth_place);
    }
    if update.region.is_some() {
        student.region = non_blank(update.region);
    }
    if update.parent_phone.is_some() {
        student.parent_phone = non_blank(update.parent_phone);
    }
    if update.study_start.is_some() {
        student.study_start = update.study_start;
    }
    if update.expected_graduation.is_some() {
        student.expected_graduation = update.expected_graduation;
    }
    state.store.update_student(&student).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::STUDENT_UPDATED, "students", Some(id.into_inner()))
                .describe(student.full_name.clone()),
        )
        .await;
    Ok(StudentSaved::from(&student))
}

pub async fn delete_student(state: &AppState, actor: &User, id: StudentId) -> Result<Ack> {
    let faculty_id = faculty_of(actor)?;
    let mut student = scoped_student(state, faculty_id, id).await?;
    student.is_deleted = true;
    state.store.update_student(&student).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::STUDENT_DELETED, "students", Some(id.into_inner()))
                .describe(student.full_name),
        )
        .await;
    Ok(Ack::OK)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskParams {
    pub group_id: Option<GroupId>,
    #[serde(alias = "course")]
    pub course_year: Option<i32>,
}

/// Students at or above the high-risk limit, most absences first.
pub async fn at_risk(state: &AppState, actor: &User, params: RiskParams) -> Result<Vec<StudentRow>> {
    let faculty_id = faculty_of(actor)?;
    let directory = faculty_directory(state, faculty_id).await?;
    let nb_limit = state.nb_limit().await?;
    let mut query = StudentQuery {
        min_absent_hours: Some(nb_limit),
        ..StudentQuery::in_faculty(faculty_id)
    };
    if let Some(group_id) = params.group_id {
        query.group_ids = Some(vec![group_id]);
    }
    let mut rows: Vec<StudentRow> = state
        .store
        .students(&query)
        .await?
        .iter()
        .map(|s| directory.student_row(s, nb_limit))
        .filter(|row| params.course_year.is_none_or(|year| row.course_year == Some(year)))
        .collect();
    rows.sort_by(|a, b| b.total_absent_hours.cmp(&a.total_absent_hours));
    Ok(rows)
}

pub async fn nb_list(state: &AppState, actor: &User) -> Result<Vec<StudentRow>> {
    at_risk(state, actor, RiskParams::default()).await
}

#[derive(Debug, Clone, Deserialize)]
pub struct JustifyForm {
    #[serde(default = "reasoned")]
    pub is_reasoned: bool,
    pub reason_text: Option<String>,
}

fn reasoned() -> bool {
    true
}

/// Marks an absence as excused (or not) with a reason.
pub async fn justify(
    state: &AppState,
    actor: &User,
    id: AttendanceId,
    form: JustifyForm,
) -> Result<Ack> {
    let faculty_id = faculty_of(actor)?;
    let record = state
        .store
        .attendance_record(id)
        .await?
        .ok_or_else(|| Error::not_found("attendance record"))?;
    scoped_group(state, faculty_id, record.group_id)
        .await
        .map_err(|_| Error::not_found("attendance record"))?;

    let justification = Justification {
        is_reasoned: form.is_reasoned,
        reason_text: non_blank(form.reason_text),
        reasoned_by: actor.id,
    };
    if !state.store.justify_attendance(id, justification).await? {
        return Err(Error::not_found("attendance record"));
    }
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::ATTENDANCE_JUSTIFIED, "attendance", Some(id.into_inner()))
                .describe(format!("{} {}", record.lesson_date, record.nb_hours)),
        )
        .await;
    info!(attendance_id = %id, is_reasoned = form.is_reasoned, "{}", log_messages::journal::ABSENCE_JUSTIFIED);
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Curators

#[derive(Debug, Clone, Serialize)]
pub struct CuratorRow {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
    pub group: Option<GroupRef>,
    pub group_number: Option<String>,
    pub force_password_change: bool,
    pub created_at: DateTime<Utc>,
}

impl CuratorRow {
    fn new(user: &User, group: Option<GroupRef>) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            department: user.department.clone(),
            birth_year: user.birth_year,
            group_number: group.as_ref().map(|g| g.number.clone()),
            group,
            force_password_change: user.force_password_change,
            created_at: user.created_at,
        }
    }
}

/// Curators of the faculty with the first active group each one leads.
pub async fn curators(state: &AppState, actor: &User) -> Result<Vec<CuratorRow>> {
    let faculty_id = faculty_of(actor)?;
    let people = state
        .store
        .users(&UserFilter::role(UserRole::Curator).in_faculty(faculty_id))
        .await?;
    let groups = state.store.groups(&GroupFilter::default()).await?;
    Ok(people
        .iter()
        .map(|c| {
            let group = groups
                .iter()
                .find(|g| g.curator_id == Some(c.id) && g.is_active)
                .map(GroupRef::from);
            CuratorRow::new(c, group)
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratorGroup {
    pub id: GroupId,
    pub number: String,
    pub shift: Shift,
    pub course_year: Option<i32>,
    pub is_active: bool,
    pub is_closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratorDetail {
    #[serde(flatten)]
    pub row: CuratorRow,
    pub groups: Vec<CuratorGroup>,
}

pub async fn curator(state: &AppState, actor: &User, id: UserId) -> Result<CuratorDetail> {
    let faculty_id = faculty_of(actor)?;
    let user = scoped_curator(state, faculty_id, id).await?;
    let courses = state.store.courses().await?;
    let led = state
        .store
        .groups(&GroupFilter {
            curator_id: Some(id),
            ..GroupFilter::default()
        })
        .await?;
    let groups: Vec<CuratorGroup> = led
        .iter()
        .map(|g| CuratorGroup {
            id: g.id,
            number: g.number.clone(),
            shift: g.shift,
            course_year: courses.iter().find(|c| c.id == g.course_id).map(|c| c.year),
            is_active: g.is_active,
            is_closed: g.is_closed,
        })
        .collect();
    Ok(CuratorDetail {
        row: CuratorRow::new(&user, led.first().map(GroupRef::from)),
        groups,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CuratorForm {
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratorSaved {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
}

impl From<&User> for CuratorSaved {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
        }
    }
}

/// New curator in the caller's faculty, signed in with the default password
/// until they change it.
#[instrument(skip(state, actor, form), fields(actor = %actor.id, username = %form.username))]
pub async fn create_curator(state: &AppState, actor: &User, form: CuratorForm) -> Result<CuratorSaved> {
    let faculty_id = faculty_of(actor)?;
    let full_name = FullName::try_new(form.full_name).field("full_name")?;
    let username = Username::try_new(form.username).field("username")?;
    if state.store.username_exists(username.as_ref()).await? {
        return Err(Error::conflict("username is already taken"));
    }
    let password = state.default_password()?;
    let user = state
        .store
        .insert_user(NewUser {
            full_name,
            username,
            password_hash: state.hasher.hash(&password).await?,
            role: UserRole::Curator,
            faculty_id: Some(faculty_id),
            force_password_change: true,
            birth_year: form.birth_year,
            department: non_blank(form.department),
            email: non_blank(form.email),
            phone: non_blank(form.phone),
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::CURATOR_CREATED, "users", Some(user.id.into_inner()))
                .describe(user.full_name.clone()),
        )
        .await;
    info!(user_id = %user.id, "curator created");
    Ok(CuratorSaved::from(&user))
}

pub async fn update_curator(
    state: &AppState,
    actor: &User,
    id: UserId,
    update: ProfileUpdate,
) -> Result<CuratorSaved> {
    let faculty_id = faculty_of(actor)?;
    let mut user = scoped_curator(state, faculty_id, id).await?;
    update.apply_to(&mut user)?;
    state.store.update_user(&user).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::CURATOR_UPDATED, "users", Some(id.into_inner()))
                .describe(user.full_name.clone()),
        )
        .await;
    Ok(CuratorSaved::from(&user))
}

/// Puts the default password back and forces a change at next sign-in.
pub async fn reset_curator_password(state: &AppState, actor: &User, id: UserId) -> Result<PasswordReset> {
    let faculty_id = faculty_of(actor)?;
    scoped_curator(state, faculty_id, id).await?;
    administration::reset_password(state, actor, id, ResetPasswordForm::default()).await
}

pub async fn delete_curator(state: &AppState, actor: &User, id: UserId) -> Result<Ack> {
    let faculty_id = faculty_of(actor)?;
    let mut user = scoped_curator(state, faculty_id, id).await?;
    user.is_deleted = true;
    user.revoke_sessions();
    state.store.update_user(&user).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::CURATOR_DELETED, "users", Some(id.into_inner()))
                .describe(user.full_name),
        )
        .await;
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Staff and audit

#[derive(Debug, Clone, Serialize)]
pub struct StaffRow {
    #[serde(flatten)]
    pub person: UserSummary,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Deans, vice deans and curators of the faculty, by role then name.
pub async fn staff(state: &AppState, actor: &User) -> Result<Vec<StaffRow>> {
    let faculty_id = faculty_of(actor)?;
    let filter = UserFilter {
        roles: vec![UserRole::Dean, UserRole::ViceDean, UserRole::Curator],
        faculty_id: Some(faculty_id),
    };
    let mut people = state.store.users(&filter).await?;
    people.sort_by(|a, b| {
        a.role
            .cmp(&b.role)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    Ok(people
        .into_iter()
        .map(|u| StaffRow {
            person: u.summary(),
            department: u.department,
            birth_year: u.birth_year,
            created_at: u.created_at,
        })
        .collect())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnAuditParams {
    pub action: Option<String>,
    pub date: Option<String>,
}

/// The caller's own audit trail, newest first.
pub async fn own_audit_log(
    state: &AppState,
    actor: &User,
    params: OwnAuditParams,
) -> Result<Vec<AuditRow>> {
    let date = non_blank(params.date)
        .map(|d| parse_date("date", &d))
        .transpose()?;
    let query = AuditQuery {
        user_id: Some(actor.id),
        action: non_blank(params.action),
        date,
        limit: OWN_AUDIT_LIMIT,
    };
    let entries = state.store.audit_log(&query).await?;
    Ok(entries.into_iter().map(AuditRow::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::test_support::{self as fx, faculty, group, mark, monday, state_on, user};
    use crate::infrastructure::UniversityStore;

    struct Office {
        dean: User,
        other_dean: User,
        curator: User,
        group: Group,
        foreign_group: Group,
    }

    async fn setup(state: &AppState) -> Office {
        let math = faculty(state, "Mathematics", "MM").await;
        let physics = faculty(state, "Physics", "PH").await;
        let dean = user(state, "dean", UserRole::Dean, Some(math.id)).await;
        let other_dean = user(state, "dean2", UserRole::Dean, Some(physics.id)).await;
        let curator = user(state, "cur", UserRole::Curator, Some(math.id)).await;
        let home = group(state, math.id, "101", 1, Some(curator.id)).await;
        let foreign = group(state, physics.id, "201", 2, None).await;
        Office {
            dean,
            other_dean,
            curator,
            group: home,
            foreign_group: foreign,
        }
    }

    fn group_form(number: &str, course_id: CourseId) -> GroupForm {
        GroupForm {
            number: number.to_string(),
            shift: 1,
            course_id,
            curator_id: None,
        }
    }

    #[tokio::test]
    async fn account_without_faculty_is_forbidden() {
        let (state, _) = state_on(monday());
        let dean = user(&state, "dean", UserRole::Dean, None).await;
        let err = groups(&state, &dean).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn group_numbers_are_unique_within_the_faculty() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        let err = create_group(&state, &f.dean, group_form("101", f.group.course_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // The same number in another faculty is fine
        let created = create_group(&state, &f.other_dean, group_form("101", f.group.course_id))
            .await
            .unwrap();
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn group_creation_validates_shift_course_and_curator() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;

        let mut form = group_form("102", f.group.course_id);
        form.shift = 3;
        let err = create_group(&state, &f.dean, form).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = create_group(&state, &f.dean, group_form("102", CourseId::new(999)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let mut form = group_form("102", f.group.course_id);
        form.curator_id = Some(f.other_dean.id);
        let err = create_group(&state, &f.dean, form).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn group_creation_needs_an_academic_year() {
        let (state, _) = state_on(monday());
        let math = faculty(&state, "Mathematics", "MM").await;
        let dean = user(&state, "dean", UserRole::Dean, Some(math.id)).await;
        let course = state.store.ensure_course(1).await.unwrap();
        let err = create_group(&state, &dean, group_form("101", course.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_groups_look_missing() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        let err = delete_group(&state, &f.dean, f.foreign_group.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn explicit_null_unassigns_the_curator() {
        let (state, store) = state_on(monday());
        let f = setup(&state).await;
        let update: GroupUpdate = serde_json::from_str(r#"{"curator_id": null}"#).unwrap();
        let group = update_group(&state, &f.dean, f.group.id, update).await.unwrap();
        assert_eq!(group.curator_id, None);

        let untouched: GroupUpdate = serde_json::from_str(r#"{"number": "105"}"#).unwrap();
        assert!(untouched.curator_id.is_none());
        let group = update_group(&state, &f.dean, f.group.id, untouched).await.unwrap();
        assert_eq!(group.number, "105");
        assert_eq!(store.group(f.group.id).await.unwrap().unwrap().curator_id, None);
    }

    #[tokio::test]
    async fn closed_groups_refuse_changes_until_reopened() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;

        let closed = close_group(&state, &f.dean, f.group.id).await.unwrap();
        assert!(closed.is_closed);
        assert!(close_group(&state, &f.dean, f.group.id).await.is_err());

        let assignment = CuratorAssignment {
            curator_id: Some(f.curator.id),
        };
        let err = assign_curator(&state, &f.dean, f.group.id, assignment.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        reopen_group(&state, &f.dean, f.group.id).await.unwrap();
        let assigned = assign_curator(&state, &f.dean, f.group.id, assignment)
            .await
            .unwrap();
        assert!(assigned.is_active);
    }

    #[tokio::test]
    async fn student_listing_filters_and_pages() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        for (i, hours) in [0, 10, 40, 50].iter().enumerate() {
            fx::student(&state, &f.group, &format!("Student {i}"), *hours).await;
        }
        fx::student(&state, &f.foreign_group, "Outsider", 90).await;

        let all = students(&state, &f.dean, StudentListParams::default()).await.unwrap();
        assert_eq!(all.total, 4);

        let high = students(
            &state,
            &f.dean,
            StudentListParams {
                high_nb: Some(true),
                ..StudentListParams::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(high.total, 2);
        assert!(high.students.iter().all(|s| s.is_high_risk));

        let page = students(
            &state,
            &f.dean,
            StudentListParams {
                page: Some(2),
                page_size: Some(3),
                ..StudentListParams::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.students.len(), 1);

        let second_year = students(
            &state,
            &f.dean,
            StudentListParams {
                course_year: Some(2),
                ..StudentListParams::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(second_year.total, 0);
    }

    #[tokio::test]
    async fn students_get_generated_codes_and_stay_in_the_faculty() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        let form = StudentForm {
            full_name: "Ali Valiev".to_string(),
            group_id: f.group.id,
            student_code: Some("  ".to_string()),
            birth_year: None,
            birth_place: None,
            region: None,
            parent_phone: None,
            study_start: None,
            expected_graduation: None,
        };
        let saved = create_student(&state, &f.dean, form.clone()).await.unwrap();
        assert!(saved.student_code.starts_with("STU"));

        let err = create_student(
            &state,
            &f.dean,
            StudentForm {
                group_id: f.foreign_group.id,
                ..form
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = student(&state, &f.other_dean, saved.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn justification_is_scoped_and_audited() {
        let (state, store) = state_on(monday());
        let f = setup(&state).await;
        let s = fx::student(&state, &f.group, "Ali", 0).await;
        mark(&state, &f.group, f.curator.id, monday(), &[(s.id, 4)]).await;
        let record = store.attendance(&AttendanceQuery::for_student(s.id)).await.unwrap()[0].clone();

        let form = JustifyForm {
            is_reasoned: true,
            reason_text: Some("medical note".to_string()),
        };
        let err = justify(&state, &f.other_dean, record.id, form.clone()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        justify(&state, &f.dean, record.id, form).await.unwrap();
        let record = store.attendance_record(record.id).await.unwrap().unwrap();
        assert!(record.is_reasoned);
        assert_eq!(record.reasoned_by, Some(f.dean.id));

        let own = own_audit_log(&state, &f.dean, OwnAuditParams::default()).await.unwrap();
        assert_eq!(own[0].action, actions::ATTENDANCE_JUSTIFIED);
    }

    #[tokio::test]
    async fn at_risk_lists_highest_first() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        fx::student(&state, &f.group, "Low", 36).await;
        fx::student(&state, &f.group, "High", 80).await;
        fx::student(&state, &f.group, "Fine", 3).await;

        let rows = at_risk(&state, &f.dean, RiskParams::default()).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low"]);
    }

    #[tokio::test]
    async fn curator_lifecycle() {
        let (state, store) = state_on(monday());
        let f = setup(&state).await;
        let form = CuratorForm {
            username: "newcur".to_string(),
            full_name: "New Curator".to_string(),
            email: None,
            phone: None,
            department: Some("Algebra".to_string()),
            birth_year: None,
        };
        let saved = create_curator(&state, &f.dean, form.clone()).await.unwrap();
        let created = store.user(saved.id).await.unwrap().unwrap();
        assert!(created.force_password_change);
        assert_eq!(created.faculty_id, f.dean.faculty_id);

        let err = create_curator(&state, &f.dean, form).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let listed = curators(&state, &f.dean).await.unwrap();
        let cur = listed.iter().find(|c| c.id == f.curator.id).unwrap();
        assert_eq!(cur.group_number.as_deref(), Some("101"));

        let reset = reset_curator_password(&state, &f.dean, saved.id).await.unwrap();
        assert_eq!(reset.new_password, "020304");

        delete_curator(&state, &f.dean, saved.id).await.unwrap();
        let err = curator(&state, &f.dean, saved.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn staff_is_ordered_by_rank_then_name() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        user(&state, "vd", UserRole::ViceDean, f.dean.faculty_id).await;
        let roles: Vec<UserRole> = staff(&state, &f.dean)
            .await
            .unwrap()
            .iter()
            .map(|s| s.person.role)
            .collect();
        assert_eq!(roles, vec![UserRole::Dean, UserRole::ViceDean, UserRole::Curator]);
    }

    #[tokio::test]
    async fn malformed_audit_date_is_rejected() {
        let (state, _) = state_on(monday());
        let f = setup(&state).await;
        let err = own_audit_log(
            &state,
            &f.dean,
            OwnAuditParams {
                action: None,
                date: Some("02.09.2024".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }
}
