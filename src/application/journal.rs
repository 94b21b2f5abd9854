//! The curator's attendance journal
//!
//! A curator works on exactly one running group. Only the current working
//! week (Monday to Saturday) may be edited; earlier weeks are read-only.

use crate::application::faculty_analytics::WeekParams;
use crate::application::faculty_office::StudentSaved;
use crate::application::state::{non_blank, Ack, AppState};
use crate::application::views::{marked_counts, AttendanceRow, DayStatus};
use crate::domain::analytics::NbBuckets;
use crate::domain::audit::actions;
use crate::domain::calendar::{is_in_week, parse_date, snap_to_monday, week_bounds, week_days};
use crate::domain::types::{FullName, NbHours, Shift};
use crate::domain::*;
use crate::error::{Error, FieldContext, Result};
use crate::infrastructure::log_messages;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument};

/// The running group the curator leads.
pub async fn curator_group(state: &AppState, curator: &User) -> Result<Group> {
    let filter = GroupFilter {
        curator_id: Some(curator.id),
        ..GroupFilter::default()
    }
    .running();
    state
        .store
        .groups(&filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::forbidden("no active group assigned"))
}

async fn roster(state: &AppState, group: &Group) -> Result<Vec<Student>> {
    state
        .store
        .students(&StudentQuery::in_groups(vec![group.id]))
        .await
}

async fn own_student(state: &AppState, group: &Group, id: StudentId) -> Result<Student> {
    state
        .store
        .student(id)
        .await?
        .filter(|s| s.group_id == group.id)
        .ok_or_else(|| Error::not_found("student"))
}

fn current_monday(state: &AppState) -> NaiveDate {
    snap_to_monday(state.today())
}

fn ensure_editable(state: &AppState, date: NaiveDate) -> Result<()> {
    if is_in_week(date, current_monday(state)) {
        Ok(())
    } else {
        Err(Error::validation("only days of the current week can be edited"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub group_number: String,
    pub shift: Shift,
    pub course_year: Option<i32>,
    pub total_students: usize,
    pub total_nb_hours: i64,
    pub high_absence_count: usize,
    pub nb_limit: i32,
}

pub async fn stats(state: &AppState, curator: &User) -> Result<GroupStats> {
    let group = curator_group(state, curator).await?;
    let students = roster(state, &group).await?;
    let nb_limit = state.nb_limit().await?;
    let course_year = state
        .store
        .courses()
        .await?
        .into_iter()
        .find(|c| c.id == group.course_id)
        .map(|c| c.year);
    Ok(GroupStats {
        group_number: group.number,
        shift: group.shift,
        course_year,
        total_students: students.len(),
        total_nb_hours: students.iter().map(|s| i64::from(s.total_absent_hours)).sum(),
        high_absence_count: students.iter().filter(|s| s.is_high_risk(nb_limit)).count(),
        nb_limit,
    })
}

// ---------------------------------------------------------------------------
// Students

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentSearch {
    pub search: Option<String>,
    pub birth_place: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupStudent {
    pub id: StudentId,
    pub full_name: String,
    pub student_code: String,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub total_absent_hours: i32,
    pub is_high_risk: bool,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
}

impl GroupStudent {
    fn new(student: Student, nb_limit: i32) -> Self {
        Self {
            is_high_risk: student.is_high_risk(nb_limit),
            id: student.id,
            full_name: student.full_name,
            student_code: student.student_code,
            birth_year: student.birth_year,
            birth_place: student.birth_place,
            region: student.region,
            parent_phone: student.parent_phone,
            total_absent_hours: student.total_absent_hours,
            study_start: student.study_start,
            expected_graduation: student.expected_graduation,
        }
    }
}

pub async fn students(state: &AppState, curator: &User, params: StudentSearch) -> Result<Vec<GroupStudent>> {
    let group = curator_group(state, curator).await?;
    let nb_limit = state.nb_limit().await?;
    let query = StudentQuery::in_groups(vec![group.id])
        .search(params.search.as_deref())
        .birth_place(params.birth_place.as_deref());
    Ok(state
        .store
        .students(&query)
        .await?
        .into_iter()
        .map(|s| GroupStudent::new(s, nb_limit))
        .collect())
}

pub async fn student(state: &AppState, curator: &User, id: StudentId) -> Result<GroupStudent> {
    let group = curator_group(state, curator).await?;
    let student = own_student(state, &group, id).await?;
    Ok(GroupStudent::new(student, state.nb_limit().await?))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroupStudent {
    pub full_name: String,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    /// Defaults to today
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
    #[serde(default)]
    pub initial_nb_hours: i32,
}

#[instrument(skip(state, curator, form), fields(curator = %curator.id))]
pub async fn create_student(state: &AppState, curator: &User, form: NewGroupStudent) -> Result<StudentSaved> {
    let group = curator_group(state, curator).await?;
    let full_name = FullName::try_new(form.full_name).field("full_name")?;
    if form.initial_nb_hours < 0 {
        return Err(Error::invalid_input("initial_nb_hours", "must not be negative"));
    }
    let student = state
        .store
        .insert_student(NewStudent {
            student_code: None,
            full_name,
            faculty_id: group.faculty_id,
            group_id: group.id,
            birth_year: form.birth_year,
            birth_place: non_blank(form.birth_place),
            region: non_blank(form.region),
            parent_phone: non_blank(form.parent_phone),
            study_start: Some(form.study_start.unwrap_or_else(|| state.today())),
            expected_graduation: form.expected_graduation,
            total_absent_hours: form.initial_nb_hours,
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(curator.id, actions::STUDENT_CREATED, "students", Some(student.id.into_inner()))
                .describe(student.full_name.clone()),
        )
        .await;
    Ok(StudentSaved::from(&student))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupStudentUpdate {
    pub full_name: Option<String>,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
}

pub async fn update_student(
    state: &AppState,
    curator: &User,
    id: StudentId,
    update: GroupStudentUpdate,
) -> Result<StudentSaved> {
    let group = curator_group(state, curator).await?;
    let mut student = own_student(state, &group, id).await?;
    if let Some(full_name) = update.full_name {
        student.full_name = FullName::try_new(full_name).field("full_name")?.into_inner();
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
            NewAuditEntry::new(curator.id, actions::STUDENT_UPDATED, "students", Some(id.into_inner()))
                .describe(student.full_name.clone()),
        )
        .await;
    Ok(StudentSaved::from(&student))
}

pub async fn delete_student(state: &AppState, curator: &User, id: StudentId) -> Result<Ack> {
    let group = curator_group(state, curator).await?;
    let mut student = own_student(state, &group, id).await?;
    student.is_deleted = true;
    state.store.update_student(&student).await?;
    state
        .audit(
            NewAuditEntry::new(curator.id, actions::STUDENT_DELETED, "students", Some(id.into_inner()))
                .describe(student.full_name),
        )
        .await;
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Weekly journal

#[derive(Debug, Clone, Serialize)]
pub struct GroupHeader {
    pub id: GroupId,
    pub number: String,
    pub shift: Shift,
}

/// One marked cell of the journal
#[derive(Debug, Clone, Serialize)]
pub struct JournalCell {
    pub status: AttendanceStatus,
    pub nb_hours: i32,
    pub comment: String,
    pub is_reasoned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalRow {
    pub id: StudentId,
    pub full_name: String,
    pub student_code: String,
    pub total_absent_hours: i32,
    pub is_high_risk: bool,
    /// `None` where nothing has been marked yet
    pub days: BTreeMap<NaiveDate, Option<JournalCell>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalWeek {
    pub group: GroupHeader,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub students: Vec<JournalRow>,
    pub daily_status: BTreeMap<NaiveDate, DayStatus>,
    pub nb_limit: i32,
    pub is_current_week: bool,
}

pub async fn week(state: &AppState, curator: &User, params: WeekParams) -> Result<JournalWeek> {
    let group = curator_group(state, curator).await?;
    let (monday, saturday) = week_bounds(params.monday(state.today())?);
    let days = week_days(monday);
    let students = roster(state, &group).await?;
    let nb_limit = state.nb_limit().await?;
    let records = state
        .store
        .attendance(&AttendanceQuery::for_groups(vec![group.id]).between(monday, saturday))
        .await?;

    let on_roster: HashSet<StudentId> = students.iter().map(|s| s.id).collect();
    let visible: Vec<Attendance> = records
        .into_iter()
        .filter(|r| on_roster.contains(&r.student_id))
        .collect();
    let cells: HashMap<(StudentId, NaiveDate), &Attendance> = visible
        .iter()
        .map(|r| ((r.student_id, r.lesson_date), r))
        .collect();
    let marks = marked_counts(&visible);

    let rows = students
        .iter()
        .map(|s| JournalRow {
            id: s.id,
            full_name: s.full_name.clone(),
            student_code: s.student_code.clone(),
            total_absent_hours: s.total_absent_hours,
            is_high_risk: s.is_high_risk(nb_limit),
            days: days
                .iter()
                .map(|d| {
                    let cell = cells.get(&(s.id, *d)).map(|r| JournalCell {
                        status: r.status,
                        nb_hours: r.nb_hours,
                        comment: r.comment.clone().unwrap_or_default(),
                        is_reasoned: r.is_reasoned,
                    });
                    (*d, cell)
                })
                .collect(),
        })
        .collect();
    let daily_status = days
        .iter()
        .map(|d| {
            let marked = marks.get(&(group.id, *d)).copied().unwrap_or(0);
            (*d, DayStatus::new(marked, students.len()))
        })
        .collect();

    Ok(JournalWeek {
        group: GroupHeader {
            id: group.id,
            number: group.number,
            shift: group.shift,
        },
        week_start: monday,
        week_end: saturday,
        days,
        students: rows,
        daily_status,
        nb_limit,
        is_current_week: monday == current_monday(state),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkRecord {
    pub student_id: StudentId,
    #[serde(default)]
    pub nb_hours: i32,
    pub comment: Option<String>,
}

/// Keeps the records that belong to the roster and carry a valid hour count.
fn accepted_marks(
    date: NaiveDate,
    records: Vec<MarkRecord>,
    roster: &HashSet<StudentId>,
) -> Vec<AttendanceMark> {
    records
        .into_iter()
        .filter_map(|record| {
            if !roster.contains(&record.student_id) {
                debug!(student_id = %record.student_id, "{}", log_messages::journal::MARK_SKIPPED);
                return None;
            }
            let Ok(nb_hours) = NbHours::try_new(record.nb_hours) else {
                debug!(
                    student_id = %record.student_id,
                    nb_hours = record.nb_hours,
                    "{}",
                    log_messages::journal::MARKS_SKIPPED
                );
                return None;
            };
            Some(AttendanceMark {
                student_id: record.student_id,
                date,
                nb_hours,
                comment: non_blank(record.comment),
            })
        })
        .collect()
}

async fn write_marks(state: &AppState, group: &Group, curator: &User, marks: Vec<AttendanceMark>) -> Result<usize> {
    if marks.is_empty() {
        return Ok(0);
    }
    let applied = state
        .store
        .apply_attendance(AttendanceBatch {
            group_id: group.id,
            marked_by: curator.id,
            marks,
        })
        .await?;
    debug!(group_id = %group.id, applied, "{}", log_messages::journal::MARKS_APPLIED);
    Ok(applied)
}

async fn roster_ids(state: &AppState, group: &Group) -> Result<HashSet<StudentId>> {
    Ok(roster(state, group).await?.into_iter().map(|s| s.id).collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayMarks {
    pub date: String,
    #[serde(default)]
    pub records: Vec<MarkRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayMarked {
    pub ok: bool,
    pub date: NaiveDate,
    pub updated_count: usize,
}

#[instrument(skip(state, curator, form), fields(curator = %curator.id, date = %form.date))]
pub async fn mark_day(state: &AppState, curator: &User, form: DayMarks) -> Result<DayMarked> {
    let group = curator_group(state, curator).await?;
    let date = parse_date("date", &form.date)?;
    ensure_editable(state, date)?;
    let marks = accepted_marks(date, form.records, &roster_ids(state, &group).await?);
    let updated_count = write_marks(state, &group, curator, marks).await?;
    state
        .audit(
            NewAuditEntry::new(curator.id, actions::ATTENDANCE_MARKED, "attendance", Some(group.id.into_inner()))
                .describe(format!("{date}: {updated_count} records")),
        )
        .await;
    Ok(DayMarked {
        ok: true,
        date,
        updated_count,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingleMark {
    pub student_id: Option<StudentId>,
    pub date: Option<String>,
    pub nb_hours: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marked {
    pub ok: bool,
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub nb_hours: i32,
    pub total_absent_hours: i32,
}

/// Marks one student for one day, rejecting anything the batch forms would skip.
pub async fn mark(state: &AppState, curator: &User, form: SingleMark) -> Result<Marked> {
    let group = curator_group(state, curator).await?;
    let student_id = form
        .student_id
        .ok_or_else(|| Error::invalid_input("student_id", "is required"))?;
    let date = form
        .date
        .as_deref()
        .ok_or_else(|| Error::invalid_input("date", "is required"))
        .and_then(|d| parse_date("date", d))?;
    let nb_hours = form
        .nb_hours
        .ok_or_else(|| Error::invalid_input("nb_hours", "is required"))?;
    ensure_editable(state, date)?;
    let nb_hours = NbHours::try_new(nb_hours).field("nb_hours")?;
    own_student(state, &group, student_id).await?;

    let mark = AttendanceMark {
        student_id,
        date,
        nb_hours,
        comment: non_blank(form.comment),
    };
    write_marks(state, &group, curator, vec![mark]).await?;
    let student = own_student(state, &group, student_id).await?;
    Ok(Marked {
        ok: true,
        student_id,
        date,
        nb_hours: nb_hours.into_inner(),
        total_absent_hours: student.total_absent_hours,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekMarks {
    pub week_start: String,
    #[serde(default)]
    pub days: BTreeMap<String, Vec<MarkRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSaved {
    pub ok: bool,
    pub week_start: NaiveDate,
    pub total_updated: usize,
}

/// Saves a whole week of marks in one transaction. Days outside the
/// current week are ignored.
#[instrument(skip(state, curator, form), fields(curator = %curator.id, week_start = %form.week_start))]
pub async fn save_week(state: &AppState, curator: &User, form: WeekMarks) -> Result<WeekSaved> {
    let group = curator_group(state, curator).await?;
    let monday = snap_to_monday(parse_date("week_start", &form.week_start)?);
    if monday != current_monday(state) {
        return Err(Error::validation("only the current week can be edited"));
    }
    let roster = roster_ids(state, &group).await?;

    let mut marks = Vec::new();
    for (raw_date, records) in form.days {
        let Ok(date) = parse_date("days", &raw_date) else {
            debug!(date = %raw_date, "{}", log_messages::journal::DAY_SKIPPED);
            continue;
        };
        if !is_in_week(date, monday) {
            debug!(%date, "{}", log_messages::journal::DAY_SKIPPED);
            continue;
        }
        marks.extend(accepted_marks(date, records, &roster));
    }
    let total_updated = write_marks(state, &group, curator, marks).await?;
    state
        .audit(
            NewAuditEntry::new(curator.id, actions::WEEK_SAVED, "attendance", Some(group.id.into_inner()))
                .describe(format!("Week {monday} saved, {total_updated} records")),
        )
        .await;
    info!(group_id = %group.id, total_updated, "{}", log_messages::journal::WEEK_SAVED);
    Ok(WeekSaved {
        ok: true,
        week_start: monday,
        total_updated,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentJournal {
    pub student_id: StudentId,
    pub full_name: String,
    pub total_absent_hours: i32,
    pub records: Vec<AttendanceRow>,
}

pub async fn student_journal(state: &AppState, curator: &User, id: StudentId) -> Result<StudentJournal> {
    let group = curator_group(state, curator).await?;
    let student = own_student(state, &group, id).await?;
    let records = state.store.attendance(&AttendanceQuery::for_student(id)).await?;
    Ok(StudentJournal {
        student_id: student.id,
        full_name: student.full_name,
        total_absent_hours: student.total_absent_hours,
        records: records.iter().map(AttendanceRow::from).collect(),
    })
}

// ---------------------------------------------------------------------------
// Absence statistics

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NbRange {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighRiskStudent {
    pub id: StudentId,
    pub full_name: String,
    pub total_absent_hours: i32,
    pub parent_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentHours {
    pub id: StudentId,
    pub full_name: String,
    pub total_absent_hours: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NbStats {
    pub nb_limit: i32,
    pub total_students: usize,
    pub ranges: Vec<NbRange>,
    pub high_risk: Vec<HighRiskStudent>,
    pub all_students: Vec<StudentHours>,
}

pub async fn nb_stats(state: &AppState, curator: &User) -> Result<NbStats> {
    let group = curator_group(state, curator).await?;
    let nb_limit = state.nb_limit().await?;
    let mut students = roster(state, &group).await?;
    students.sort_by(|a, b| b.total_absent_hours.cmp(&a.total_absent_hours));

    let buckets = NbBuckets::new(nb_limit);
    let mut counts = [0usize; 5];
    for student in &students {
        counts[buckets.index(student.total_absent_hours)] += 1;
    }
    let ranges = buckets
        .labels()
        .into_iter()
        .zip(counts)
        .map(|(label, count)| NbRange { label, count })
        .collect();

    Ok(NbStats {
        nb_limit,
        total_students: students.len(),
        ranges,
        high_risk: students
            .iter()
            .filter(|s| s.is_high_risk(nb_limit))
            .map(|s| HighRiskStudent {
                id: s.id,
                full_name: s.full_name.clone(),
                total_absent_hours: s.total_absent_hours,
                parent_phone: s.parent_phone.clone(),
            })
            .collect(),
        all_students: students
            .into_iter()
            .map(|s| StudentHours {
                id: s.id,
                full_name: s.full_name,
                total_absent_hours: s.total_absent_hours,
            })
            .collect(),
    })
}
