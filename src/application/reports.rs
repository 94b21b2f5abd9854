//! University-wide reports for the rector. Read-only.

use crate::application::state::AppState;
use crate::domain::analytics::{round1, AttendanceTally};
use crate::domain::calendar::{week_bounds, week_days};
use crate::domain::*;
use crate::error::Result;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_faculties: usize,
    pub total_students: usize,
    pub total_groups: usize,
    pub total_staff: usize,
    pub high_nb_count: usize,
    pub nb_limit: i32,
    pub att_today_pct: f64,
    pub att_this_week_pct: f64,
    pub att_prev_week_pct: f64,
    /// This week's attendance minus last week's, in points
    pub dynamics: f64,
}

pub async fn overview(state: &AppState) -> Result<Overview> {
    let today = state.today();
    let nb_limit = state.nb_limit().await?;
    let students = state.store.students(&StudentQuery::default()).await?;
    let staff = state
        .store
        .users(&UserFilter::default())
        .await?
        .into_iter()
        .filter(|u| u.role != UserRole::Admin)
        .count();

    let (monday, saturday) = week_bounds(today);
    let (prev_monday, prev_saturday) = week_bounds(monday - Days::new(7));
    let all = AttendanceQuery::default();
    let att_this_week_pct = state
        .tally(&all.clone().between(monday, saturday))
        .await?
        .attendance_pct();
    let att_prev_week_pct = state
        .tally(&all.clone().between(prev_monday, prev_saturday))
        .await?
        .attendance_pct();

    Ok(Overview {
        total_faculties: state.store.faculties().await?.len(),
        total_students: students.len(),
        total_groups: state.store.groups(&GroupFilter::default()).await?.len(),
        total_staff: staff,
        high_nb_count: students.iter().filter(|s| s.is_high_risk(nb_limit)).count(),
        nb_limit,
        att_today_pct: state.tally(&all.on(today)).await?.attendance_pct(),
        att_this_week_pct,
        att_prev_week_pct,
        dynamics: round1(att_this_week_pct - att_prev_week_pct),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultySummary {
    pub id: FacultyId,
    pub name: String,
    pub code: String,
    pub total_students: usize,
    pub total_groups: usize,
    pub high_nb_count: usize,
    pub att_today_pct: f64,
    pub dean_name: Option<String>,
}

pub async fn faculties(state: &AppState) -> Result<Vec<FacultySummary>> {
    let today = state.today();
    let nb_limit = state.nb_limit().await?;
    let groups = state.store.groups(&GroupFilter::default()).await?;
    let students = state.store.students(&StudentQuery::default()).await?;
    let deans = state.store.users(&UserFilter::role(UserRole::Dean)).await?;
    let today_records = state
        .store
        .attendance(&AttendanceQuery::default().on(today))
        .await?;

    let mut summaries = Vec::new();
    for faculty in state.store.faculties().await? {
        let group_ids: Vec<GroupId> = groups
            .iter()
            .filter(|g| g.faculty_id == faculty.id)
            .map(|g| g.id)
            .collect();
        let members: Vec<&Student> = students
            .iter()
            .filter(|s| group_ids.contains(&s.group_id))
            .collect();
        let tally = AttendanceTally::from_records(
            today_records.iter().filter(|r| group_ids.contains(&r.group_id)),
        );
        summaries.push(FacultySummary {
            total_students: members.len(),
            total_groups: group_ids.len(),
            high_nb_count: members.iter().filter(|s| s.is_high_risk(nb_limit)).count(),
            att_today_pct: tally.attendance_pct(),
            dean_name: deans
                .iter()
                .find(|d| d.faculty_id == Some(faculty.id))
                .map(|d| d.full_name.clone()),
            id: faculty.id,
            name: faculty.name,
            code: faculty.code,
        });
    }
    Ok(summaries)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPageParams {
    pub faculty_id: Option<FacultyId>,
    pub course_year: Option<i32>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentItem {
    pub id: StudentId,
    pub full_name: String,
    pub student_code: String,
    pub group_number: Option<String>,
    pub course_year: Option<i32>,
    pub faculty_name: Option<String>,
    pub total_absent_hours: i32,
    pub is_high_risk: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Cuts one page out of `all`. Pages count from 1 and there is always at
    /// least one.
    pub fn slice(all: Vec<T>, page: usize, limit: usize) -> Self {
        let total = all.len();
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit).max(1),
            items,
        }
    }
}

pub async fn students(state: &AppState, params: StudentPageParams) -> Result<Page<StudentItem>> {
    let nb_limit = state.nb_limit().await?;
    let courses: HashMap<CourseId, i32> = state
        .store
        .courses()
        .await?
        .into_iter()
        .map(|c| (c.id, c.year))
        .collect();
    let faculties: HashMap<FacultyId, String> = state
        .store
        .faculties()
        .await?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect();
    let groups: HashMap<GroupId, Group> = state
        .store
        .groups(&GroupFilter {
            faculty_id: params.faculty_id,
            ..GroupFilter::default()
        })
        .await?
        .into_iter()
        .filter(|g| {
            params
                .course_year
                .is_none_or(|year| courses.get(&g.course_id) == Some(&year))
        })
        .map(|g| (g.id, g))
        .collect();

    let students = state
        .store
        .students(&StudentQuery::in_groups(groups.keys().copied().collect()))
        .await?;
    let items = students
        .into_iter()
        .map(|s| {
            let group = groups.get(&s.group_id);
            StudentItem {
                group_number: group.map(|g| g.number.clone()),
                course_year: group.and_then(|g| courses.get(&g.course_id).copied()),
                faculty_name: group.and_then(|g| faculties.get(&g.faculty_id).cloned()),
                is_high_risk: s.is_high_risk(nb_limit),
                id: s.id,
                full_name: s.full_name,
                student_code: s.student_code,
                total_absent_hours: s.total_absent_hours,
            }
        })
        .collect();

    Ok(Page::slice(
        items,
        params.page.unwrap_or(1),
        params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultyWeek {
    pub id: FacultyId,
    pub name: String,
    pub daily_attendance: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyStats {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub faculties: Vec<FacultyWeek>,
}

/// Daily attendance of every faculty over the current working week.
pub async fn weekly_stats(state: &AppState) -> Result<WeeklyStats> {
    let (monday, saturday) = week_bounds(state.today());
    let days = week_days(monday);
    let groups = state.store.groups(&GroupFilter::default()).await?;
    let records = state
        .store
        .attendance(&AttendanceQuery::default().between(monday, saturday))
        .await?;

    let faculties = state
        .store
        .faculties()
        .await?
        .into_iter()
        .map(|faculty| {
            let group_ids: Vec<GroupId> = groups
                .iter()
                .filter(|g| g.faculty_id == faculty.id)
                .map(|g| g.id)
                .collect();
            let daily_attendance = days
                .iter()
                .map(|day| {
                    let tally = AttendanceTally::from_records(records.iter().filter(|r| {
                        r.lesson_date == *day && group_ids.contains(&r.group_id)
                    }));
                    (*day, tally.attendance_pct())
                })
                .collect();
            FacultyWeek {
                id: faculty.id,
                name: faculty.name,
                daily_attendance,
            }
        })
        .collect();

    Ok(WeeklyStats {
        week_start: monday,
        week_end: saturday,
        days,
        faculties,
    })
}
