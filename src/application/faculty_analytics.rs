//! Faculty dashboards: attendance rates, journal completion and alerts
//!
//! All figures are computed from the journal of the caller's faculty. A day
//! counts as "started" for a group once it has a lesson with marks.

use crate::application::faculty_office::faculty_directory;
use crate::application::state::{faculty_of, non_blank, AppState};
use crate::application::views::{head_counts, marked_counts, DayStatus, Directory};
use crate::domain::analytics::AttendanceTally;
use crate::domain::calendar::{
    day_label, month_label, parse_date, recent_days, recent_mondays, recent_months, snap_to_monday,
    week_bounds, week_days, WORKING_DAYS,
};
use crate::domain::types::Shift;
use crate::domain::*;
use crate::error::Result;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const RATE_WINDOW_DAYS: u64 = 30;
const RANKED_GROUPS: usize = 5;
const MISSING_JOURNAL_ALERTS: usize = 10;
const HIGH_ABSENCE_ALERTS: usize = 5;
const MAX_ALERTS: usize = 20;
const TREND_WEEKS: u64 = 8;

/// Attendance of a single day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayRate {
    pub pct: f64,
    pub present: u64,
    pub recorded: u64,
}

impl From<AttendanceTally> for DayRate {
    fn from(tally: AttendanceTally) -> Self {
        Self {
            pct: tally.attendance_pct(),
            present: tally.present,
            recorded: tally.recorded(),
        }
    }
}

/// Everything the faculty dashboards share: the faculty's groups and
/// students plus the configured limit.
struct Snapshot {
    directory: Directory,
    students: Vec<Student>,
    nb_limit: i32,
    curators: usize,
}

impl Snapshot {
    async fn load(state: &AppState, faculty_id: FacultyId) -> Result<Self> {
        let directory = faculty_directory(state, faculty_id).await?;
        let students = state.store.students(&StudentQuery::in_faculty(faculty_id)).await?;
        let curators = state
            .store
            .users(&UserFilter::role(UserRole::Curator).in_faculty(faculty_id))
            .await?
            .len();
        Ok(Self {
            directory,
            students,
            nb_limit: state.nb_limit().await?,
            curators,
        })
    }

    fn high_risk(&self) -> Vec<&Student> {
        let mut risky: Vec<&Student> = self
            .students
            .iter()
            .filter(|s| s.is_high_risk(self.nb_limit))
            .collect();
        risky.sort_by(|a, b| b.total_absent_hours.cmp(&a.total_absent_hours));
        risky
    }

    async fn journal(&self, state: &AppState, from: NaiveDate, to: NaiveDate) -> Result<Vec<Attendance>> {
        if self.directory.groups.is_empty() {
            return Ok(Vec::new());
        }
        state
            .store
            .attendance(&AttendanceQuery::for_groups(self.directory.group_ids()).between(from, to))
            .await
    }

    async fn day_rate(&self, state: &AppState, day: NaiveDate) -> Result<DayRate> {
        let records = self.journal(state, day, day).await?;
        Ok(AttendanceTally::from_records(&records).into())
    }
}

fn tally_between(records: &[Attendance], from: NaiveDate, to: NaiveDate) -> AttendanceTally {
    AttendanceTally::from_records(
        records
            .iter()
            .filter(|r| r.lesson_date >= from && r.lesson_date <= to),
    )
}

// ---------------------------------------------------------------------------
// Dean dashboard

#[derive(Debug, Clone, Serialize)]
pub struct ShiftStats {
    pub attendance_rate: f64,
    pub total_students: usize,
    pub groups: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    pub course_year: i32,
    pub total_students: usize,
    pub groups: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRate {
    pub number: String,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeanStats {
    pub total_students: usize,
    pub total_groups: usize,
    pub total_curators: usize,
    pub high_absence_count: usize,
    pub nb_limit: i32,
    pub attendance_rate: f64,
    pub attendance_today: DayRate,
    pub shift_stats: BTreeMap<&'static str, ShiftStats>,
    pub course_stats: Vec<CourseStats>,
    pub top_groups: Vec<GroupRate>,
    pub bottom_groups: Vec<GroupRate>,
}

pub async fn dean_stats(state: &AppState, actor: &User) -> Result<DeanStats> {
    let faculty_id = faculty_of(actor)?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let today = state.today();
    let window = snapshot
        .journal(state, today - Days::new(RATE_WINDOW_DAYS), today)
        .await?;
    let attendance_today: DayRate = tally_between(&window, today, today).into();
    let directory = &snapshot.directory;
    let heads = head_counts(&snapshot.students);

    let mut shift_stats = BTreeMap::new();
    for (key, shift) in [("shift1", Shift::First), ("shift2", Shift::Second)] {
        let groups: Vec<&Group> = directory.groups.iter().filter(|g| g.shift == shift).collect();
        shift_stats.insert(
            key,
            ShiftStats {
                attendance_rate: attendance_today.pct,
                total_students: groups.iter().map(|g| heads.get(&g.id).copied().unwrap_or(0)).sum(),
                groups: groups.len(),
            },
        );
    }

    let mut by_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for group in &directory.groups {
        if let Some(year) = directory.course_year(group) {
            let entry = by_year.entry(year).or_default();
            entry.0 += 1;
            entry.1 += heads.get(&group.id).copied().unwrap_or(0);
        }
    }
    let course_stats = by_year
        .into_iter()
        .filter(|(_, (_, students))| *students > 0)
        .map(|(course_year, (groups, total_students))| CourseStats {
            course_year,
            total_students,
            groups,
            attendance_rate: attendance_today.pct,
        })
        .collect();

    let mut per_group: HashMap<GroupId, AttendanceTally> = HashMap::new();
    for record in &window {
        per_group.entry(record.group_id).or_default().add(record.status);
    }
    let mut ranked: Vec<GroupRate> = directory
        .running()
        .map(|g| GroupRate {
            number: g.number.clone(),
            attendance_rate: per_group
                .get(&g.id)
                .map(AttendanceTally::attendance_pct)
                .unwrap_or(0.0),
        })
        .collect();
    ranked.sort_by(|a, b| b.attendance_rate.total_cmp(&a.attendance_rate));
    let top_groups = ranked.iter().take(RANKED_GROUPS).cloned().collect();
    let bottom_groups = ranked.iter().rev().take(RANKED_GROUPS).cloned().collect();

    Ok(DeanStats {
        total_students: snapshot.students.len(),
        total_groups: directory.groups.len(),
        total_curators: snapshot.curators,
        high_absence_count: snapshot.high_risk().len(),
        nb_limit: snapshot.nb_limit,
        attendance_rate: attendance_today.pct,
        attendance_today,
        shift_stats,
        course_stats,
        top_groups,
        bottom_groups,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DeanOverview {
    pub total_students: usize,
    pub total_groups: usize,
    pub total_curators: usize,
    pub high_nb_count: usize,
    pub nb_limit: i32,
    pub attendance_today: DayRate,
}

pub async fn dean_overview(state: &AppState, actor: &User) -> Result<DeanOverview> {
    let faculty_id = faculty_of(actor)?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    Ok(DeanOverview {
        total_students: snapshot.students.len(),
        total_groups: snapshot.directory.groups.len(),
        total_curators: snapshot.curators,
        high_nb_count: snapshot.high_risk().len(),
        nb_limit: snapshot.nb_limit,
        attendance_today: snapshot.day_rate(state, state.today()).await?,
    })
}

/// Granularity of the attendance chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    Daily,
    Weekly,
    Monthly,
}

impl ChartMode {
    /// Unknown modes fall back to the daily chart.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("weekly") => ChartMode::Weekly,
            Some("monthly") => ChartMode::Monthly,
            _ => ChartMode::Daily,
        }
    }

    /// Labelled date ranges of the chart, oldest first.
    fn periods(self, today: NaiveDate) -> Vec<(String, NaiveDate, NaiveDate)> {
        match self {
            ChartMode::Daily => recent_days(today, 14)
                .into_iter()
                .map(|d| (day_label(d), d, d))
                .collect(),
            ChartMode::Weekly => recent_mondays(today, 8)
                .into_iter()
                .map(|monday| {
                    let (start, end) = week_bounds(monday);
                    (day_label(start), start, end)
                })
                .collect(),
            ChartMode::Monthly => recent_months(today, 6)
                .into_iter()
                .map(|(start, end)| (month_label(start).to_string(), start, end))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartParams {
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub mode: ChartMode,
}

pub async fn attendance_chart(
    state: &AppState,
    actor: &User,
    params: ChartParams,
) -> Result<AttendanceChart> {
    let faculty_id = faculty_of(actor)?;
    let mode = ChartMode::parse(params.mode.as_deref());
    let snapshot = Snapshot::load(state, faculty_id).await?;
    if snapshot.directory.groups.is_empty() {
        return Ok(AttendanceChart {
            labels: Vec::new(),
            values: Vec::new(),
            mode,
        });
    }

    let periods = mode.periods(state.today());
    let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
        return Ok(AttendanceChart {
            labels: Vec::new(),
            values: Vec::new(),
            mode,
        });
    };
    let records = snapshot.journal(state, first.1, last.2).await?;
    let (labels, values) = periods
        .into_iter()
        .map(|(label, from, to)| (label, tally_between(&records, from, to).attendance_pct()))
        .unzip();
    Ok(AttendanceChart {
        labels,
        values,
        mode,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Warning,
    HighAbsence,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub alert_type: AlertKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Running groups with no journal today, then the students with the most
/// absence hours.
pub async fn alerts(state: &AppState, actor: &User) -> Result<Vec<Alert>> {
    let faculty_id = faculty_of(actor)?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let today = state.today();
    let now = state.clock.now();
    let filled: HashSet<GroupId> = state
        .store
        .lessons(&snapshot.directory.group_ids(), today, today)
        .await?
        .into_iter()
        .map(|l| l.group_id)
        .collect();

    let missing = snapshot
        .directory
        .running()
        .filter(|g| !filled.contains(&g.id))
        .take(MISSING_JOURNAL_ALERTS)
        .map(|g| Alert {
            alert_type: AlertKind::Warning,
            message: format!("Group {}: today's journal has not been filled in", g.number),
            created_at: now,
        });
    let absent = snapshot
        .high_risk()
        .into_iter()
        .take(HIGH_ABSENCE_ALERTS)
        .map(|s| Alert {
            alert_type: AlertKind::HighAbsence,
            message: format!("{}: {} hours absent", s.full_name, s.total_absent_hours),
            created_at: now,
        });
    Ok(missing.chain(absent).take(MAX_ALERTS).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekAbsence {
    pub week: String,
    /// Share of absent marks, in percent
    pub avg_nb: f64,
}

/// Absence share of each of the last eight working weeks, oldest first.
pub async fn weekly_absence(state: &AppState, actor: &User) -> Result<Vec<WeekAbsence>> {
    let faculty_id = faculty_of(actor)?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let weeks: Vec<(NaiveDate, NaiveDate)> = recent_mondays(state.today(), TREND_WEEKS)
        .into_iter()
        .map(week_bounds)
        .collect();
    let records = match (weeks.first(), weeks.last()) {
        (Some(first), Some(last)) => snapshot.journal(state, first.0, last.1).await?,
        _ => Vec::new(),
    };
    Ok(weeks
        .into_iter()
        .map(|(monday, saturday)| WeekAbsence {
            week: format!("{}-{}", day_label(monday), day_label(saturday)),
            avg_nb: tally_between(&records, monday, saturday).absence_pct(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Journal completion

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayParams {
    pub target_date: Option<String>,
}

impl DayParams {
    fn day(&self, today: NaiveDate) -> Result<NaiveDate> {
        match non_blank(self.target_date.clone()) {
            Some(value) => parse_date("target_date", &value),
            None => Ok(today),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub total_groups: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDay {
    pub group_id: GroupId,
    pub group_number: String,
    pub shift: Shift,
    pub course_year: Option<i32>,
    pub curator_name: Option<String>,
    pub total_students: usize,
    pub marked: usize,
    pub completion_percentage: u32,
    pub status: CompletionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyControl {
    pub date: NaiveDate,
    pub summary: CompletionSummary,
    pub groups: Vec<GroupDay>,
}

fn whole_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// How far each active group has filled in the journal for one day.
pub async fn daily_control(state: &AppState, actor: &User, params: DayParams) -> Result<DailyControl> {
    let faculty_id = faculty_of(actor)?;
    let day = params.day(state.today())?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let heads = head_counts(&snapshot.students);
    let marks = marked_counts(&snapshot.journal(state, day, day).await?);
    let directory = &snapshot.directory;

    let mut summary = CompletionSummary::default();
    let groups: Vec<GroupDay> = directory
        .groups
        .iter()
        .filter(|g| g.is_active)
        .map(|g| {
            let total = heads.get(&g.id).copied().unwrap_or(0);
            let marked = marks.get(&(g.id, day)).copied().unwrap_or(0);
            let status = CompletionStatus::from_counts(marked, total);
            match status {
                CompletionStatus::Completed => summary.completed += 1,
                CompletionStatus::InProgress => summary.in_progress += 1,
                CompletionStatus::NotStarted => summary.not_started += 1,
            }
            GroupDay {
                group_id: g.id,
                group_number: g.number.clone(),
                shift: g.shift,
                course_year: directory.course_year(g),
                curator_name: directory.curator(g).map(|c| c.full_name.clone()),
                total_students: total,
                marked,
                completion_percentage: whole_percent(marked, total),
                status,
            }
        })
        .collect();
    summary.total_groups = groups.len();
    Ok(DailyControl {
        date: day,
        summary,
        groups,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekParams {
    pub week_start: Option<String>,
}

impl WeekParams {
    /// Monday of the requested week; the current week when absent.
    pub fn monday(&self, today: NaiveDate) -> Result<NaiveDate> {
        let day = match non_blank(self.week_start.clone()) {
            Some(value) => parse_date("week_start", &value)?,
            None => today,
        };
        Ok(snap_to_monday(day))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupWeek {
    pub group_id: GroupId,
    pub group_number: String,
    pub shift: Shift,
    pub course_year: Option<i32>,
    pub curator_name: Option<String>,
    pub total_students: usize,
    pub days: BTreeMap<NaiveDate, DayStatus>,
    pub missing_days: Vec<NaiveDate>,
    pub completion_pct: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyControl {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<NaiveDate>,
    pub groups: Vec<GroupWeek>,
}

/// Journal completion of each active group over one working week.
pub async fn weekly_control(state: &AppState, actor: &User, params: WeekParams) -> Result<WeeklyControl> {
    let faculty_id = faculty_of(actor)?;
    let (monday, saturday) = week_bounds(params.monday(state.today())?);
    let days = week_days(monday);
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let heads = head_counts(&snapshot.students);
    let marks = marked_counts(&snapshot.journal(state, monday, saturday).await?);
    let directory = &snapshot.directory;

    let groups = directory
        .groups
        .iter()
        .filter(|g| g.is_active)
        .map(|g| {
            let total = heads.get(&g.id).copied().unwrap_or(0);
            let statuses: BTreeMap<NaiveDate, DayStatus> = days
                .iter()
                .map(|d| (*d, DayStatus::new(marks.get(&(g.id, *d)).copied().unwrap_or(0), total)))
                .collect();
            let missing_days: Vec<NaiveDate> = statuses
                .iter()
                .filter(|(_, s)| s.status != CompletionStatus::Completed)
                .map(|(d, _)| *d)
                .collect();
            let completed = days.len() - missing_days.len();
            GroupWeek {
                group_id: g.id,
                group_number: g.number.clone(),
                shift: g.shift,
                course_year: directory.course_year(g),
                curator_name: directory.curator(g).map(|c| c.full_name.clone()),
                total_students: total,
                days: statuses,
                missing_days,
                completion_pct: whole_percent(completed, WORKING_DAYS as usize),
            }
        })
        .collect();
    Ok(WeeklyControl {
        week_start: monday,
        week_end: saturday,
        days,
        groups,
    })
}

// ---------------------------------------------------------------------------
// Vice dean dashboard

#[derive(Debug, Clone, Serialize)]
pub struct CourseLoad {
    pub year: i32,
    pub groups: usize,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskStudent {
    pub id: StudentId,
    pub full_name: String,
    pub total_absent_hours: i32,
    pub group_number: Option<String>,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViceDeanStats {
    pub total_students: usize,
    pub total_groups: usize,
    pub active_groups: usize,
    pub total_curators: usize,
    pub high_absence_students: usize,
    pub nb_limit: i32,
    pub attendance_rate: f64,
    pub groups_no_attendance_today: usize,
    pub course_stats: Vec<CourseLoad>,
    pub high_risk: Vec<RiskStudent>,
}

pub async fn vice_dean_stats(state: &AppState, actor: &User) -> Result<ViceDeanStats> {
    let faculty_id = faculty_of(actor)?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let today = state.today();
    let directory = &snapshot.directory;
    let heads = head_counts(&snapshot.students);

    let active: Vec<GroupId> = directory.running().map(|g| g.id).collect();
    let filled: HashSet<GroupId> = state
        .store
        .lessons(&active, today, today)
        .await?
        .into_iter()
        .map(|l| l.group_id)
        .collect();

    let courses = state.store.courses().await?;
    let course_stats = courses
        .iter()
        .filter_map(|course| {
            let groups: Vec<&Group> = directory
                .groups
                .iter()
                .filter(|g| g.course_id == course.id)
                .collect();
            (!groups.is_empty()).then(|| CourseLoad {
                year: course.year,
                groups: groups.len(),
                students: groups.iter().map(|g| heads.get(&g.id).copied().unwrap_or(0)).sum(),
            })
        })
        .collect();

    let risky = snapshot.high_risk();
    let high_risk = risky
        .iter()
        .take(HIGH_ABSENCE_ALERTS)
        .map(|s| RiskStudent {
            id: s.id,
            full_name: s.full_name.clone(),
            total_absent_hours: s.total_absent_hours,
            group_number: directory.group(s.group_id).map(|g| g.number.clone()),
            group_id: s.group_id,
        })
        .collect();

    Ok(ViceDeanStats {
        total_students: snapshot.students.len(),
        total_groups: directory.groups.len(),
        active_groups: active.len(),
        total_curators: snapshot.curators,
        high_absence_students: risky.len(),
        nb_limit: snapshot.nb_limit,
        attendance_rate: snapshot.day_rate(state, today).await?.pct,
        groups_no_attendance_today: active.iter().filter(|id| !filled.contains(id)).count(),
        course_stats,
        high_risk,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFilling {
    pub group_id: GroupId,
    pub group_number: String,
    pub shift: Shift,
    pub course_year: Option<i32>,
    pub curator_name: Option<String>,
    pub curator_phone: Option<String>,
    pub total_students: usize,
    pub has_attendance: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoAttendanceReport {
    pub date: NaiveDate,
    pub total_groups: usize,
    pub filled: usize,
    pub missing: usize,
    pub groups: Vec<GroupFilling>,
}

/// Which active groups have (and have not) opened the journal on a day.
pub async fn no_attendance(state: &AppState, actor: &User, params: DayParams) -> Result<NoAttendanceReport> {
    let faculty_id = faculty_of(actor)?;
    let day = params.day(state.today())?;
    let snapshot = Snapshot::load(state, faculty_id).await?;
    let directory = &snapshot.directory;
    let heads = head_counts(&snapshot.students);
    let filled: HashSet<GroupId> = state
        .store
        .lessons(&directory.group_ids(), day, day)
        .await?
        .into_iter()
        .map(|l| l.group_id)
        .collect();

    let groups: Vec<GroupFilling> = directory
        .groups
        .iter()
        .filter(|g| g.is_active)
        .map(|g| {
            let curator = directory.curator(g);
            GroupFilling {
                group_id: g.id,
                group_number: g.number.clone(),
                shift: g.shift,
                course_year: directory.course_year(g),
                curator_name: curator.map(|c| c.full_name.clone()),
                curator_phone: curator.and_then(|c| c.phone.clone()),
                total_students: heads.get(&g.id).copied().unwrap_or(0),
                has_attendance: filled.contains(&g.id),
            }
        })
        .collect();
    let filled_count = groups.iter().filter(|g| g.has_attendance).count();
    Ok(NoAttendanceReport {
        date: day,
        total_groups: groups.len(),
        filled: filled_count,
        missing: groups.len() - filled_count,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::test_support::*;
    use rstest::rstest;

    struct Dashboard {
        dean: User,
        curator: User,
        first: Group,
        second: Group,
    }

    async fn setup(state: &AppState) -> Dashboard {
        let math = faculty(state, "Mathematics", "MM").await;
        let dean = user(state, "dean", UserRole::Dean, Some(math.id)).await;
        let curator = user(state, "cur", UserRole::Curator, Some(math.id)).await;
        let first = group(state, math.id, "101", 1, Some(curator.id)).await;
        let second = group(state, math.id, "201", 2, None).await;
        Dashboard {
            dean,
            curator,
            first,
            second,
        }
    }

    #[rstest]
    #[case(Some("weekly"), ChartMode::Weekly)]
    #[case(Some("monthly"), ChartMode::Monthly)]
    #[case(Some("daily"), ChartMode::Daily)]
    #[case(Some("yearly"), ChartMode::Daily)]
    #[case(None, ChartMode::Daily)]
    fn chart_mode_parsing(#[case] raw: Option<&str>, #[case] expected: ChartMode) {
        assert_eq!(ChartMode::parse(raw), expected);
    }

    #[test]
    fn chart_periods_have_expected_lengths() {
        let today = monday();
        assert_eq!(ChartMode::Daily.periods(today).len(), 14);
        assert_eq!(ChartMode::Weekly.periods(today).len(), 8);
        let months = ChartMode::Monthly.periods(today);
        assert_eq!(months.len(), 6);
        assert_eq!(months.last().unwrap().0, "Sep");
    }

    #[tokio::test]
    async fn dean_stats_rank_groups_and_count_today() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let a = student(&state, &d.first, "A", 0).await;
        let b = student(&state, &d.first, "B", 40).await;
        let c = student(&state, &d.second, "C", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(a.id, 0), (b.id, 2)]).await;
        mark(&state, &d.second, d.curator.id, monday(), &[(c.id, 0)]).await;

        let stats = dean_stats(&state, &d.dean).await.unwrap();
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.total_curators, 1);
        assert_eq!(stats.attendance_today.recorded, 3);
        assert_eq!(stats.attendance_rate, 66.7);
        assert_eq!(stats.top_groups[0].number, "201");
        assert_eq!(stats.bottom_groups[0].number, "101");
        assert_eq!(stats.shift_stats["shift1"].groups, 2);
        assert_eq!(stats.course_stats.len(), 2);
    }

    #[tokio::test]
    async fn alerts_list_missing_journals_then_absences() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        student(&state, &d.first, "Absentee", 50).await;
        let present = student(&state, &d.first, "Present", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(present.id, 0)]).await;

        let found = alerts(&state, &d.dean).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].alert_type, AlertKind::Warning);
        assert!(found[0].message.contains("201"));
        assert_eq!(found[1].alert_type, AlertKind::HighAbsence);
    }

    #[tokio::test]
    async fn daily_control_classifies_groups() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let a = student(&state, &d.first, "A", 0).await;
        student(&state, &d.first, "B", 0).await;
        let c = student(&state, &d.second, "C", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(a.id, 0)]).await;
        mark(&state, &d.second, d.curator.id, monday(), &[(c.id, 0)]).await;

        let control = daily_control(&state, &d.dean, DayParams::default()).await.unwrap();
        assert_eq!(
            control.summary,
            CompletionSummary {
                total_groups: 2,
                completed: 1,
                in_progress: 1,
                not_started: 0,
            }
        );
        let first = control.groups.iter().find(|g| g.group_id == d.first.id).unwrap();
        assert_eq!(first.completion_percentage, 50);
    }

    #[tokio::test]
    async fn weekly_control_reports_missing_days() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let a = student(&state, &d.first, "A", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(a.id, 0)]).await;

        let params = WeekParams {
            week_start: Some("2024-09-04".to_string()),
        };
        let control = weekly_control(&state, &d.dean, params).await.unwrap();
        assert_eq!(control.week_start, monday());
        let first = control.groups.iter().find(|g| g.group_id == d.first.id).unwrap();
        assert_eq!(first.missing_days.len(), 5);
        assert_eq!(first.completion_pct, 17);
    }

    #[tokio::test]
    async fn malformed_dates_are_rejected() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let params = DayParams {
            target_date: Some("yesterday".to_string()),
        };
        assert!(daily_control(&state, &d.dean, params).await.is_err());
    }

    #[tokio::test]
    async fn vice_dean_sees_groups_without_journal() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let a = student(&state, &d.first, "A", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(a.id, 0)]).await;

        let stats = vice_dean_stats(&state, &d.dean).await.unwrap();
        assert_eq!(stats.active_groups, 2);
        assert_eq!(stats.groups_no_attendance_today, 1);

        let report = no_attendance(&state, &d.dean, DayParams::default()).await.unwrap();
        assert_eq!((report.filled, report.missing), (1, 1));
    }

    #[tokio::test]
    async fn weekly_absence_covers_eight_weeks() {
        let (state, _) = state_on(monday());
        let d = setup(&state).await;
        let a = student(&state, &d.first, "A", 0).await;
        mark(&state, &d.first, d.curator.id, monday(), &[(a.id, 3)]).await;

        let weeks = weekly_absence(&state, &d.dean).await.unwrap();
        assert_eq!(weeks.len(), 8);
        assert_eq!(weeks[7].week, "2/9-7/9");
        assert_eq!(weeks[7].avg_nb, 100.0);
    }
}
