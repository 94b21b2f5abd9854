//! Row shapes shared by several dashboards

use crate::domain::*;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: GroupId,
    pub number: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            number: group.number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub id: StudentId,
    pub full_name: String,
    pub student_code: String,
    pub group_id: GroupId,
    pub group_number: Option<String>,
    pub course_year: Option<i32>,
    pub total_absent_hours: i32,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub is_high_risk: bool,
}

/// One journal cell as shown in histories
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    pub id: AttendanceId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub nb_hours: i32,
    pub comment: String,
    pub is_reasoned: bool,
    pub reason_text: Option<String>,
}

impl From<&Attendance> for AttendanceRow {
    fn from(record: &Attendance) -> Self {
        Self {
            id: record.id,
            date: record.lesson_date,
            status: record.status,
            nb_hours: record.nb_hours,
            comment: record.comment.clone().unwrap_or_default(),
            is_reasoned: record.is_reasoned,
            reason_text: record.reason_text.clone(),
        }
    }
}

/// Groups of one faculty (or of the whole university) with the lookups
/// needed to render student and group rows.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub groups: Vec<Group>,
    course_years: HashMap<CourseId, i32>,
    curators: HashMap<UserId, User>,
}

impl Directory {
    pub fn new(groups: Vec<Group>, courses: Vec<Course>, curators: Vec<User>) -> Self {
        Self {
            groups,
            course_years: courses.into_iter().map(|c| (c.id, c.year)).collect(),
            curators: curators.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.id).collect()
    }

    pub fn course_year(&self, group: &Group) -> Option<i32> {
        self.course_years.get(&group.course_id).copied()
    }

    pub fn course_id(&self, year: i32) -> Option<CourseId> {
        self.course_years
            .iter()
            .find(|(_, y)| **y == year)
            .map(|(id, _)| *id)
    }

    pub fn curator(&self, group: &Group) -> Option<&User> {
        group.curator_id.and_then(|id| self.curators.get(&id))
    }

    pub fn running(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.is_running())
    }

    pub fn student_row(&self, student: &Student, nb_limit: i32) -> StudentRow {
        let group = self.group(student.group_id);
        StudentRow {
            id: student.id,
            full_name: student.full_name.clone(),
            student_code: student.student_code.clone(),
            group_id: student.group_id,
            group_number: group.map(|g| g.number.clone()),
            course_year: group.and_then(|g| self.course_year(g)),
            total_absent_hours: student.total_absent_hours,
            birth_year: student.birth_year,
            birth_place: student.birth_place.clone(),
            region: student.region.clone(),
            parent_phone: student.parent_phone.clone(),
            is_high_risk: student.is_high_risk(nb_limit),
        }
    }
}

/// Completion of one group's journal page for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    pub status: CompletionStatus,
    pub marked: usize,
    pub total: usize,
}

impl DayStatus {
    pub fn new(marked: usize, total: usize) -> Self {
        Self {
            status: CompletionStatus::from_counts(marked, total),
            marked,
            total,
        }
    }
}

/// Number of marked students per group and day.
pub fn marked_counts(records: &[Attendance]) -> HashMap<(GroupId, NaiveDate), usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry((record.group_id, record.lesson_date)).or_insert(0) += 1;
    }
    counts
}

/// Live students per group.
pub fn head_counts(students: &[Student]) -> HashMap<GroupId, usize> {
    let mut counts = HashMap::new();
    for student in students {
        *counts.entry(student.group_id).or_insert(0) += 1;
    }
    counts
}
