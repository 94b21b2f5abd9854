//! The absence journal
//!
//! A lesson is the journal page of one group for one day. Each student gets
//! at most one attendance row per lesson; the row stores the hours missed
//! that day and the status follows from the hours.

use crate::domain::identifiers::{AttendanceId, GroupId, LessonId, StudentId, UserId};
use crate::domain::types::NbHours;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Subject recorded on lessons created implicitly by the journal.
pub const DEFAULT_LESSON_SUBJECT: &str = "Lesson";
pub const DEFAULT_LESSON_TYPE: &str = "lecture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn from_hours(nb_hours: i32) -> Self {
        if nb_hours > 0 {
            AttendanceStatus::Absent
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub group_id: GroupId,
    pub lesson_date: NaiveDate,
    pub subject: String,
    pub lesson_type: String,
}

/// One journal cell, joined with the lesson it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub group_id: GroupId,
    pub lesson_date: NaiveDate,
    pub status: AttendanceStatus,
    pub nb_hours: i32,
    pub comment: Option<String>,
    pub is_reasoned: bool,
    pub reason_text: Option<String>,
    pub reasoned_by: Option<UserId>,
    pub marked_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Attendance {
    pub fn is_absent(&self) -> bool {
        self.status == AttendanceStatus::Absent
    }
}

/// A single write into the journal
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceMark {
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub nb_hours: NbHours,
    pub comment: Option<String>,
}

/// Marks for one group applied atomically; lessons are created on demand and
/// the absence totals of every touched student are recomputed.
#[derive(Debug, Clone)]
pub struct AttendanceBatch {
    pub group_id: GroupId,
    pub marked_by: UserId,
    pub marks: Vec<AttendanceMark>,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceQuery {
    pub group_ids: Option<Vec<GroupId>>,
    pub student_id: Option<StudentId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub absent_only: bool,
}

impl AttendanceQuery {
    pub fn for_groups(group_ids: Vec<GroupId>) -> Self {
        Self {
            group_ids: Some(group_ids),
            ..Self::default()
        }
    }

    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn on(self, date: NaiveDate) -> Self {
        self.between(date, date)
    }

    pub fn absent_only(mut self) -> Self {
        self.absent_only = true;
        self
    }

    pub fn matches(&self, record: &Attendance) -> bool {
        self.group_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&record.group_id))
            && self.student_id.is_none_or(|id| record.student_id == id)
            && self.from.is_none_or(|from| record.lesson_date >= from)
            && self.to.is_none_or(|to| record.lesson_date <= to)
            && (!self.absent_only || record.is_absent())
    }
}

/// Excuse attached to an absence by faculty staff
#[derive(Debug, Clone)]
pub struct Justification {
    pub is_reasoned: bool,
    pub reason_text: Option<String>,
    pub reasoned_by: UserId,
}

/// How far a day's journal page has been filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CompletionStatus {
    pub fn from_counts(marked: usize, total: usize) -> Self {
        if marked == 0 {
            CompletionStatus::NotStarted
        } else if marked >= total {
            CompletionStatus::Completed
        } else {
            CompletionStatus::InProgress
        }
    }
}
