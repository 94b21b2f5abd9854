use crate::domain::identifiers::{FacultyId, GroupId, StudentId};
use crate::domain::types::{FullName, StudentCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Prefix of generated student codes, followed by the zero-padded id.
pub const STUDENT_CODE_PREFIX: &str = "STU";

pub fn generated_student_code(id: StudentId) -> String {
    format!("{STUDENT_CODE_PREFIX}{:06}", id.into_inner())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: StudentId,
    pub student_code: String,
    pub full_name: String,
    pub faculty_id: FacultyId,
    pub group_id: GroupId,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
    /// Sum of absence hours over the whole journal
    pub total_absent_hours: i32,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Student {
    pub fn is_high_risk(&self, nb_limit: i32) -> bool {
        self.total_absent_hours >= nb_limit
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    /// Generated from the assigned id when absent
    pub student_code: Option<StudentCode>,
    pub full_name: FullName,
    pub faculty_id: FacultyId,
    pub group_id: GroupId,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub parent_phone: Option<String>,
    pub study_start: Option<NaiveDate>,
    pub expected_graduation: Option<NaiveDate>,
    pub total_absent_hours: i32,
}

/// Student lookup criteria. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    pub faculty_id: Option<FacultyId>,
    pub group_ids: Option<Vec<GroupId>>,
    pub search: Option<String>,
    pub birth_place: Option<String>,
    pub region: Option<String>,
    pub min_absent_hours: Option<i32>,
}

impl StudentQuery {
    pub fn in_groups(group_ids: Vec<GroupId>) -> Self {
        Self {
            group_ids: Some(group_ids),
            ..Self::default()
        }
    }

    pub fn in_faculty(faculty_id: FacultyId) -> Self {
        Self {
            faculty_id: Some(faculty_id),
            ..Self::default()
        }
    }

    /// Text filters shorter than two characters are ignored.
    pub fn search(mut self, search: Option<&str>) -> Self {
        self.search = meaningful(search);
        self
    }

    pub fn birth_place(mut self, birth_place: Option<&str>) -> Self {
        self.birth_place = meaningful(birth_place);
        self
    }

    pub fn region(mut self, region: Option<&str>) -> Self {
        self.region = meaningful(region);
        self
    }

    pub fn matches(&self, student: &Student) -> bool {
        !student.is_deleted
            && self.faculty_id.is_none_or(|id| student.faculty_id == id)
            && self
                .group_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&student.group_id))
            && self.search.as_deref().is_none_or(|needle| {
                contains_ci(&student.full_name, needle) || contains_ci(&student.student_code, needle)
            })
            && self.birth_place.as_deref().is_none_or(|needle| {
                student
                    .birth_place
                    .as_deref()
                    .is_some_and(|place| contains_ci(place, needle))
            })
            && self.region.as_deref().is_none_or(|needle| {
                student
                    .region
                    .as_deref()
                    .is_some_and(|region| contains_ci(region, needle))
            })
            && self
                .min_absent_hours
                .is_none_or(|min| student.total_absent_hours >= min)
    }
}

fn meaningful(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|value| value.chars().count() >= 2)
        .map(str::to_string)
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
