use crate::domain::identifiers::{AcademicYearId, CourseId, FacultyId, GroupId, UserId};
use crate::domain::types::{GroupNumber, Shift};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A study group of one course inside a faculty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub number: String,
    pub shift: Shift,
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub faculty_id: FacultyId,
    pub curator_id: Option<UserId>,
    pub is_active: bool,
    pub is_closed: bool,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Group {
    /// Whether attendance is being recorded for this group.
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_closed && !self.is_deleted
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed {
            return Err(Error::validation("group is closed"));
        }
        Ok(())
    }

    /// Assigning a curator (re)activates the group; removing one leaves the flag as is.
    pub fn assign_curator(&mut self, curator_id: Option<UserId>) -> Result<()> {
        self.ensure_open()?;
        self.curator_id = curator_id;
        if curator_id.is_some() {
            self.is_active = true;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.is_closed {
            return Err(Error::validation("group is already closed"));
        }
        self.is_closed = true;
        self.is_active = false;
        Ok(())
    }

    pub fn reopen(&mut self) -> Result<()> {
        if !self.is_closed {
            return Err(Error::validation("group is not closed"));
        }
        self.is_closed = false;
        self.is_active = true;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub number: GroupNumber,
    pub shift: Shift,
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    pub faculty_id: FacultyId,
    pub curator_id: Option<UserId>,
}

/// Selection of groups for listings; deleted groups never match
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub faculty_id: Option<FacultyId>,
    pub course_id: Option<CourseId>,
    pub curator_id: Option<UserId>,
    pub running_only: bool,
}

impl GroupFilter {
    pub fn faculty(faculty_id: FacultyId) -> Self {
        Self {
            faculty_id: Some(faculty_id),
            ..Self::default()
        }
    }

    pub fn running(mut self) -> Self {
        self.running_only = true;
        self
    }

    pub fn matches(&self, group: &Group) -> bool {
        !group.is_deleted
            && self.faculty_id.is_none_or(|id| group.faculty_id == id)
            && self.course_id.is_none_or(|id| group.course_id == id)
            && self.curator_id.is_none_or(|id| group.curator_id == Some(id))
            && (!self.running_only || group.is_running())
    }
}
