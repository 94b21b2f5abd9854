use crate::domain::identifiers::{AuditEntryId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Audit trail action names
pub mod actions {
    pub const FACULTY_CREATED: &str = "FACULTY_CREATED";
    pub const FACULTY_UPDATED: &str = "FACULTY_UPDATED";
    pub const FACULTY_DELETED: &str = "FACULTY_DELETED";
    pub const USER_CREATED: &str = "USER_CREATED";
    pub const USER_UPDATED: &str = "USER_UPDATED";
    pub const USER_DELETED: &str = "USER_DELETED";
    pub const PASSWORD_RESET: &str = "PASSWORD_RESET";
    pub const PASSWORD_CHANGED: &str = "PASSWORD_CHANGED";
    pub const PROFILE_UPDATED: &str = "PROFILE_UPDATED";
    pub const ACADEMIC_YEAR_CREATED: &str = "ACADEMIC_YEAR_CREATED";
    pub const ACADEMIC_YEAR_SET_CURRENT: &str = "ACADEMIC_YEAR_SET_CURRENT";
    pub const WEEK_CREATED: &str = "WEEK_CREATED";
    pub const WEEK_SET_CURRENT: &str = "WEEK_SET_CURRENT";
    pub const SETTING_UPDATED: &str = "SETTING_UPDATED";
    pub const GROUP_CREATED: &str = "GROUP_CREATED";
    pub const GROUP_UPDATED: &str = "GROUP_UPDATED";
    pub const GROUP_DELETED: &str = "GROUP_DELETED";
    pub const GROUP_CLOSED: &str = "GROUP_CLOSED";
    pub const GROUP_REOPENED: &str = "GROUP_REOPENED";
    pub const CURATOR_ASSIGNED: &str = "CURATOR_ASSIGNED";
    pub const CURATOR_REMOVED: &str = "CURATOR_REMOVED";
    pub const CURATOR_CREATED: &str = "CURATOR_CREATED";
    pub const CURATOR_UPDATED: &str = "CURATOR_UPDATED";
    pub const CURATOR_DELETED: &str = "CURATOR_DELETED";
    pub const STUDENT_CREATED: &str = "STUDENT_CREATED";
    pub const STUDENT_UPDATED: &str = "STUDENT_UPDATED";
    pub const STUDENT_DELETED: &str = "STUDENT_DELETED";
    pub const ATTENDANCE_MARKED: &str = "ATTENDANCE_MARKED";
    pub const ATTENDANCE_JUSTIFIED: &str = "ATTENDANCE_JUSTIFIED";
    pub const WEEK_SAVED: &str = "WEEK_SAVED";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub user_id: Option<UserId>,
    /// Name of the acting account, if it still exists
    pub actor_name: Option<String>,
    pub action: String,
    pub target_table: String,
    pub target_id: Option<i64>,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub user_id: Option<UserId>,
    pub action: &'static str,
    pub target_table: &'static str,
    pub target_id: Option<i64>,
    pub description: Option<String>,
}

impl NewAuditEntry {
    pub fn new(
        user_id: UserId,
        action: &'static str,
        target_table: &'static str,
        target_id: Option<i64>,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            target_table,
            target_id,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub user_id: Option<UserId>,
    pub action: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: usize,
}

impl AuditQuery {
    pub fn latest(limit: usize) -> Self {
        Self {
            user_id: None,
            action: None,
            date: None,
            limit,
        }
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.user_id.is_none_or(|id| entry.user_id == Some(id))
            && self.action.as_deref().is_none_or(|action| entry.action == action)
            && self
                .date
                .is_none_or(|date| entry.timestamp.date_naive() == date)
    }
}

/// One sign-in attempt
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoginRecord {
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
}
