use crate::domain::identifiers::{FacultyId, UserId};
use crate::domain::types::{FullName, PasswordHash, Username};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Access role of a staff account, ordered from the top of the hierarchy down
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[display("admin")]
    Admin,
    #[display("rector")]
    Rector,
    #[display("dean")]
    Dean,
    #[display("vice_dean")]
    ViceDean,
    #[display("curator")]
    Curator,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::Admin,
        UserRole::Rector,
        UserRole::Dean,
        UserRole::ViceDean,
        UserRole::Curator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Rector => "rector",
            UserRole::Dean => "dean",
            UserRole::ViceDean => "vice_dean",
            UserRole::Curator => "curator",
        }
    }

    /// URL prefix of the role's area.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            UserRole::Admin => "/admin",
            UserRole::Rector => "/rector",
            UserRole::Dean => "/dean",
            UserRole::ViceDean => "/vice-dean",
            UserRole::Curator => "/curator",
        }
    }

    pub fn dashboard_path(&self) -> String {
        format!("{}/dashboard", self.path_prefix())
    }

    /// Deans and vice deans only make sense attached to a faculty.
    pub fn requires_faculty(&self) -> bool {
        matches!(self, UserRole::Dean | UserRole::ViceDean)
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// A staff account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub role: UserRole,
    pub faculty_id: Option<FacultyId>,
    #[serde(skip)]
    pub token_version: i32,
    pub force_password_change: bool,
    pub birth_year: Option<i32>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Invalidates every token issued so far.
    pub fn revoke_sessions(&mut self) {
        self.token_version += 1;
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            username: self.username.clone(),
            role: self.role,
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Public view of an account used in nested payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub role: UserRole,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Data required to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: FullName,
    pub username: Username,
    pub password_hash: PasswordHash,
    pub role: UserRole,
    pub faculty_id: Option<FacultyId>,
    pub force_password_change: bool,
    pub birth_year: Option<i32>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Selection of accounts for listings
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub roles: Vec<UserRole>,
    pub faculty_id: Option<FacultyId>,
}

impl UserFilter {
    pub fn role(role: UserRole) -> Self {
        Self {
            roles: vec![role],
            faculty_id: None,
        }
    }

    pub fn in_faculty(mut self, faculty_id: FacultyId) -> Self {
        self.faculty_id = Some(faculty_id);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        !user.is_deleted
            && (self.roles.is_empty() || self.roles.contains(&user.role))
            && self.faculty_id.is_none_or(|id| user.faculty_id == Some(id))
    }
}
