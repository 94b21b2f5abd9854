use crate::domain::identifiers::FacultyId;
use crate::domain::types::{FacultyCode, FacultyName};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewFaculty {
    pub name: FacultyName,
    pub code: FacultyCode,
    pub logo_url: Option<String>,
}
