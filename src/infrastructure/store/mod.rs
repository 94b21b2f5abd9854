//! Persistence seam
//!
//! Services talk to storage only through [`UniversityStore`]. The Postgres
//! implementation backs the running service; the in-memory one backs tests
//! and local demos with the same observable behaviour.
//!
//! Conventions shared by both implementations:
//! - single-row lookups and listings skip soft-deleted rows
//! - listings are ordered the way screens show them (names, numbers, dates)
//! - uniqueness violations surface as [`crate::Error::Conflict`]

pub mod memory;
pub mod postgres;

use crate::domain::*;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait UniversityStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    // Accounts
    async fn user(&self, id: UserId) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Includes deleted accounts; usernames are never reused.
    async fn username_exists(&self, username: &str) -> Result<bool>;
    /// Ordered by full name.
    async fn users(&self, filter: &UserFilter) -> Result<Vec<User>>;
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn record_login(&self, record: NewLoginRecord) -> Result<()>;

    // Faculties
    /// Ordered by name.
    async fn faculties(&self) -> Result<Vec<Faculty>>;
    async fn faculty(&self, id: FacultyId) -> Result<Option<Faculty>>;
    /// Whether another faculty already uses the name or the code. Deleted
    /// faculties keep theirs reserved.
    async fn faculty_conflicts(
        &self,
        name: &str,
        code: &str,
        except: Option<FacultyId>,
    ) -> Result<bool>;
    async fn insert_faculty(&self, faculty: NewFaculty) -> Result<Faculty>;
    async fn update_faculty(&self, faculty: &Faculty) -> Result<()>;

    // Academic calendar
    /// Ordered by year.
    async fn courses(&self) -> Result<Vec<Course>>;
    async fn ensure_course(&self, year: i32) -> Result<Course>;
    /// Newest first.
    async fn academic_years(&self) -> Result<Vec<AcademicYear>>;
    async fn insert_academic_year(&self, year: NewAcademicYear) -> Result<AcademicYear>;
    /// Makes the year the only current one; false when it does not exist.
    async fn set_current_academic_year(&self, id: AcademicYearId) -> Result<bool>;
    /// Newest first, at most `limit`.
    async fn weeks(&self, limit: usize) -> Result<Vec<Week>>;
    async fn insert_week(&self, week: NewWeek) -> Result<Week>;
    async fn set_current_week(&self, id: WeekId) -> Result<bool>;

    // Groups
    /// Ordered by number.
    async fn groups(&self, filter: &GroupFilter) -> Result<Vec<Group>>;
    async fn group(&self, id: GroupId) -> Result<Option<Group>>;
    async fn insert_group(&self, group: NewGroup) -> Result<Group>;
    async fn update_group(&self, group: &Group) -> Result<()>;

    // Students
    /// Ordered by full name.
    async fn students(&self, query: &StudentQuery) -> Result<Vec<Student>>;
    async fn student(&self, id: StudentId) -> Result<Option<Student>>;
    async fn insert_student(&self, student: NewStudent) -> Result<Student>;
    async fn update_student(&self, student: &Student) -> Result<()>;

    // Journal
    async fn lessons(&self, group_ids: &[GroupId], from: NaiveDate, to: NaiveDate)
        -> Result<Vec<Lesson>>;
    /// Newest lesson date first.
    async fn attendance(&self, query: &AttendanceQuery) -> Result<Vec<Attendance>>;
    async fn attendance_record(&self, id: AttendanceId) -> Result<Option<Attendance>>;
    /// Writes all marks in one transaction and returns how many were written.
    async fn apply_attendance(&self, batch: AttendanceBatch) -> Result<usize>;
    async fn justify_attendance(&self, id: AttendanceId, justification: Justification)
        -> Result<bool>;
    /// Recomputes `total_absent_hours` of live students from the journal.
    /// `None` means every student. Returns the number of students updated.
    async fn recalculate_absent_hours(&self, students: Option<&[StudentId]>) -> Result<u64>;

    // Settings
    /// Ordered by key.
    async fn settings(&self) -> Result<Vec<SystemSetting>>;
    async fn setting(&self, key: &str) -> Result<Option<String>>;
    async fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<SystemSetting>;
    /// Seeds a setting without touching an existing value.
    async fn insert_setting_if_absent(&self, key: &str, value: &str, description: &str)
        -> Result<()>;

    // Audit
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()>;
    /// Newest first.
    async fn audit_log(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>>;
}
