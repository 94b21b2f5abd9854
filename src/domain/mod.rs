//! Domain model for the university journal
//!
//! Plain data types, validated values and the rules that do not need a
//! database: week arithmetic, attendance percentages, password policy and
//! group state changes.

pub mod academic;
pub mod analytics;
pub mod attendance;
pub mod audit;
pub mod calendar;
pub mod faculty;
pub mod group;
pub mod identifiers;
pub mod password;
pub mod settings;
pub mod student;
pub mod types;
pub mod user;

pub use academic::{AcademicYear, Course, NewAcademicYear, NewWeek, Week};
pub use attendance::{
    Attendance, AttendanceBatch, AttendanceMark, AttendanceQuery, AttendanceStatus,
    CompletionStatus, Justification, Lesson,
};
pub use audit::{AuditEntry, AuditQuery, NewAuditEntry, NewLoginRecord};
pub use faculty::{Faculty, NewFaculty};
pub use group::{Group, GroupFilter, NewGroup};
pub use identifiers::*;
pub use settings::SystemSetting;
pub use student::{NewStudent, Student, StudentQuery};
pub use user::{NewUser, User, UserFilter, UserRole, UserSummary};
