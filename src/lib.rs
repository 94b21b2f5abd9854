//! unitrack - university administration and attendance journal
//!
//! Faculties, groups and students are managed by role-scoped staff areas.
//! Curators keep a weekly journal of absence hours (NB), from which the
//! service derives attendance percentages, at-risk lists and completion
//! reports.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{AppState, Application};
pub use error::{Error, Result};
