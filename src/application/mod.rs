//! Application services and business logic orchestration
//!
//! Each module is a set of free async functions taking the shared
//! [`AppState`] and the acting account. Handlers stay thin wrappers around
//! them.

pub mod accounts;
pub mod administration;
pub mod app;
pub mod bootstrap;
pub mod export;
pub mod faculty_analytics;
pub mod faculty_office;
pub mod journal;
pub mod profile;
pub mod reports;
pub mod state;
pub mod views;

pub use app::Application;
pub use state::AppState;
