//! Seeding and maintenance commands
//!
//! Everything here is idempotent and safe to run on every start.

use crate::application::state::AppState;
use crate::config::BootstrapSettings;
use crate::domain::academic::COURSE_YEARS;
use crate::domain::password::NewPassword;
use crate::domain::settings::DEFAULTS;
use crate::domain::types::{FullName, Username};
use crate::domain::{NewUser, User, UserRole};
use crate::error::{FieldContext, Result};
use crate::infrastructure::log_messages;
use tracing::{info, instrument, warn};

pub const RECTOR_FULL_NAME: &str = "University Rector";

/// Makes sure the administrator account, default settings and courses exist.
#[instrument(skip_all)]
pub async fn seed(state: &AppState, bootstrap: &BootstrapSettings) -> Result<()> {
    ensure_admin(state, bootstrap).await?;

    for (key, value, description) in DEFAULTS {
        state
            .store
            .insert_setting_if_absent(key, value, description)
            .await?;
    }
    info!("{}", log_messages::bootstrap::SETTINGS_SEEDED);

    for year in COURSE_YEARS {
        state.store.ensure_course(year).await?;
    }
    info!("{}", log_messages::bootstrap::COURSES_SEEDED);
    Ok(())
}

async fn ensure_admin(state: &AppState, bootstrap: &BootstrapSettings) -> Result<Option<User>> {
    if state.store.username_exists(&bootstrap.admin_username).await? {
        info!(username = %bootstrap.admin_username, "{}", log_messages::bootstrap::ADMIN_PRESENT);
        return Ok(None);
    }
    let password = NewPassword::parse(&bootstrap.admin_password)?;
    let admin = state
        .store
        .insert_user(NewUser {
            full_name: FullName::try_new("Administrator".to_string()).field("full_name")?,
            username: Username::try_new(bootstrap.admin_username.clone()).field("admin_username")?,
            password_hash: state.hasher.hash(&password).await?,
            role: UserRole::Admin,
            faculty_id: None,
            force_password_change: false,
            birth_year: None,
            department: None,
            email: None,
            phone: None,
        })
        .await?;
    info!(username = %admin.username, "{}", log_messages::bootstrap::ADMIN_CREATED);
    Ok(Some(admin))
}

/// Creates the rector account. Returns `None` when the username is taken.
#[instrument(skip(state, password))]
pub async fn create_rector(state: &AppState, username: &str, password: &str) -> Result<Option<User>> {
    if state.store.username_exists(username).await? {
        warn!(username, "{}", log_messages::bootstrap::RECTOR_EXISTS);
        return Ok(None);
    }
    let password = NewPassword::parse(password)?;
    let rector = state
        .store
        .insert_user(NewUser {
            full_name: FullName::try_new(RECTOR_FULL_NAME.to_string()).field("full_name")?,
            username: Username::try_new(username.to_string()).field("username")?,
            password_hash: state.hasher.hash(&password).await?,
            role: UserRole::Rector,
            faculty_id: None,
            force_password_change: true,
            birth_year: None,
            department: None,
            email: None,
            phone: None,
        })
        .await?;
    info!(username, "{}", log_messages::bootstrap::RECTOR_CREATED);
    Ok(Some(rector))
}

/// Rebuilds every student's accumulated hours from the journal.
pub async fn recalculate_absences(state: &AppState) -> Result<u64> {
    let updated = state.store.recalculate_absent_hours(None).await?;
    info!(updated, "{}", log_messages::bootstrap::ABSENCES_RECALCULATED);
    Ok(updated)
}
