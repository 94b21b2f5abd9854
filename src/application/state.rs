//! Shared service state
//!
//! Every request handler receives an [`AppState`]. It bundles the store, the
//! clock and the credential machinery so services stay free of globals.

use crate::config::AuthSettings;
use crate::domain::analytics::AttendanceTally;
use crate::domain::password::NewPassword;
use crate::domain::settings::{numeric_or, DEFAULT_NB_LIMIT_HIGH, NB_LIMIT_HIGH};
use crate::domain::{AttendanceQuery, FacultyId, NewAuditEntry, User};
use crate::error::{Error, Result};
use crate::infrastructure::log_messages;
use crate::infrastructure::{Clock, PasswordHasher, TokenIssuer, UniversityStore};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UniversityStore>,
    pub clock: Arc<dyn Clock>,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UniversityStore>,
        clock: Arc<dyn Clock>,
        auth: &AuthSettings,
    ) -> Self {
        Self {
            store,
            clock,
            tokens: TokenIssuer::new(&auth.jwt_secret, auth.token_ttl_hours),
            hasher: PasswordHasher::new(auth.bcrypt_cost),
            auth: Arc::new(auth.clone()),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Accumulated absence hours from which a student counts as high risk.
    pub async fn nb_limit(&self) -> Result<i32> {
        let raw = self.store.setting(NB_LIMIT_HIGH).await?;
        Ok(numeric_or(raw.as_deref(), DEFAULT_NB_LIMIT_HIGH))
    }

    /// Records an audit entry. A failed write is logged and never fails the
    /// operation that triggered it.
    pub async fn audit(&self, entry: NewAuditEntry) {
        let action = entry.action;
        if let Err(err) = self.store.record_audit(entry).await {
            warn!(action, error = %err, "{}", log_messages::audit::WRITE_FAILED);
        }
    }

    pub async fn tally(&self, query: &AttendanceQuery) -> Result<AttendanceTally> {
        let records = self.store.attendance(query).await?;
        Ok(AttendanceTally::from_records(&records))
    }

    /// The configured password given to new and reset accounts.
    pub fn default_password(&self) -> Result<NewPassword> {
        NewPassword::parse(&self.auth.default_password)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("clock", &self.clock)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Body of mutations that have nothing else to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

/// The faculty a dean or vice dean works in.
pub fn faculty_of(user: &User) -> Result<FacultyId> {
    user.faculty_id
        .ok_or_else(|| Error::forbidden("no faculty assigned to this account"))
}

/// Empty optional text becomes `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserializes a field that distinguishes "absent" from an explicit `null`.
pub fn explicit<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
