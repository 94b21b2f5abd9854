//! Sign-in, sign-out and password changes

use crate::application::state::AppState;
use crate::domain::audit::actions;
use crate::domain::password::NewPassword;
use crate::domain::{NewAuditEntry, NewLoginRecord, User, UserSummary};
use crate::error::{Error, Result};
use crate::infrastructure::log_messages;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

pub const LOGIN_PATH: &str = "/login";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Where a login attempt came from
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A freshly authenticated account and its token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub redirect: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionBody {
    pub redirect: String,
    pub user: UserSummary,
    pub force_password_change: bool,
}

impl Session {
    fn start(state: &AppState, user: User) -> Result<Self> {
        let token = state.tokens.issue(&user)?;
        let redirect = redirect_for(Some(&user));
        Ok(Self {
            user,
            token,
            redirect,
        })
    }

    pub fn body(&self) -> SessionBody {
        SessionBody {
            redirect: self.redirect.clone(),
            user: self.user.summary(),
            force_password_change: self.user.force_password_change,
        }
    }
}

/// Landing page for the caller.
pub fn redirect_for(user: Option<&User>) -> String {
    match user {
        None => LOGIN_PATH.to_string(),
        Some(user) if user.force_password_change => CHANGE_PASSWORD_PATH.to_string(),
        Some(user) => user.role.dashboard_path(),
    }
}

#[instrument(skip(state, request, client), fields(username = %request.username))]
pub async fn login(state: &AppState, request: LoginRequest, client: ClientInfo) -> Result<Session> {
    let username = request.username.trim();
    let user = state.store.user_by_username(username).await?;

    let verified = match &user {
        Some(user) => state.hasher.verify(&request.password, &user.password_hash).await,
        None => false,
    };

    state
        .store
        .record_login(NewLoginRecord {
            user_id: user.as_ref().map(|u| u.id),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            success: verified,
        })
        .await?;

    match user {
        Some(user) if verified => {
            info!(user_id = %user.id, role = %user.role, "{}", log_messages::auth::LOGIN_SUCCEEDED);
            Session::start(state, user)
        }
        _ => {
            warn!("{}", log_messages::auth::LOGIN_FAILED);
            Err(Error::InvalidCredentials)
        }
    }
}

/// Revokes every token of the account.
pub async fn logout(state: &AppState, user: Option<User>) -> Result<()> {
    if let Some(mut user) = user {
        user.revoke_sessions();
        state.store.update_user(&user).await?;
        info!(user_id = %user.id, "{}", log_messages::auth::LOGGED_OUT);
    }
    Ok(())
}

/// Sets a new password without asking for the old one. Used by the forced
/// change after a reset; revokes older tokens and returns a fresh session.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(state: &AppState, mut user: User, new_password: &str) -> Result<Session> {
    let password = NewPassword::parse(new_password)?;
    user.password_hash = state.hasher.hash(&password).await?;
    user.force_password_change = false;
    user.revoke_sessions();
    state.store.update_user(&user).await?;
    state
        .audit(NewAuditEntry::new(
            user.id,
            actions::PASSWORD_CHANGED,
            "users",
            Some(user.id.into_inner()),
        ))
        .await;
    info!("{}", log_messages::auth::PASSWORD_CHANGED);
    Session::start(state, user)
}

/// Like [`change_password`] but the caller must prove the current password.
pub async fn change_password_checked(
    state: &AppState,
    user: User,
    current_password: &str,
    new_password: &str,
) -> Result<Session> {
    if !state.hasher.verify(current_password, &user.password_hash).await {
        return Err(Error::validation("current password is incorrect"));
    }
    change_password(state, user, new_password).await
}

/// Account behind a token, if the token is genuine and still current.
pub async fn resolve_session(state: &AppState, token: &str) -> Option<User> {
    let claims = match state.tokens.decode(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err, "{}", log_messages::auth::TOKEN_REJECTED);
            return None;
        }
    };
    let user = state.store.user(claims.user_id()?).await.ok().flatten()?;
    if user.token_version != claims.ver {
        debug!(user_id = %user.id, "{}", log_messages::auth::TOKEN_REJECTED);
        return None;
    }
    Some(user)
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

pub async fn health(state: &AppState) -> HealthReport {
    let database = match state.store.health_check().await {
        Ok(()) => "ok",
        Err(err) => {
            warn!(error = %err, "{}", log_messages::database::HEALTH_CHECK_FAILED);
            "unavailable"
        }
    };
    HealthReport {
        status: if database == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    }
}
