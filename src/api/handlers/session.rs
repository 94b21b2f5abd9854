//! Sign-in, sign-out, forced password change and health

use crate::api::extract::{Client, CurrentUser, MaybeUser};
use crate::api::headers::{paths, BEARER_PREFIX};
use crate::application::accounts::{self, HealthReport, LoginRequest, Session, SessionBody};
use crate::application::AppState;
use crate::domain::UserSummary;
use crate::error::{Error, Result};
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Redirect {
    pub redirect: String,
}

/// The session cookie: `Bearer <jwt>`, HttpOnly, SameSite=Lax, Path=/.
fn session_cookie(state: &AppState, token: &str) -> Result<Cookie<'static>> {
    let raw = format!(
        "{}={BEARER_PREFIX}{token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        state.auth.cookie_name,
        state.tokens.ttl().num_seconds()
    );
    let mut cookie = Cookie::parse(raw).map_err(|_| Error::Internal)?;
    cookie.set_secure(state.auth.cookie_secure);
    Ok(cookie)
}

fn signed_in(state: &AppState, jar: CookieJar, session: &Session) -> Result<(CookieJar, Json<SessionBody>)> {
    let jar = jar.add(session_cookie(state, &session.token)?);
    Ok((jar, Json(session.body())))
}

pub async fn home(MaybeUser(user): MaybeUser) -> Json<Redirect> {
    Json(Redirect {
        redirect: accounts::redirect_for(user.as_ref()),
    })
}

pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionBody>)> {
    let session = accounts::login(&state, request, client).await?;
    signed_in(&state, jar, &session)
}

pub async fn logout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Redirect>)> {
    accounts::logout(&state, user).await?;
    let jar = jar.remove(Cookie::build(state.auth.cookie_name.clone()).path("/"));
    Ok((
        jar,
        Json(Redirect {
            redirect: paths::LOGIN.to_string(),
        }),
    ))
}

pub async fn change_password_form(CurrentUser(user): CurrentUser) -> Json<UserSummary> {
    Json(user.summary())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPasswordForm {
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Json(form): Json<NewPasswordForm>,
) -> Result<(CookieJar, Json<SessionBody>)> {
    let session = accounts::change_password(&state, user, &form.new_password).await?;
    signed_in(&state, jar, &session)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckedPasswordForm {
    pub current_password: String,
    pub new_password: String,
}

/// Password change from inside a dashboard; the current password is required.
pub async fn change_password_checked(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Json(form): Json<CheckedPasswordForm>,
) -> Result<(CookieJar, Json<SessionBody>)> {
    let session =
        accounts::change_password_checked(&state, user, &form.current_password, &form.new_password)
            .await?;
    signed_in(&state, jar, &session)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(accounts::health(&state).await)
}
