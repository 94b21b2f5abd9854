//! Request extractors for the signed-in account and the client

use crate::api::headers::{bare_token, AUTHORIZATION, USER_AGENT, X_FORWARDED_FOR};
use crate::application::accounts::{resolve_session, ClientInfo};
use crate::application::AppState;
use crate::domain::User;
use crate::error::Error;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use std::convert::Infallible;
use std::net::SocketAddr;

/// Session token from the cookie, falling back to the `Authorization` header.
pub fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(token) = jar.get(cookie_name).and_then(|c| bare_token(c.value())) {
        return Some(token.to_string());
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bare_token)
        .map(str::to_string)
}

async fn lookup(parts: &mut Parts, state: &AppState) -> Option<User> {
    if let Some(CurrentUser(user)) = parts.extensions.get::<CurrentUser>() {
        return Some(user.clone());
    }
    let token = session_token(parts, &state.auth.cookie_name)?;
    resolve_session(state, &token).await
}

/// The authenticated account; anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        lookup(parts, state).await.map(CurrentUser).ok_or(Error::Unauthorized)
    }
}

/// The authenticated account, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(lookup(parts, state).await))
    }
}

/// Address and user agent of the caller, recorded in the login history.
#[derive(Debug, Clone, Default)]
pub struct Client(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|h| h.to_str().ok())
            .and_then(|list| list.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        Ok(Client(ClientInfo {
            ip_address: forwarded.or(peer),
            user_agent,
        }))
    }
}
