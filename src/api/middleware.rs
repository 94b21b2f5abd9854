//! Middleware implementations for the HTTP surface

use crate::api::error_response::{standard_error_response, ErrorResponse};
use crate::api::extract::{session_token, CurrentUser};
use crate::api::headers::X_REQUEST_ID;
use crate::application::accounts::resolve_session;
use crate::application::AppState;
use crate::domain::UserRole;
use crate::error::Error;
use crate::infrastructure::log_messages;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

fn fresh_request_id() -> HeaderValue {
    HeaderValue::from_str(&Uuid::now_v7().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Request ID middleware - ensures every request has a unique ID for tracing
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    // An incoming ID is kept only when it is a well-formed UUID
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .and_then(|uuid| HeaderValue::from_str(&uuid.to_string()).ok())
        .unwrap_or_else(fresh_request_id);

    request
        .headers_mut()
        .insert(X_REQUEST_ID, request_id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(X_REQUEST_ID, request_id);
    response
}

fn request_id_of(request: &Request) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Logging middleware - logs request/response details with timing
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id_of(&request);

    info!(
        request_id = request_id,
        method = %method,
        path = %path,
        "{}",
        log_messages::request_processing::REQUEST_RECEIVED
    );

    let response = next.run(request).await;

    info!(
        request_id = request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "{}",
        log_messages::request_processing::RESPONSE_RETURNED
    );

    response
}

/// Stamps the request ID on failed responses and logs them by severity.
pub async fn error_handling_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_of(&request);

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    if status.is_server_error() {
        error!(
            request_id = request_id,
            status = status.as_u16(),
            "{}",
            log_messages::request_processing::SERVER_ERROR
        );
    } else {
        warn!(
            request_id = request_id,
            status = status.as_u16(),
            "{}",
            log_messages::request_processing::CLIENT_ERROR
        );
    }

    // Rejections produced by axum itself get the same JSON shape as ours
    let mut response = match response.extensions().get::<ErrorResponse>().cloned() {
        Some(body) if body.request_id.is_none() => body
            .with_request_id(request_id.clone())
            .into_response_with_status(status),
        Some(_) => response,
        None => standard_error_response(status, Some(&request_id)),
    };
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, header_value);
    }
    response
}

/// Roles admitted to one area of the service
#[derive(Clone)]
pub struct RoleGuard {
    pub state: AppState,
    pub roles: &'static [UserRole],
}

impl RoleGuard {
    pub fn new(state: AppState, roles: &'static [UserRole]) -> Self {
        Self { state, roles }
    }
}

/// Resolves the session and admits only the guard's roles. The account is
/// handed to handlers as a [`CurrentUser`] extension.
pub async fn role_guard(State(guard): State<RoleGuard>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let user = match session_token(&parts, &guard.state.auth.cookie_name) {
        Some(token) => resolve_session(&guard.state, &token).await,
        None => None,
    };
    let Some(user) = user else {
        return Error::Unauthorized.into_response();
    };
    if !guard.roles.contains(&user.role) {
        warn!(
            user_id = %user.id,
            role = %user.role,
            path = %parts.uri.path(),
            "{}",
            log_messages::auth::ACCESS_DENIED
        );
        return Error::forbidden("access denied").into_response();
    }
    parts.extensions.insert(CurrentUser(user));
    next.run(Request::from_parts(parts, body)).await
}
