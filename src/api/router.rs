//! Route table
//!
//! Session routes live at the root. Each role gets its own prefix, guarded
//! by [`role_guard`] so handlers only ever see admitted accounts.

use crate::api::handlers::{admin, curator, dean, rector, session, vice_dean};
use crate::api::headers::paths;
use crate::api::middleware::{role_guard, RoleGuard};
use crate::api::middleware_stack::MiddlewareStack;
use crate::application::AppState;
use crate::domain::UserRole;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

const ADMINS: &[UserRole] = &[UserRole::Admin];
const RECTORS: &[UserRole] = &[UserRole::Rector];
const DEANS: &[UserRole] = &[UserRole::Dean];
const VICE_DEANS: &[UserRole] = &[UserRole::ViceDean];
const CURATORS: &[UserRole] = &[UserRole::Curator];

fn guarded(state: &AppState, roles: &'static [UserRole], routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(RoleGuard::new(state.clone(), roles), role_guard))
}

/// Routes without the outer middleware stack.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(paths::ROOT, get(session::home))
        .route(paths::LOGIN, post(session::login))
        .route(paths::LOGOUT, get(session::logout).post(session::logout))
        .route(
            paths::CHANGE_PASSWORD,
            get(session::change_password_form).post(session::change_password),
        )
        .route(paths::HEALTH, get(session::health))
        .nest(UserRole::Admin.path_prefix(), guarded(&state, ADMINS, admin::routes()))
        .nest(UserRole::Rector.path_prefix(), guarded(&state, RECTORS, rector::routes()))
        .nest(UserRole::Dean.path_prefix(), guarded(&state, DEANS, dean::routes()))
        .nest(UserRole::ViceDean.path_prefix(), guarded(&state, VICE_DEANS, vice_dean::routes()))
        .nest(UserRole::Curator.path_prefix(), guarded(&state, CURATORS, curator::routes()))
        .with_state(state)
}

/// The complete service with the default middleware stack.
pub fn build_router(state: AppState) -> Router {
    build_router_with(state, MiddlewareStack::new())
}

pub fn build_router_with(state: AppState, stack: MiddlewareStack) -> Router {
    stack.apply_to_router(routes(state))
}
