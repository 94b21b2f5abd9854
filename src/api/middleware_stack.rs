//! Middleware stack builder for clean composition

use crate::api::middleware::*;
use crate::config::ApplicationSettings;
use axum::{middleware::from_fn, Router};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Default cap on request bodies; journal pages are small JSON documents
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Builder for composing the service middleware stack
#[derive(Debug, Clone)]
pub struct MiddlewareStack {
    body_limit: usize,
    permissive_cors: bool,
}

impl Default for MiddlewareStack {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            permissive_cors: false,
        }
    }
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stack configured by the `application` settings section.
    pub fn for_application(settings: &ApplicationSettings) -> Self {
        let stack = Self::new();
        if settings.permissive_cors {
            stack.with_permissive_cors()
        } else {
            stack
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Allows cross-origin calls, for front ends served from elsewhere in development.
    pub fn with_permissive_cors(mut self) -> Self {
        self.permissive_cors = true;
        self
    }

    /// Apply the complete middleware stack to a router
    ///
    /// Outer to inner: request ID, tracing span, logging, error handling,
    /// body limit. Role checks are attached per area by the router.
    pub fn apply_to_router<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let router = router
            .layer(RequestBodyLimitLayer::new(self.body_limit))
            .layer(from_fn(error_handling_middleware))
            .layer(from_fn(logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(request_id_middleware));
        if self.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}
