//! HTTP surface: routing, extractors, middleware and error bodies

pub mod error_response;
pub mod extract;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod middleware_stack;
pub mod router;

pub use router::{build_router, build_router_with};
