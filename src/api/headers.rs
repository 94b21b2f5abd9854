//! Header names, cookie conventions and well-known paths

use ::http::header;

/// Header name for request ID used for tracing and correlation
pub const X_REQUEST_ID: &str = "x-request-id";

/// Client address as reported by a reverse proxy
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Prefix of the session token, in the cookie as well as in `Authorization`
pub const BEARER_PREFIX: &str = "Bearer ";

pub use header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, USER_AGENT};

/// Well-known paths
pub mod paths {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const CHANGE_PASSWORD: &str = "/change-password";
}

pub mod content_types {
    pub const CSV: &str = "text/csv; charset=utf-8";
}

/// Strips the optional `Bearer ` prefix (and cookie quoting) from a token.
pub fn bare_token(raw: &str) -> Option<&str> {
    let raw = raw.trim_start().trim_matches('"');
    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn header_constants_follow_conventions() {
        assert!(X_REQUEST_ID.starts_with("x-"));
        assert!(BEARER_PREFIX.ends_with(' '));
        assert!(paths::HEALTH.starts_with('/'));
        assert!(paths::CHANGE_PASSWORD.starts_with('/'));
    }

    #[rstest]
    #[case("Bearer abc.def", Some("abc.def"))]
    #[case("\"Bearer abc.def\"", Some("abc.def"))]
    #[case("abc.def", Some("abc.def"))]
    #[case("Bearer ", None)]
    #[case("", None)]
    fn bearer_prefix_is_optional(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(bare_token(raw), expected);
    }
}
