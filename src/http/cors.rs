//! Cross-origin allowlist for the token endpoint
//!
//! The allowlist holds exact origins or `*.suffix` wildcard patterns. A
//! matching origin is echoed back in `Access-Control-Allow-Origin`; a
//! non-matching origin gets no ACAO header (the browser then blocks the
//! response client-side) but the request is still processed for
//! same-origin and non-browser callers.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue};

/// Whether an origin matches the allowlist.
///
/// A pattern `*.suffix` matches any origin ending in `.suffix`; anything
/// else must match exactly.
pub fn origin_allowed(origin: &str, allowlist: &[String]) -> bool {
    allowlist.iter().any(|pattern| {
        if pattern.starts_with("*.") {
            origin.ends_with(&pattern[1..])
        } else {
            pattern == origin
        }
    })
}

/// Set CORS response headers.
///
/// Credentials, methods, and headers are always advertised; the ACAO echo
/// happens only for an allowlisted origin.
pub fn apply(headers: &mut HeaderMap, origin: Option<&str>, allowlist: &[String]) {
    if let Some(origin) = origin
        && origin_allowed(origin, allowlist)
        && let Ok(value) = HeaderValue::from_str(origin)
    {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }

    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
}

#[cfg(test)]
#[path = "cors_test.rs"]
mod cors_test;
