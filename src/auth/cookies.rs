//! Cookie serialization and the `pre_auth` wire format
//!
//! Both relay cookies are HttpOnly, Secure, Path=/ and SameSite=None: the
//! flow is designed for a cross-origin popup, where the completion signal is
//! a `postMessage` to `window.opener`, so cookies must ride on cross-site
//! requests. Values are percent-encoded on the wire.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Pending-authorization material bridging `/auth/start` to the callback.
///
/// Serialized as JSON `{state, codeVerifier, app, t}` into the short-lived
/// `pre_auth` cookie; `t` is issuance time in unix milliseconds, carried for
/// the wire format while the cookie Max-Age is the authoritative TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAuth {
    pub state: String,
    pub code_verifier: String,
    pub app: String,
    pub t: i64,
}

impl PendingAuth {
    pub fn new(state: &str, code_verifier: &str, app: &str) -> Self {
        Self {
            state: state.to_string(),
            code_verifier: code_verifier.to_string(),
            app: app.to_string(),
            t: Utc::now().timestamp_millis(),
        }
    }
}

/// Serialize a Set-Cookie header value with the relay's security flags.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=None",
        name,
        urlencoding::encode(value),
        max_age_secs
    )
}

/// Serialize a Set-Cookie header value that clears a cookie.
pub fn clear_cookie(name: &str) -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=None",
        name
    )
}

/// Extract a named cookie's decoded value from request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(name)?.strip_prefix('='))
        .filter(|v| !v.is_empty())
        .and_then(|v| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod cookies_test;
