//! Constants used throughout stackrelay
//!
//! Cookie names and lifetimes are part of the wire contract with embedding
//! clients and must not change without coordinating a rollout.

/// Name of the short-lived cookie carrying pending-authorization material.
pub const PRE_AUTH_COOKIE: &str = "pre_auth";

/// Name of the encrypted session cookie.
pub const SESSION_COOKIE: &str = "oauth_token";

/// Lifetime of the pending-authorization cookie (seconds).
pub const PRE_AUTH_TTL_SECS: i64 = 5 * 60;

/// Lifetime of the session cookie and its encrypted envelope (seconds).
pub const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Refresh the access token when it expires within this window (seconds).
pub const REFRESH_SKEW_SECS: i64 = 60;

/// Access token lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 8787;

/// Environment variable holding the comma-separated tenant labels.
pub const ENV_APP_LABELS: &str = "APP_LABELS";

/// Environment variable holding the base64-encoded 32-byte cookie key.
pub const ENV_COOKIE_SECRET: &str = "COOKIE_SECRET";

/// Environment variable holding the comma-separated CORS allowlist.
pub const ENV_ALLOWED_ORIGIN: &str = "ALLOWED_ORIGIN";
