//! stackrelay - multi-tenant OAuth2 PKCE relay
//!
//! Sits between a browser-based client and the Contentstack app/identity
//! provider. It issues short-lived encrypted pre-authorization state,
//! exchanges authorization codes for tokens, keeps the whole session inside
//! an encrypted cookie (no server-side session store), and lazily refreshes
//! expiring tokens on read.
//!
//! # Architecture
//!
//! - `config` resolves per-tenant credentials from an immutable environment
//!   snapshot taken at startup
//! - `auth` holds the protocol core: PKCE generation, the session cookie
//!   codec, the provider HTTP client, and the four endpoint handlers
//! - `http` wires everything into an axum router and maps errors onto
//!   JSON responses
//!
//! All durable state lives in the caller's cookie jar, so every request is
//! handled independently and the server keeps no session table.

// Core modules
pub mod constants;
pub mod error;

// Infrastructure
pub mod config;

// Protocol core
pub mod auth;

// Interface layer
pub mod http;

// Re-exports for convenience
pub use config::{Config, TenantConfig};
pub use error::{RelayError, Result, SessionError};

/// Initialize logging for the application
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "stackrelay=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
