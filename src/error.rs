//! Error types for stackrelay
//!
//! This module provides the error hierarchy using thiserror. All errors can
//! be converted to RelayError for unified handling; every error is terminal
//! for the current request and nothing is retried inside the relay.

use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or invalid tenant credentials. Fatal misconfiguration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid request parameters; the client must restart the flow.
    #[error("{0}")]
    ClientRequest(String),

    /// Missing, invalid, or expired session.
    #[error("{0}")]
    Authentication(String),

    /// Session cookie could not be decrypted or validated.
    #[error("Session cookie error: {0}")]
    Session(#[from] SessionError),

    /// Non-2xx response from the provider's authorize/token API. The status
    /// and message are propagated verbatim; authorization codes are
    /// single-use so retrying would fail anyway.
    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session-codec-specific errors. Each decrypt failure mode is distinct so
/// callers can log the cause, but all of them surface as 401 to the client
/// and none carries plaintext.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("authentication tag verification failed")]
    AuthFailed,

    #[error("session envelope expired")]
    Expired,
}

/// Convenient result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Create a configuration error
    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RelayError::Config(msg.into())
    }

    /// Create a client-request error
    #[inline]
    pub fn client_request<S: Into<String>>(msg: S) -> Self {
        RelayError::ClientRequest(msg.into())
    }

    /// Create an authentication error
    #[inline]
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        RelayError::Authentication(msg.into())
    }

    /// Create a provider error from a status code and message
    #[inline]
    pub fn provider<S: Into<String>>(status: u16, message: S) -> Self {
        RelayError::Provider {
            status,
            message: message.into(),
        }
    }
}
