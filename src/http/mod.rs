//! HTTP server for stackrelay
//!
//! Wires the auth endpoints into an axum router, maps the error taxonomy
//! onto JSON responses, and runs the listener. Requests share no mutable
//! state: `AppState` is an immutable bundle of the config snapshot, the
//! session codec, and the pooled provider client.

pub mod cors;

use crate::auth::{ProviderClient, SessionCodec, create_auth_routes};
use crate::config::Config;
use crate::{RelayError, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub codec: Arc<SessionCodec>,
    pub provider: Arc<ProviderClient>,
}

impl AppState {
    /// Build shared state from a config snapshot and provider client.
    pub fn new(config: Config, provider: ProviderClient) -> Result<Self> {
        let codec = SessionCodec::new(config.cookie_secret())?;
        Ok(Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
            provider: Arc::new(provider),
        })
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct AppError(RelayError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RelayError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            RelayError::ClientRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RelayError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            RelayError::Session(e) => {
                // Never log cookie contents, only the failure mode
                tracing::debug!("Session cookie rejected: {}", e);
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            RelayError::Provider { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
            ),
            RelayError::Network(e) => {
                tracing::error!("Provider request failed: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Provider request failed".to_string(),
                )
            }
            _ => {
                tracing::error!("Internal error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<RelayError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    create_auth_routes(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new())
            .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
    )
}

/// Start the HTTP server
pub async fn start_server(config: Config, host: &str, port: u16) -> Result<()> {
    let provider = ProviderClient::new()?;
    let state = AppState::new(config, provider)?;
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| RelayError::config(format!("Invalid address {}: {}", addr, e)))?;

    tracing::info!("Starting HTTP server on {}", socket_addr);

    let listener = tokio::net::TcpListener::bind(socket_addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| RelayError::config(format!("Server error: {}", e)))?;

    Ok(())
}
