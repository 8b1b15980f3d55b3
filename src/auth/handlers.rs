//! The `/auth/*` HTTP endpoints
//!
//! Four endpoints drive the whole protocol: `/auth/start` redirects the
//! browser to the provider with PKCE material parked in the `pre_auth`
//! cookie, `/auth/callback` classifies and resolves the provider's return
//! (installation handshake vs. interactive user flow), `/auth/token` reads
//! the session and lazily refreshes near-expiry tokens, and `/auth/logout`
//! clears both cookies. All cookie writes happen only after a verified 2xx
//! provider response, so a disconnect mid-exchange never leaves partial
//! session state.

use crate::auth::cookies::{self, PendingAuth};
use crate::auth::pkce::PkceMaterial;
use crate::auth::session::Session;
use crate::constants::{
    PRE_AUTH_COOKIE, PRE_AUTH_TTL_SECS, SESSION_COOKIE, SESSION_TTL_SECS,
};
use crate::http::{AppError, AppState, cors};
use crate::{RelayError, Result};
use axum::http::header::{LOCATION, ORIGIN, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, extract::Query, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;

/// Build the auth endpoint router.
pub fn create_auth_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/auth/start",
            get(handle_start).fallback(handle_method_not_allowed),
        )
        .route(
            "/auth/callback",
            get(handle_callback).fallback(handle_method_not_allowed),
        )
        .route(
            "/auth/token",
            get(handle_token)
                .options(handle_token_preflight)
                .fallback(handle_method_not_allowed),
        )
        .route("/auth/logout", get(handle_logout))
        .route("/auth/success", get(handle_success))
        .with_state(state)
}

/// Browser page returned on user-flow success: notifies the opener window
/// and closes itself, or redirects when the tab was opened directly.
const CALLBACK_COMPLETE_HTML: &str = r#"<!doctype html><html><body>
<script>
if(window.opener){try{window.opener.postMessage({type:'oauth:complete'},'*')}catch(e){};window.close();}
else{location.replace('/auth/success');}
</script>
Success. You can close this window.
</body></html>"#;

const SUCCESS_HTML: &str = r#"<!doctype html><html><body>
You are signed in. You can close this tab.
</body></html>"#;

async fn handle_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed"})),
    )
        .into_response()
}

// ============================================================================
// /auth/start — authorization initiator
// ============================================================================

#[derive(Debug, Deserialize)]
struct StartQuery {
    app: Option<String>,
}

async fn handle_start(State(state): State<AppState>, Query(query): Query<StartQuery>) -> Response {
    let Some(app) = state.config.resolve_label(query.app.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing or invalid ?app=",
                "allowed": state.config.labels(),
            })),
        )
            .into_response();
    };

    start_authorization(&state, &app).unwrap_or_else(|e| AppError::from(e).into_response())
}

fn start_authorization(state: &AppState, app: &str) -> Result<Response> {
    let cfg = state.config.tenant_config(app)?;

    let material = PkceMaterial::generate();
    let pending = PendingAuth::new(&material.state, &material.verifier, app);
    let pre_auth_cookie = cookies::set_cookie(
        PRE_AUTH_COOKIE,
        &serde_json::to_string(&pending)?,
        PRE_AUTH_TTL_SECS,
    );

    let authorize_url = state
        .provider
        .authorize_url(&cfg, &material.state, &material.challenge)?;

    tracing::info!(app, "redirecting to provider authorization");

    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (LOCATION, authorize_url.to_string()),
            (SET_COOKIE, pre_auth_cookie),
        ]),
    )
        .into_response())
}

// ============================================================================
// /auth/callback — dual-path resolver
// ============================================================================

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    installation_uid: Option<String>,
    app: Option<String>,
}

/// Unambiguous classification of a callback request, decided before any
/// business logic runs.
#[derive(Debug)]
enum CallbackKind<'a> {
    /// Provider-initiated app installation: code + installation identifier,
    /// no anti-forgery state (the handshake never left this server a cookie).
    InstallHandshake {
        code: &'a str,
        installation_uid: &'a str,
        app_override: Option<&'a str>,
    },
    /// Interactive user flow: code + state to validate against `pre_auth`.
    UserFlow { code: &'a str, state: &'a str },
    Malformed,
}

fn classify(query: &CallbackQuery) -> CallbackKind<'_> {
    match (&query.code, &query.state, &query.installation_uid) {
        (Some(code), None, Some(installation_uid)) => CallbackKind::InstallHandshake {
            code,
            installation_uid,
            app_override: query.app.as_deref(),
        },
        (Some(code), Some(state), _) => CallbackKind::UserFlow { code, state },
        _ => CallbackKind::Malformed,
    }
}

async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    match classify(&query) {
        CallbackKind::InstallHandshake {
            code,
            installation_uid,
            app_override,
        } => install_handshake(&state, code, installation_uid, app_override)
            .await
            .unwrap_or_else(|e| AppError::from(e).into_response()),
        CallbackKind::UserFlow {
            code,
            state: returned_state,
        } => user_flow(&state, &headers, code, returned_state)
            .await
            .unwrap_or_else(|e| AppError::from(e).into_response()),
        CallbackKind::Malformed => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing code/state"})),
        )
            .into_response(),
    }
}

/// Installation handshakes exchange the code without a PKCE verifier and
/// never establish a session cookie.
async fn install_handshake(
    state: &AppState,
    code: &str,
    installation_uid: &str,
    app_override: Option<&str>,
) -> Result<Response> {
    let app = state
        .config
        .resolve_label(app_override)
        .or_else(|| state.config.default_install_label())
        .ok_or_else(|| {
            RelayError::config("No app labels configured for installation callback")
        })?;
    let cfg = state.config.tenant_config(&app)?;

    state.provider.exchange_code(&cfg, code, None).await?;

    tracing::info!(app = %app, installation_uid, "installation handshake completed");

    Ok((
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "installation_uid": installation_uid,
            "region": cfg.region,
            "app": app,
            "authorization_kind": "app",
        })),
    )
        .into_response())
}

/// The interactive flow's anti-forgery gate and code exchange. No session
/// is ever created unless the callback state matches the `pre_auth` state.
async fn user_flow(
    state: &AppState,
    headers: &HeaderMap,
    code: &str,
    returned_state: &str,
) -> Result<Response> {
    let pending = cookies::cookie_value(headers, PRE_AUTH_COOKIE)
        .and_then(|raw| serde_json::from_str::<PendingAuth>(&raw).ok())
        .ok_or_else(|| RelayError::client_request("Invalid state"))?;

    // Constant-time comparison to avoid timing leaks on the nonce
    let state_matches = pending
        .state
        .as_bytes()
        .ct_eq(returned_state.as_bytes())
        .unwrap_u8()
        == 1;
    if !state_matches {
        return Err(RelayError::client_request("Invalid state"));
    }

    let cfg = state.config.tenant_config(&pending.app)?;
    let tokens = state
        .provider
        .exchange_code(&cfg, code, Some(&pending.code_verifier))
        .await?;

    let now = Utc::now().timestamp();
    let session = Session::from_tokens(&pending.app, &tokens, cfg.scope.as_deref(), now)?;
    let session_cookie = cookies::set_cookie(
        SESSION_COOKIE,
        &state.codec.encrypt(&session)?,
        SESSION_TTL_SECS,
    );

    tracing::info!(app = %pending.app, "user session established");

    Ok((
        StatusCode::OK,
        AppendHeaders([
            (SET_COOKIE, session_cookie),
            (SET_COOKIE, cookies::clear_cookie(PRE_AUTH_COOKIE)),
        ]),
        Html(CALLBACK_COMPLETE_HTML),
    )
        .into_response())
}

// ============================================================================
// /auth/token — session read with lazy refresh
// ============================================================================

async fn handle_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let origin = request_origin(&headers);
    let mut response = token_response(&state, &headers)
        .await
        .unwrap_or_else(|e| AppError::from(e).into_response());
    cors::apply(
        response.headers_mut(),
        origin.as_deref(),
        state.config.allowed_origins(),
    );
    response
}

/// Preflight short-circuit: 200 with no body once CORS headers are set.
async fn handle_token_preflight(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let origin = request_origin(&headers);
    let mut response = StatusCode::OK.into_response();
    cors::apply(
        response.headers_mut(),
        origin.as_deref(),
        state.config.allowed_origins(),
    );
    response
}

fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn token_response(state: &AppState, headers: &HeaderMap) -> Result<Response> {
    let raw = cookies::cookie_value(headers, SESSION_COOKIE)
        .ok_or_else(|| RelayError::auth("Not authenticated"))?;
    let session = state.codec.decrypt(&raw)?;

    // Resolver failure here is misconfiguration, not a client error
    let cfg = state.config.tenant_config(&session.app)?;

    let now = Utc::now().timestamp();
    let mut session = session;
    let mut reissued_cookie = None;

    if session.needs_refresh(now)
        && let Some(refresh_token) = session.refresh_token.clone()
    {
        tracing::debug!(app = %session.app, "access token near expiry, refreshing");
        let tokens = state.provider.refresh(&cfg, &refresh_token).await?;
        session = session.merge_refresh(&tokens, now);
        reissued_cookie = Some(cookies::set_cookie(
            SESSION_COOKIE,
            &state.codec.encrypt(&session)?,
            SESSION_TTL_SECS,
        ));
    }

    // The refresh token itself is never exposed to the caller
    let body = Json(json!({
        "app": session.app,
        "tokenType": session.token_type,
        "accessToken": session.access_token,
        "expiresAt": session.expires_at,
        "scope": session.scope,
        "location": session.location,
        "organizationUid": session.organization_uid,
    }));

    Ok(match reissued_cookie {
        Some(cookie) => {
            (StatusCode::OK, AppendHeaders([(SET_COOKIE, cookie)]), body).into_response()
        }
        None => (StatusCode::OK, body).into_response(),
    })
}

// ============================================================================
// /auth/logout and /auth/success
// ============================================================================

/// Unconditionally clears both cookies. Idempotent; no authentication.
async fn handle_logout() -> Response {
    (
        StatusCode::OK,
        AppendHeaders([
            (SET_COOKIE, cookies::clear_cookie(SESSION_COOKIE)),
            (SET_COOKIE, cookies::clear_cookie(PRE_AUTH_COOKIE)),
        ]),
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn handle_success() -> Html<&'static str> {
    Html(SUCCESS_HTML)
}

#[cfg(test)]
#[path = "handlers_test.rs"]
mod handlers_test;
