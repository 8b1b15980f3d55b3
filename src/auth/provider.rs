//! HTTP client for the provider's authorize/token API
//!
//! The provider is an opaque remote service: the relay builds its authorize
//! redirect URL and posts to its token endpoint, and any non-2xx response is
//! surfaced to the caller verbatim. No retries: authorization codes are
//! single-use, and a failed refresh likely means revocation.

use crate::config::TenantConfig;
use crate::{RelayError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

/// Token response fields shared by code exchange and refresh. Everything is
/// optional on the wire; the session layer decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub organization_uid: Option<String>,
    pub location: Option<String>,
}

/// JSON body for the authorization-code grant. The installation handshake
/// uses the same grant without a verifier.
#[derive(Debug, Serialize)]
struct CodeExchangeRequest<'a> {
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

/// Outbound client for the provider API.
pub struct ProviderClient {
    http: reqwest::Client,
    base_override: Option<String>,
}

impl ProviderClient {
    /// Create a provider client.
    ///
    /// Redirects are disabled to prevent authorization code interception.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Create a client that targets a fixed base URL instead of the
    /// region-derived provider host. Used against local mock providers.
    pub fn with_base_url(base: impl Into<String>) -> Result<Self> {
        Self::build(Some(base.into()))
    }

    fn build(base_override: Option<String>) -> Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_override,
        })
    }

    fn host(&self, cfg: &TenantConfig) -> String {
        self.base_override
            .clone()
            .unwrap_or_else(|| format!("https://{}-app.contentstack.com", cfg.region))
    }

    /// Build the browser-facing authorization URL for a tenant.
    pub fn authorize_url(
        &self,
        cfg: &TenantConfig,
        state: &str,
        code_challenge: &str,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/apps/{}/authorize",
            self.host(cfg),
            cfg.app_uid
        ))
        .map_err(|e| RelayError::config(format!("Invalid authorize URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &cfg.client_id);
            query.append_pair("redirect_uri", &cfg.redirect_uri);
            if let Some(scope) = &cfg.scope {
                query.append_pair("scope", scope);
            }
            query.append_pair("state", state);
            query.append_pair("code_challenge", code_challenge);
            query.append_pair("code_challenge_method", "S256");
        }

        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `code_verifier` is `None` for the installation handshake, which does
    /// not carry PKCE material.
    pub async fn exchange_code(
        &self,
        cfg: &TenantConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<ProviderTokens> {
        let url = format!(
            "{}/apps-api/apps/{}/tokens",
            self.host(cfg),
            cfg.app_uid
        );
        let body = CodeExchangeRequest {
            grant_type: "authorization_code",
            code,
            redirect_uri: &cfg.redirect_uri,
            client_id: &cfg.client_id,
            client_secret: &cfg.client_secret,
            code_verifier,
        };

        let resp = self.http.post(&url).json(&body).send().await?;
        Self::parse_token_response(resp).await
    }

    /// Refresh an access token. The client secret is included only when
    /// configured non-empty; PKCE-only tenants omit it.
    pub async fn refresh(&self, cfg: &TenantConfig, refresh_token: &str) -> Result<ProviderTokens> {
        let url = format!("{}/apps-api/token", self.host(cfg));

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "refresh_token"),
            ("client_id", &cfg.client_id),
            ("redirect_uri", &cfg.redirect_uri),
            ("refresh_token", refresh_token),
        ];
        if !cfg.client_secret.is_empty() {
            form.push(("client_secret", &cfg.client_secret));
        }

        let resp = self.http.post(&url).form(&form).send().await?;
        Self::parse_token_response(resp).await
    }

    async fn parse_token_response(resp: reqwest::Response) -> Result<ProviderTokens> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Turn a non-2xx provider body into an error, preferring the structured
/// `error_description`/`error` fields when present.
fn provider_error(status: StatusCode, body: &str) -> RelayError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error_description")
                .and_then(|d| d.as_str().map(String::from))
                .or_else(|| v.get("error").and_then(|e| e.as_str().map(String::from)))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Provider request failed".to_string()
            } else {
                trimmed.to_string()
            }
        });

    RelayError::provider(status.as_u16(), message)
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;
