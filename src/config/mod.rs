//! Configuration management for stackrelay
//!
//! The process environment is captured once at startup into an immutable
//! snapshot; every later lookup is a pure read of that snapshot. Tenant
//! credentials live under label-prefixed keys: for label "acme" the relay
//! reads `ACME_CONTENTSTACK_REGION`, `ACME_OAUTH_CLIENT_ID`, and so on.
//! Resolution fails closed: any missing required key is an error that names
//! exactly the missing keys.

use crate::constants::{ENV_ALLOWED_ORIGIN, ENV_APP_LABELS, ENV_COOKIE_SECRET};
use crate::{RelayError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;

/// Required per-tenant credential keys, in reporting order.
const REQUIRED_TENANT_KEYS: [&str; 5] = [
    "CONTENTSTACK_REGION",
    "CONTENTSTACK_APP_UID",
    "OAUTH_CLIENT_ID",
    "OAUTH_CLIENT_SECRET",
    "OAUTH_REDIRECT_URI",
];

/// Immutable process configuration, snapshotted from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    vars: HashMap<String, String>,
    labels: Vec<String>,
    cookie_secret: Vec<u8>,
    allowed_origins: Vec<String>,
}

/// Validated credential bundle for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantConfig {
    pub label: String,
    pub region: String,
    pub app_uid: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Optional; an empty `OAUTH_SCOPE` means no scope parameter is sent.
    pub scope: Option<String>,
}

impl Config {
    /// Build configuration from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(std::env::vars().collect())
    }

    /// Build configuration from an explicit key-value snapshot.
    ///
    /// The cookie secret is validated here so a misconfigured deployment
    /// fails at startup rather than on the first callback.
    pub fn from_snapshot(vars: HashMap<String, String>) -> Result<Self> {
        let labels = split_csv(vars.get(ENV_APP_LABELS).map(String::as_str).unwrap_or(""));

        let secret_b64 = vars
            .get(ENV_COOKIE_SECRET)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::config(format!("Missing {}", ENV_COOKIE_SECRET)))?;

        let cookie_secret = BASE64
            .decode(secret_b64)
            .map_err(|e| RelayError::config(format!("{} is not valid base64: {}", ENV_COOKIE_SECRET, e)))?;
        if cookie_secret.len() != 32 {
            return Err(RelayError::config(format!(
                "{} must decode to 32 bytes, got {}",
                ENV_COOKIE_SECRET,
                cookie_secret.len()
            )));
        }

        let allowed_origins = split_csv(
            vars.get(ENV_ALLOWED_ORIGIN)
                .map(String::as_str)
                .unwrap_or(""),
        );

        Ok(Self {
            vars,
            labels,
            cookie_secret,
            allowed_origins,
        })
    }

    /// All configured tenant labels, in configuration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw 32-byte key for the session cookie codec.
    pub fn cookie_secret(&self) -> &[u8] {
        &self.cookie_secret
    }

    /// CORS allowlist: exact origins or `*.suffix` wildcard patterns.
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Resolve a tenant label from an optional request parameter.
    ///
    /// A supplied label must be one of the configured labels. With no label
    /// and exactly one configured, that one is chosen implicitly; with no
    /// label and several configured, `None` forces an explicit `?app=`.
    pub fn resolve_label(&self, requested: Option<&str>) -> Option<String> {
        if let Some(requested) = requested
            && self.labels.iter().any(|l| l == requested)
        {
            return Some(requested.to_string());
        }
        if requested.is_none() && self.labels.len() == 1 {
            return Some(self.labels[0].clone());
        }
        None
    }

    /// Fallback label for installation handshakes, which arrive with no
    /// `?app=` and no cookie: the first configured label.
    pub fn default_install_label(&self) -> Option<String> {
        self.labels.first().cloned()
    }

    /// Build the credential bundle for a tenant label.
    ///
    /// Fails with an error enumerating every missing required key.
    pub fn tenant_config(&self, label: &str) -> Result<TenantConfig> {
        let prefix = label_prefix(label);
        let lookup = |key: &str| {
            self.vars
                .get(&format!("{}_{}", prefix, key))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        let missing: Vec<String> = REQUIRED_TENANT_KEYS
            .iter()
            .filter(|key| lookup(key).is_none())
            .map(|key| format!("{}_{}", prefix, key))
            .collect();

        if !missing.is_empty() {
            return Err(RelayError::config(format!(
                "Missing env for app '{}': {}",
                label,
                missing.join(", ")
            )));
        }

        Ok(TenantConfig {
            label: label.to_string(),
            region: lookup("CONTENTSTACK_REGION").unwrap_or_default(),
            app_uid: lookup("CONTENTSTACK_APP_UID").unwrap_or_default(),
            client_id: lookup("OAUTH_CLIENT_ID").unwrap_or_default(),
            client_secret: lookup("OAUTH_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: lookup("OAUTH_REDIRECT_URI").unwrap_or_default(),
            scope: lookup("OAUTH_SCOPE"),
        })
    }
}

/// Uppercase a label and map anything outside `[A-Z0-9]` to `_`.
fn label_prefix(label: &str) -> String {
    label
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod config_test;
