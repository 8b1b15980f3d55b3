//! Session model and the authenticated-encryption cookie codec
//!
//! The client's cookie jar is the only session store. A `Session` is sealed
//! into an opaque AES-256-GCM blob carried by the `oauth_token` cookie and
//! every request independently decrypts and revalidates it. No code path
//! reads session fields without going through [`SessionCodec::decrypt`].

use crate::auth::provider::ProviderTokens;
use crate::constants::{DEFAULT_TOKEN_LIFETIME_SECS, REFRESH_SKEW_SECS, SESSION_TTL_SECS};
use crate::error::SessionError;
use crate::{RelayError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// How a session was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationKind {
    User,
    App,
}

/// Token material and metadata for one authenticated tenant session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Tenant label the tokens belong to.
    pub app: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Access token expiry, epoch seconds.
    pub expires_at: i64,
    /// When the current access token was obtained, epoch seconds.
    pub obtained_at: i64,
    pub authorization_kind: AuthorizationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Session {
    /// Build a session from a successful code exchange.
    ///
    /// `fallback_scope` is the configured tenant scope, used when the
    /// provider response carries none.
    pub fn from_tokens(
        app: &str,
        tokens: &ProviderTokens,
        fallback_scope: Option<&str>,
        now: i64,
    ) -> Result<Self> {
        let access_token = tokens
            .access_token
            .clone()
            .ok_or_else(|| RelayError::provider(502, "Provider response missing access_token"))?;

        Ok(Self {
            app: app.to_string(),
            access_token,
            refresh_token: tokens.refresh_token.clone(),
            token_type: tokens
                .token_type
                .clone()
                .unwrap_or_else(|| "Bearer".to_string()),
            scope: tokens
                .scope
                .clone()
                .or_else(|| fallback_scope.map(String::from)),
            expires_at: now + tokens.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
            obtained_at: now,
            authorization_kind: AuthorizationKind::User,
            organization_uid: tokens.organization_uid.clone(),
            location: tokens.location.clone(),
        })
    }

    /// Whether the access token is close enough to expiry to refresh.
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at - now < REFRESH_SKEW_SECS
    }

    /// Merge a refresh response into this session.
    ///
    /// Pure field-precedence merge: a field from the response wins when
    /// present, otherwise the old value is retained. `obtained_at` and
    /// `expires_at` always move forward.
    pub fn merge_refresh(&self, tokens: &ProviderTokens, now: i64) -> Session {
        Session {
            app: self.app.clone(),
            access_token: tokens
                .access_token
                .clone()
                .unwrap_or_else(|| self.access_token.clone()),
            refresh_token: tokens
                .refresh_token
                .clone()
                .or_else(|| self.refresh_token.clone()),
            token_type: tokens
                .token_type
                .clone()
                .unwrap_or_else(|| self.token_type.clone()),
            scope: tokens.scope.clone().or_else(|| self.scope.clone()),
            expires_at: now + tokens.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
            obtained_at: now,
            authorization_kind: self.authorization_kind,
            organization_uid: tokens
                .organization_uid
                .clone()
                .or_else(|| self.organization_uid.clone()),
            location: tokens.location.clone().or_else(|| self.location.clone()),
        }
    }
}

/// Envelope sealed inside the cookie: the session plus issuance and absolute
/// expiry timestamps, bound to a version and algorithm tag.
#[derive(Debug, Serialize, Deserialize)]
struct SealedEnvelope {
    v: u8,
    alg: String,
    iat: i64,
    exp: i64,
    session: Session,
}

const ENVELOPE_VERSION: u8 = 1;
const ENVELOPE_ALG: &str = "A256GCM";
const TOKEN_PREFIX: &str = "v1.";
const NONCE_LEN: usize = 12;

/// AES-256-GCM codec for the session cookie.
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl SessionCodec {
    /// Create a codec from the raw 32-byte server key.
    pub fn new(key: &[u8]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| RelayError::config("Cookie key must be exactly 32 bytes"))?;
        Ok(Self { cipher })
    }

    /// Seal a session into an opaque cookie value valid for 30 days.
    pub fn encrypt(&self, session: &Session) -> Result<String> {
        self.encrypt_at(session, Utc::now().timestamp())
    }

    /// Seal with an explicit issuance timestamp.
    pub fn encrypt_at(&self, session: &Session, iat: i64) -> Result<String> {
        let envelope = SealedEnvelope {
            v: ENVELOPE_VERSION,
            alg: ENVELOPE_ALG.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECS,
            session: session.clone(),
        };
        let plaintext = serde_json::to_vec(&envelope)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce), plaintext.as_ref())
            .map_err(|_| RelayError::config("Session encryption failed"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(blob)))
    }

    /// Open a cookie value, verifying the authentication tag and the
    /// embedded expiry. Failure modes are distinct (see [`SessionError`]).
    pub fn decrypt(&self, token: &str) -> Result<Session> {
        self.decrypt_at(token, Utc::now().timestamp())
    }

    fn decrypt_at(&self, token: &str, now: i64) -> Result<Session> {
        let encoded = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| SessionError::Malformed("unknown version tag".into()))?;

        let blob = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| SessionError::Malformed(format!("base64: {}", e)))?;
        if blob.len() <= NONCE_LEN {
            return Err(SessionError::Malformed("truncated ciphertext".into()).into());
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| SessionError::Malformed("bad nonce length".into()))?;

        let plaintext = self
            .cipher
            .decrypt(&Nonce::from(nonce), ciphertext)
            .map_err(|_| SessionError::AuthFailed)?;

        let envelope: SealedEnvelope = serde_json::from_slice(&plaintext)
            .map_err(|e| SessionError::Malformed(format!("envelope: {}", e)))?;
        if envelope.v != ENVELOPE_VERSION || envelope.alg != ENVELOPE_ALG {
            return Err(SessionError::Malformed("unsupported envelope".into()).into());
        }
        if envelope.exp <= now {
            return Err(SessionError::Expired.into());
        }

        Ok(envelope.session)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
