//! PKCE (RFC 7636) material for the authorization flow
//!
//! The verifier is 64 bytes of CSPRNG output, URL-safe base64 without
//! padding (well above the RFC minimum of 43 characters). Only the S256
//! challenge method is supported. The state nonce is not a PKCE parameter:
//! it binds the initiation to its callback for anti-forgery.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Verifier, challenge, and anti-forgery state for one authorization attempt.
#[derive(Debug, Clone)]
pub struct PkceMaterial {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceMaterial {
    /// Generate fresh material with a cryptographically secure RNG.
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        let state = Uuid::new_v4().to_string();
        Self {
            verifier,
            challenge,
            state,
        }
    }
}

/// Generate a random PKCE code verifier (64 bytes, base64url, no padding).
fn generate_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge: `BASE64URL(SHA256(verifier))`.
pub fn compute_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
#[path = "pkce_test.rs"]
mod pkce_test;
