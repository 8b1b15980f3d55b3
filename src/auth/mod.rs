//! Authorization protocol core
//!
//! Implements the relay's state machine around the provider's OAuth2
//! Authorization-Code-with-PKCE flow:
//! - **pkce**: verifier/challenge/state-nonce generation
//! - **session**: the encrypted session cookie codec and refresh merge
//! - **cookies**: Set-Cookie serialization and the `pre_auth` wire format
//! - **provider**: outbound HTTP client for the authorize/token API
//! - **handlers**: the `/auth/*` endpoints

pub mod cookies;
pub mod handlers;
pub mod pkce;
pub mod provider;
pub mod session;

pub use handlers::create_auth_routes;
pub use provider::{ProviderClient, ProviderTokens};
pub use session::{Session, SessionCodec};
