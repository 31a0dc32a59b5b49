//! # dev-issuer
//!
//! A minimal OIDC/OAuth2 token issuer for local development and integration
//! tests. It signs RS256 access tokens for two grant types:
//!
//! - **Client credentials:** machine-to-machine, authenticated by a client
//!   secret (stored hashed), no user subject.
//! - **Authorization code with PKCE:** interactive flow for a public SPA
//!   client; the login page is replaced by an immediate sign-in of a fixed
//!   demo user.
//!
//! The issuer publishes its keys at the Duende-compatible JWKS path and a
//! discovery document, so relying parties configure themselves from the
//! issuer URL alone. Everything is held in memory; nothing survives a
//! restart. Not a production identity server.

pub mod error;
pub mod handlers;
pub mod keys;
pub mod registry;
pub mod token;

pub use error::{IssuerError, OAuthError};
pub use keys::SigningKey;
pub use registry::{ApiResource, ClientRegistration, GrantType, Registry, Scope};
pub use token::{AccessTokenRequest, TokenResponse};

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A pending authorization code and everything needed to redeem it.
#[derive(Debug, Clone)]
pub(crate) struct AuthCode {
    pub client_id: String,
    pub subject: String,
    pub scope: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub expires_at: DateTime<Utc>,
}

/// Shared state of the issuer: registration data, the signing key, and the
/// in-memory authorization code store.
#[derive(Clone)]
pub struct IssuerState {
    pub issuer_url: String,
    pub audience: String,
    pub registry: Arc<Registry>,
    pub key: Arc<SigningKey>,
    pub access_token_lifetime: Duration,
    auth_codes: Arc<Mutex<HashMap<String, AuthCode>>>,
}

impl IssuerState {
    /// Builds an issuer for the given registry, validating its invariants
    /// and generating a fresh signing key.
    pub fn new(issuer_url: &str, registry: Registry) -> Result<Self, IssuerError> {
        registry.validate()?;
        Ok(Self {
            issuer_url: issuer_url.trim_end_matches('/').to_string(),
            audience: "api".to_string(),
            registry: Arc::new(registry),
            key: Arc::new(SigningKey::generate()?),
            access_token_lifetime: Duration::seconds(300),
            auth_codes: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Issuer preloaded with the demo registry.
    pub fn demo(issuer_url: &str) -> Result<Self, IssuerError> {
        Self::new(issuer_url, Registry::demo())
    }

    /// The issuer's HTTP surface, ready to serve.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/.well-known/openid-configuration", get(handlers::discovery))
            .route(
                "/.well-known/openid-configuration/jwks",
                get(handlers::jwks),
            )
            .route("/connect/authorize", get(handlers::authorize))
            .route("/connect/token", post(handlers::token))
            .with_state(self.clone())
    }

    pub(crate) fn store_auth_code(&self, code: String, auth_code: AuthCode) {
        let mut codes = self.auth_codes.lock().expect("auth code store poisoned");
        // Opportunistic cleanup keeps the demo store from growing unbounded.
        let now = Utc::now();
        codes.retain(|_, c| c.expires_at > now);
        codes.insert(code, auth_code);
    }

    /// Removes and returns the code, making every code single use.
    pub(crate) fn take_auth_code(&self, code: &str) -> Option<AuthCode> {
        self.auth_codes
            .lock()
            .expect("auth code store poisoned")
            .remove(code)
    }
}
