use std::sync::Arc;
use std::time::Duration;

use token_verify::{Verifier, VerifierConfig};

use crate::config::Settings;
use crate::policy::{self, GatewayPolicy};

/// Shared application state for the gateway
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,
    /// Bearer-token verifier backed by the issuer's published keys
    pub verifier: Arc<Verifier>,
    /// Policy applied to authenticated requests
    pub policy: Arc<dyn GatewayPolicy>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, token_verify::VerifyError> {
        let verifier = Verifier::new(VerifierConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            jwks_ttl: Duration::from_secs(settings.auth.jwks_ttl),
        })?;
        let policy = policy::from_settings(&settings.gateway);

        Ok(Self {
            settings: Arc::new(settings),
            verifier: Arc::new(verifier),
            policy,
        })
    }
}
