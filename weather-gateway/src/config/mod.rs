pub(crate) use crate::config::auth::AuthConfig;
pub(crate) use crate::config::guard::GuardConfig;
use config::{Config as ConfigCrate, ConfigError};
use serde::Deserialize;

pub mod auth;
pub mod guard;

/// Main configuration structure for the gateway
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// The port the gateway will listen to (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Token issuer / validation configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Gateway middleware configuration
    #[serde(default)]
    pub gateway: GuardConfig,
}

fn default_port() -> u16 {
    5000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port(),
            auth: AuthConfig::default(),
            gateway: GuardConfig::default(),
        }
    }
}

impl Settings {
    /// Creates a new Settings instance from environment variables
    pub fn new() -> Result<Self, String> {
        let mut settings: Settings = ConfigCrate::builder()
            .add_source(config::Environment::with_prefix("WG").prefix_separator("_"))
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())?;

        // Nested sections read their own environment variables so that
        // multi-word keys stay unambiguous.
        settings.auth = AuthConfig::from_env(&settings.auth);
        settings.gateway = GuardConfig::from_env(&settings.gateway);
        Ok(settings)
    }

    #[cfg(test)]
    pub fn for_test(issuer_url: &str) -> Self {
        Settings {
            port: 0, // Let the OS choose a port
            auth: AuthConfig {
                issuer: issuer_url.trim_end_matches('/').to_string(),
                audience: "api".to_string(),
                jwks_ttl: 300,
            },
            gateway: GuardConfig::default(),
        }
    }
}
