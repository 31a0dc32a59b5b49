use serde::Deserialize;

/// Configuration for bearer-token validation
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AuthConfig {
    /// Issuer base URL tokens must come from (default: http://localhost:5001)
    #[serde(default)]
    pub issuer: String,

    /// Expected audience claim (default: "api")
    #[serde(default)]
    pub audience: String,

    /// How long fetched signing keys stay cached, in seconds (default: 300)
    #[serde(default)]
    pub jwks_ttl: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:5001".to_string(),
            audience: "api".to_string(),
            jwks_ttl: 300, // 5 minutes
        }
    }
}

impl AuthConfig {
    /// Creates a new configuration from environment variables
    pub fn from_env(config: &Self) -> Self {
        // Start with the provided configuration
        let mut result = config.clone();

        if let Ok(issuer) = std::env::var("WG_AUTH_ISSUER") {
            result.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("WG_AUTH_AUDIENCE") {
            result.audience = audience;
        }
        if let Ok(ttl) = std::env::var("WG_AUTH_JWKS_TTL") {
            if let Ok(parsed) = ttl.parse::<u64>() {
                result.jwks_ttl = parsed;
            }
        }

        result
    }
}
