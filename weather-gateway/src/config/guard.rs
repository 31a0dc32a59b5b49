use serde::Deserialize;

/// Configuration for the authorization gateway middleware
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GuardConfig {
    /// Path whose request bodies are captured and logged (default: /message)
    #[serde(default)]
    pub message_path: String,

    /// Path of the token-gated event stream (default: /sse)
    #[serde(default)]
    pub sse_path: String,

    /// Whether the event stream requires an Authorization header. The
    /// upstream demo shipped with this check disabled, so the default is
    /// off; it guards a sensitive transport, so it is a config flag rather
    /// than a code change.
    #[serde(default)]
    pub enforce_sse_token: bool,

    /// Optional gateway-wide claim requirement in "claim=value" form,
    /// applied to every authenticated request (default: none, allow all)
    #[serde(default)]
    pub require_claim: Option<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            message_path: "/message".to_string(),
            sse_path: "/sse".to_string(),
            enforce_sse_token: false,
            require_claim: None,
        }
    }
}

impl GuardConfig {
    /// Creates a new configuration from environment variables
    pub fn from_env(config: &Self) -> Self {
        // Start with the provided configuration
        let mut result = config.clone();

        if let Ok(path) = std::env::var("WG_GATEWAY_MESSAGE_PATH") {
            result.message_path = path;
        }
        if let Ok(path) = std::env::var("WG_GATEWAY_SSE_PATH") {
            result.sse_path = path;
        }
        if let Ok(enforce) = std::env::var("WG_GATEWAY_ENFORCE_SSE_TOKEN") {
            if let Ok(parsed) = enforce.parse::<bool>() {
                result.enforce_sse_token = parsed;
            }
        }
        if let Ok(claim) = std::env::var("WG_GATEWAY_REQUIRE_CLAIM") {
            result.require_claim = if claim.is_empty() { None } else { Some(claim) };
        }

        result
    }
}
