use std::sync::Arc;

use log::warn;
use token_verify::VerifiedClaims;

use crate::config::GuardConfig;

/// Predicate the gateway applies to every authenticated request.
///
/// Implementations must be cheap: the check runs inline in the middleware
/// stack, once per request.
pub trait GatewayPolicy: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Whether the given claims may proceed
    fn allows(&self, claims: &VerifiedClaims) -> bool;
}

/// Default policy: any verified token passes.
pub struct AllowAll;

impl GatewayPolicy for AllowAll {
    fn name(&self) -> &'static str {
        "allow-all"
    }

    fn allows(&self, _claims: &VerifiedClaims) -> bool {
        true
    }
}

/// Requires a specific claim to hold a specific value.
///
/// "scope" compares against the (space-delimited or array) scope claim,
/// "sub" against the subject, anything else against the flattened extra
/// claims by string equality.
pub struct RequireClaim {
    claim: String,
    value: String,
}

impl RequireClaim {
    /// Parses a "claim=value" requirement string.
    pub fn parse(requirement: &str) -> Option<Self> {
        let (claim, value) = requirement.split_once('=')?;
        if claim.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            claim: claim.to_string(),
            value: value.to_string(),
        })
    }
}

impl GatewayPolicy for RequireClaim {
    fn name(&self) -> &'static str {
        "require-claim"
    }

    fn allows(&self, claims: &VerifiedClaims) -> bool {
        match self.claim.as_str() {
            "scope" => claims.has_scope(&self.value),
            "sub" => claims.sub.as_deref() == Some(self.value.as_str()),
            other => claims
                .extra
                .get(other)
                .and_then(|v| v.as_str())
                .map(|v| v == self.value)
                .unwrap_or(false),
        }
    }
}

/// Builds the configured policy, falling back to AllowAll when the
/// requirement string is absent or malformed.
pub fn from_settings(config: &GuardConfig) -> Arc<dyn GatewayPolicy> {
    match config.require_claim.as_deref() {
        None => Arc::new(AllowAll),
        Some(requirement) => match RequireClaim::parse(requirement) {
            Some(policy) => Arc::new(policy),
            None => {
                warn!("Ignoring malformed WG_GATEWAY_REQUIRE_CLAIM value '{requirement}' (expected claim=value)");
                Arc::new(AllowAll)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_with_scope(scope: &str) -> VerifiedClaims {
        serde_json::from_value(json!({
            "iss": "http://localhost:5001",
            "aud": "api",
            "exp": 4102444800u64,
            "sub": "alice",
            "scope": scope,
            "department": "ops",
        }))
        .unwrap()
    }

    #[test]
    fn test_allow_all_passes_everything() {
        let claims = claims_with_scope("");
        assert!(AllowAll.allows(&claims));
    }

    #[test]
    fn test_require_scope() {
        let policy = RequireClaim::parse("scope=weatherget").unwrap();
        assert!(policy.allows(&claims_with_scope("openid api weatherget")));
        assert!(!policy.allows(&claims_with_scope("openid api")));
    }

    #[test]
    fn test_require_subject() {
        let policy = RequireClaim::parse("sub=alice").unwrap();
        assert!(policy.allows(&claims_with_scope("api")));

        let policy = RequireClaim::parse("sub=bob").unwrap();
        assert!(!policy.allows(&claims_with_scope("api")));
    }

    #[test]
    fn test_require_custom_claim() {
        let policy = RequireClaim::parse("department=ops").unwrap();
        assert!(policy.allows(&claims_with_scope("api")));

        let policy = RequireClaim::parse("department=sales").unwrap();
        assert!(!policy.allows(&claims_with_scope("api")));

        let policy = RequireClaim::parse("missing=value").unwrap();
        assert!(!policy.allows(&claims_with_scope("api")));
    }

    #[test]
    fn test_malformed_requirement_falls_back_to_allow_all() {
        assert!(RequireClaim::parse("no-equals-sign").is_none());
        assert!(RequireClaim::parse("=value").is_none());
        assert!(RequireClaim::parse("claim=").is_none());

        let config = GuardConfig {
            require_claim: Some("garbage".to_string()),
            ..GuardConfig::default()
        };
        let policy = from_settings(&config);
        assert_eq!(policy.name(), "allow-all");

        let config = GuardConfig {
            require_claim: Some("scope=weatherget".to_string()),
            ..GuardConfig::default()
        };
        let policy = from_settings(&config);
        assert_eq!(policy.name(), "require-claim");
    }
}
