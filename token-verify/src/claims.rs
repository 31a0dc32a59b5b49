use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Audience claim, which issuers serialize either as a single string or as
/// an array of strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims of a successfully validated access token.
///
/// Signature, `exp`, `iss` and `aud` have already been checked by the
/// verifier when a value of this type exists; the remaining fields are for
/// endpoint-level authorization decisions.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    pub iss: String,
    pub aud: Audience,
    pub exp: u64,
    /// Subject; absent for machine clients (client-credentials tokens).
    #[serde(default)]
    pub sub: Option<String>,
    /// Client id; Duende-style issuers set this on every token.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Granted scopes, accepted as a space-separated string or an array.
    #[serde(default, deserialize_with = "scope_string_or_seq")]
    pub scope: Vec<String>,
    /// Any further claims (e.g. profile claims) kept as raw JSON.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl VerifiedClaims {
    /// Whether the token was granted the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }

    /// Best-available principal name: the subject for user tokens, the
    /// client id for machine tokens.
    pub fn principal(&self) -> Option<&str> {
        self.sub.as_deref().or(self.client_id.as_deref())
    }
}

fn scope_string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScopeRepr {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<ScopeRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ScopeRepr::Joined(joined)) => {
            joined.split_whitespace().map(str::to_owned).collect()
        }
        Some(ScopeRepr::List(list)) => list,
    })
}
