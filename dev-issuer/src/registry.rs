use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

/// Grant types a client may use.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
}

/// A named permission unit clients can request and resources can require.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Scope {
    pub name: String,
    pub display_name: String,
}

impl Scope {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// An API protected by the issuer, grouping the scopes it accepts.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResource {
    pub name: String,
    pub scopes: Vec<String>,
}

/// A registered client application.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_name: String,
    pub allowed_grant_types: Vec<GrantType>,
    pub allowed_scopes: Vec<String>,
    /// Base64-encoded SHA-256 digests of the client secrets. Empty for
    /// public clients.
    #[serde(default)]
    pub secret_hashes: Vec<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,
    /// Confidential clients must present a secret at the token endpoint;
    /// public (SPA) clients must not hold one.
    pub require_secret: bool,
}

impl ClientRegistration {
    pub fn allows_grant(&self, grant: GrantType) -> bool {
        self.allowed_grant_types.contains(&grant)
    }

    pub fn allows_scope(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|s| s == scope)
    }

    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    pub fn verify_secret(&self, secret: &str) -> bool {
        let presented = hash_secret(secret);
        self.secret_hashes.iter().any(|h| *h == presented)
    }
}

/// Hashes a client secret the way Duende stores them: base64 of SHA-256.
pub fn hash_secret(secret: &str) -> String {
    STANDARD.encode(Sha256::digest(secret.as_bytes()))
}

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("duplicate client id: {0}")]
    DuplicateClient(String),

    #[error("public client {0} must not hold a secret")]
    PublicClientWithSecret(String),

    #[error("confidential client {0} has no secret")]
    ConfidentialClientWithoutSecret(String),

    #[error("code-flow client {0} declares no redirect URI")]
    MissingRedirectUri(String),

    #[error("client {client_id} references unknown scope {scope}")]
    UnknownClientScope { client_id: String, scope: String },

    #[error("resource {resource} references unknown scope {scope}")]
    UnknownResourceScope { resource: String, scope: String },
}

/// Process-wide registration data: scopes, API resources and clients.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    pub scopes: Vec<Scope>,
    pub resources: Vec<ApiResource>,
    pub clients: Vec<ClientRegistration>,
}

impl Registry {
    /// The demo registry: one machine client, one interactive SPA client,
    /// one API resource covering the `api` and `weatherget` scopes.
    pub fn demo() -> Self {
        Self {
            scopes: vec![
                Scope::new("openid", "Your user identifier"),
                Scope::new("profile", "User profile"),
                Scope::new("api", "My API"),
                Scope::new("weatherget", "Get weather data"),
            ],
            resources: vec![ApiResource {
                name: "api".to_string(),
                scopes: vec!["api".to_string(), "weatherget".to_string()],
            }],
            clients: vec![
                ClientRegistration {
                    client_id: "m2m.client".to_string(),
                    client_name: "Client Credentials Client".to_string(),
                    allowed_grant_types: vec![GrantType::ClientCredentials],
                    allowed_scopes: vec!["api".to_string()],
                    secret_hashes: vec![hash_secret("511536EF-F270-4058-80CA-1C89C192F69A")],
                    redirect_uris: vec![],
                    post_logout_redirect_uris: vec![],
                    require_secret: true,
                },
                ClientRegistration {
                    client_id: "interactive".to_string(),
                    client_name: "Interactive SPA Client".to_string(),
                    allowed_grant_types: vec![GrantType::AuthorizationCode],
                    allowed_scopes: vec![
                        "openid".to_string(),
                        "profile".to_string(),
                        "api".to_string(),
                        "weatherget".to_string(),
                    ],
                    secret_hashes: vec![],
                    redirect_uris: vec!["http://localhost:5173/signin-oidc".to_string()],
                    post_logout_redirect_uris: vec![
                        "http://localhost:5173/signout-callback-oidc".to_string(),
                    ],
                    require_secret: false,
                },
            ],
        }
    }

    pub fn find_client(&self, client_id: &str) -> Option<&ClientRegistration> {
        self.clients.iter().find(|c| c.client_id == client_id)
    }

    pub fn scope_exists(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.name == name)
    }

    /// Enforces the registration invariants. Called once at startup; a
    /// failing registry is a configuration bug, not a runtime condition.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for client in &self.clients {
            if !seen.insert(client.client_id.as_str()) {
                return Err(RegistryError::DuplicateClient(client.client_id.clone()));
            }

            if client.require_secret {
                if client.secret_hashes.is_empty() {
                    return Err(RegistryError::ConfidentialClientWithoutSecret(
                        client.client_id.clone(),
                    ));
                }
            } else if !client.secret_hashes.is_empty() {
                return Err(RegistryError::PublicClientWithSecret(
                    client.client_id.clone(),
                ));
            }

            if client.allows_grant(GrantType::AuthorizationCode) && client.redirect_uris.is_empty()
            {
                return Err(RegistryError::MissingRedirectUri(client.client_id.clone()));
            }

            for scope in &client.allowed_scopes {
                if !self.scope_exists(scope) {
                    return Err(RegistryError::UnknownClientScope {
                        client_id: client.client_id.clone(),
                        scope: scope.clone(),
                    });
                }
            }
        }

        for resource in &self.resources {
            for scope in &resource.scopes {
                if !self.scope_exists(scope) {
                    return Err(RegistryError::UnknownResourceScope {
                        resource: resource.name.clone(),
                        scope: scope.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
