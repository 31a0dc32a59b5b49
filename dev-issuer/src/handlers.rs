use crate::error::OAuthError;
use crate::registry::{ClientRegistration, GrantType};
use crate::token::{token_response, AccessTokenRequest, TokenResponse};
use crate::{AuthCode, IssuerState};
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum::{Form, Json};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{Duration, Utc};
use log::{info, warn};
use rand::rngs::OsRng;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

/// The single demo user every interactive login resolves to.
const DEMO_SUBJECT: &str = "alice";

/// Lifetime of an authorization code before it must be redeemed.
const AUTH_CODE_LIFETIME_SECS: i64 = 60;

/// OIDC discovery document (the subset the demo clients consume).
pub(crate) async fn discovery(State(state): State<IssuerState>) -> Json<serde_json::Value> {
    let issuer = state.issuer_url.trim_end_matches('/');
    Json(serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/connect/authorize"),
        "token_endpoint": format!("{issuer}/connect/token"),
        "jwks_uri": format!("{issuer}/.well-known/openid-configuration/jwks"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "client_credentials"],
        "code_challenge_methods_supported": ["S256"],
        "id_token_signing_alg_values_supported": ["RS256"],
        "scopes_supported": state.registry.scopes.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
    }))
}

pub(crate) async fn jwks(State(state): State<IssuerState>) -> Json<serde_json::Value> {
    Json(state.key.jwks_document())
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorizeParams {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code_challenge: Option<String>,
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

/// Authorization endpoint.
///
/// A real identity server renders a login page here; this demo signs the
/// fixed demo user in immediately and redirects back with a code. Client,
/// redirect URI, scopes and PKCE challenge are still validated exactly as
/// registered.
pub(crate) async fn authorize(
    State(state): State<IssuerState>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Redirect, OAuthError> {
    let client = state
        .registry
        .find_client(&params.client_id)
        .ok_or_else(|| OAuthError::invalid_client(format!("unknown client {}", params.client_id)))?;

    if !client.allows_grant(GrantType::AuthorizationCode) {
        return Err(OAuthError::unauthorized_client(
            "client is not allowed to use the authorization code flow",
        ));
    }
    // Never redirect to an unregistered URI; answer the caller directly.
    if !client.allows_redirect_uri(&params.redirect_uri) {
        return Err(OAuthError::invalid_request(format!(
            "redirect URI {} is not registered for client {}",
            params.redirect_uri, client.client_id
        )));
    }
    if params.response_type != "code" {
        return Err(OAuthError::invalid_request(format!(
            "unsupported response_type {}",
            params.response_type
        )));
    }

    let code_challenge = params
        .code_challenge
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OAuthError::invalid_request("code_challenge is required (PKCE)"))?;
    // RFC 7636 defaults an omitted method to "plain", which is not
    // supported here, so the method must be spelled out.
    match params.code_challenge_method.as_deref() {
        Some("S256") => {}
        None => {
            return Err(OAuthError::invalid_request(
                "code_challenge_method is required and must be S256",
            ))
        }
        Some(other) => {
            return Err(OAuthError::invalid_request(format!(
                "unsupported code_challenge_method {other}"
            )))
        }
    }

    let scope = resolve_scope(client, params.scope.as_deref())?;

    let code = random_hex(32);
    state.store_auth_code(
        code.clone(),
        AuthCode {
            client_id: client.client_id.clone(),
            subject: DEMO_SUBJECT.to_string(),
            scope: scope.clone(),
            redirect_uri: params.redirect_uri.clone(),
            code_challenge,
            expires_at: Utc::now() + Duration::seconds(AUTH_CODE_LIFETIME_SECS),
        },
    );
    info!(
        "issued authorization code to client {} for {}",
        client.client_id, DEMO_SUBJECT
    );

    let mut location = Url::parse(&params.redirect_uri)
        .map_err(|e| OAuthError::invalid_request(format!("invalid redirect URI: {e}")))?;
    location.query_pairs_mut().append_pair("code", &code);
    if let Some(state_param) = &params.state {
        location.query_pairs_mut().append_pair("state", state_param);
    }
    Ok(Redirect::to(location.as_str()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenForm {
    pub grant_type: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub code_verifier: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token endpoint: client-credentials and authorization-code grants.
pub(crate) async fn token(
    State(state): State<IssuerState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Result<impl IntoResponse, OAuthError> {
    let credentials = client_credentials_from(&headers, &form)?;

    match form.grant_type.as_str() {
        "client_credentials" => client_credentials_grant(&state, credentials, &form).map(Json),
        "authorization_code" => authorization_code_grant(&state, credentials, &form).map(Json),
        other => Err(OAuthError::unsupported_grant_type(format!(
            "grant type {other} is not supported"
        ))),
    }
}

/// Client id and optional secret, from HTTP Basic auth or the form body.
fn client_credentials_from(
    headers: &HeaderMap,
    form: &TokenForm,
) -> Result<(String, Option<String>), OAuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| OAuthError::invalid_request("malformed Authorization header"))?;
        if let Some(encoded) = value.strip_prefix("Basic ") {
            let decoded = STANDARD
                .decode(encoded.trim())
                .map_err(|_| OAuthError::invalid_request("malformed Basic credentials"))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|_| OAuthError::invalid_request("malformed Basic credentials"))?;
            let (id, secret) = decoded
                .split_once(':')
                .ok_or_else(|| OAuthError::invalid_request("malformed Basic credentials"))?;
            return Ok((id.to_string(), Some(secret.to_string())));
        }
    }

    let client_id = form
        .client_id
        .clone()
        .ok_or_else(|| OAuthError::invalid_request("client_id is required"))?;
    Ok((client_id, form.client_secret.clone()))
}

fn authenticate_client<'a>(
    state: &'a IssuerState,
    client_id: &str,
    secret: Option<&str>,
) -> Result<&'a ClientRegistration, OAuthError> {
    let client = state
        .registry
        .find_client(client_id)
        .ok_or_else(|| OAuthError::invalid_client(format!("unknown client {client_id}")))?;

    if client.require_secret {
        let secret = secret
            .ok_or_else(|| OAuthError::invalid_client("client secret is required"))?;
        if !client.verify_secret(secret) {
            warn!("client {client_id} presented a wrong secret");
            return Err(OAuthError::invalid_client("invalid client secret"));
        }
    }
    Ok(client)
}

/// Requested scopes, defaulting to everything the client may hold.
fn resolve_scope(
    client: &ClientRegistration,
    requested: Option<&str>,
) -> Result<String, OAuthError> {
    match requested {
        None => Ok(client.allowed_scopes.join(" ")),
        Some(requested) => {
            for scope in requested.split_whitespace() {
                if !client.allows_scope(scope) {
                    return Err(OAuthError::invalid_scope(format!(
                        "scope {scope} is not allowed for client {}",
                        client.client_id
                    )));
                }
            }
            Ok(requested.to_string())
        }
    }
}

fn client_credentials_grant(
    state: &IssuerState,
    credentials: (String, Option<String>),
    form: &TokenForm,
) -> Result<TokenResponse, OAuthError> {
    let (client_id, secret) = credentials;
    let client = authenticate_client(state, &client_id, secret.as_deref())?;

    if !client.allows_grant(GrantType::ClientCredentials) {
        return Err(OAuthError::unauthorized_client(
            "client is not allowed to use the client credentials flow",
        ));
    }

    let scope = resolve_scope(client, form.scope.as_deref())?;
    info!("issuing client-credentials token to {client_id}");

    token_response(
        &state.key,
        &AccessTokenRequest {
            issuer: state.issuer_url.trim_end_matches('/'),
            audience: &state.audience,
            subject: None,
            client_id: &client_id,
            scope: &scope,
            lifetime: state.access_token_lifetime,
        },
    )
    .map_err(|e| OAuthError::server_error(e.to_string()))
}

fn authorization_code_grant(
    state: &IssuerState,
    credentials: (String, Option<String>),
    form: &TokenForm,
) -> Result<TokenResponse, OAuthError> {
    let (client_id, secret) = credentials;
    let client = authenticate_client(state, &client_id, secret.as_deref())?;

    if !client.allows_grant(GrantType::AuthorizationCode) {
        return Err(OAuthError::unauthorized_client(
            "client is not allowed to use the authorization code flow",
        ));
    }

    let code = form
        .code
        .as_deref()
        .ok_or_else(|| OAuthError::invalid_request("code is required"))?;
    // Codes are single use: taken out of the store on first redemption.
    let auth_code = state
        .take_auth_code(code)
        .ok_or_else(|| OAuthError::invalid_grant("unknown or already redeemed code"))?;

    if auth_code.expires_at < Utc::now() {
        return Err(OAuthError::invalid_grant("authorization code has expired"));
    }
    if auth_code.client_id != client.client_id {
        return Err(OAuthError::invalid_grant(
            "code was issued to a different client",
        ));
    }
    if form.redirect_uri.as_deref() != Some(auth_code.redirect_uri.as_str()) {
        return Err(OAuthError::invalid_grant(
            "redirect_uri does not match the authorization request",
        ));
    }

    let verifier = form
        .code_verifier
        .as_deref()
        .ok_or_else(|| OAuthError::invalid_request("code_verifier is required (PKCE)"))?;
    let computed = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    if computed != auth_code.code_challenge {
        warn!("PKCE verification failed for client {client_id}");
        return Err(OAuthError::invalid_grant("PKCE verification failed"));
    }

    info!(
        "issuing authorization-code token to {} for {}",
        client_id, auth_code.subject
    );
    token_response(
        &state.key,
        &AccessTokenRequest {
            issuer: state.issuer_url.trim_end_matches('/'),
            audience: &state.audience,
            subject: Some(&auth_code.subject),
            client_id: &client_id,
            scope: &auth_code.scope,
            lifetime: state.access_token_lifetime,
        },
    )
    .map_err(|e| OAuthError::server_error(e.to_string()))
}

fn random_hex(bytes: usize) -> String {
    (0..bytes)
        .map(|_| format!("{:02x}", OsRng.gen::<u8>()))
        .collect()
}
