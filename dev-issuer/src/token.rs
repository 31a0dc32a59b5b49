use crate::error::IssuerError;
use crate::keys::SigningKey;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What goes into a freshly minted access token.
pub struct AccessTokenRequest<'a> {
    pub issuer: &'a str,
    pub audience: &'a str,
    /// Absent for machine clients.
    pub subject: Option<&'a str>,
    pub client_id: &'a str,
    /// Space-separated granted scopes.
    pub scope: &'a str,
    pub lifetime: Duration,
}

/// Successful token-endpoint response body (RFC 6749 §5.1).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
}

/// Mints a signed RS256 access token.
pub fn mint_access_token(
    key: &SigningKey,
    request: &AccessTokenRequest<'_>,
) -> Result<String, IssuerError> {
    let now = Utc::now();
    let jti: String = {
        let bytes: [u8; 16] = OsRng.gen();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    };

    let mut claims = serde_json::json!({
        "iss": request.issuer,
        "aud": request.audience,
        "client_id": request.client_id,
        "scope": request.scope,
        "iat": now.timestamp(),
        "nbf": now.timestamp(),
        "exp": (now + request.lifetime).timestamp(),
        "jti": jti,
    });
    if let Some(subject) = request.subject {
        claims["sub"] = serde_json::Value::String(subject.to_string());
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.kid.clone());
    header.typ = Some("at+jwt".to_string());

    Ok(encode(&header, &claims, key.encoding_key())?)
}

pub fn token_response(
    key: &SigningKey,
    request: &AccessTokenRequest<'_>,
) -> Result<TokenResponse, IssuerError> {
    Ok(TokenResponse {
        access_token: mint_access_token(key, request)?,
        token_type: "Bearer".to_string(),
        expires_in: request.lifetime.num_seconds(),
        scope: request.scope.to_string(),
    })
}
