use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use http::request::Parts;
use log::{error, warn};
use token_verify::VerifiedClaims;

use crate::errors::invalid_token_response;
use crate::state::AppState;

/// Claims of the verified bearer token, inserted into request extensions by
/// [`bearer_auth_middleware`] and extracted by handlers that need them.
#[derive(Debug, Clone)]
pub(crate) struct AuthContext {
    pub claims: Arc<VerifiedClaims>,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(invalid_token_response)
    }
}

/// Validates the bearer token, when one is present.
///
/// Requests without an Authorization header pass through anonymously; the
/// gateway middleware and the handlers decide what anonymous requests may
/// reach. A header that is present but does not carry a valid token is
/// always a 401, regardless of route.
pub(super) async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = match request.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header,
        None => return next.run(request).await,
    };

    let token = match auth_header.to_str() {
        Ok(header_str) if header_str.len() > 7 && header_str[..7].eq_ignore_ascii_case("bearer ") => {
            header_str[7..].trim().to_string()
        }
        Ok(_) => {
            warn!("Authorization header present but not a bearer token");
            return invalid_token_response();
        }
        Err(e) => {
            warn!("Failed to parse Authorization header to string: {e}");
            return invalid_token_response();
        }
    };

    match state.verifier.verify(&token).await {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext {
                claims: Arc::new(claims),
            });
            next.run(request).await
        }
        Err(e) if e.is_upstream() => {
            // Issuer unreachable or returned garbage; the client still gets
            // the uniform 401 body, the detail goes to the logs.
            error!("Token verification failed against the issuer: {e}");
            invalid_token_response()
        }
        Err(e) => {
            warn!("Rejected bearer token: {e}");
            invalid_token_response()
        }
    }
}
