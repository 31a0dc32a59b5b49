use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use log::{info, warn};

use crate::api::auth_middleware::AuthContext;
use crate::errors::{invalid_token_response, ApiError};
use crate::state::AppState;

const POLICY_DENIED_BODY: &str = "Forbidden by gateway authorization policy.";

/// Cross-cutting gateway checks, applied after token validation.
///
/// In order: authenticated requests go through the configured policy,
/// anonymous requests are logged and passed along, bodies posted to the
/// message path are captured for the request log, and the event-stream
/// path may require a token when so configured.
pub(super) async fn gateway_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match request.extensions().get::<AuthContext>() {
        Some(context) => {
            let principal = context.claims.principal().unwrap_or("<none>").to_string();
            info!("Authenticated request to {path} by '{principal}'");
            if !state.policy.allows(&context.claims) {
                warn!(
                    "Policy '{}' denied '{principal}' on {path}",
                    state.policy.name()
                );
                return (StatusCode::FORBIDDEN, POLICY_DENIED_BODY).into_response();
            }
        }
        None => {
            info!("Anonymous request to {path}; skipping gateway policy");
        }
    }

    let request = if path == state.settings.gateway.message_path {
        match capture_body(request).await {
            Ok(request) => request,
            Err(response) => return response,
        }
    } else {
        request
    };

    if path == state.settings.gateway.sse_path
        && state.settings.gateway.enforce_sse_token
        && !request.headers().contains_key(http::header::AUTHORIZATION)
    {
        warn!("Rejected tokenless request to the event stream at {path}");
        return invalid_token_response();
    }

    next.run(request).await
}

/// Buffers the request body so it can be logged, then rebuilds the request
/// with the same bytes so the handler sees an identical body.
async fn capture_body(request: Request<Body>) -> Result<Request<Body>, Response> {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read message body: {e}");
            return Err(ApiError::bad_request("Failed to read request body").into_response());
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => info!("Message body ({} bytes): {text}", bytes.len()),
        Err(_) => info!("Message body ({} bytes): <binary>", bytes.len()),
    }

    Ok(Request::from_parts(parts, Body::from(bytes)))
}
