mod auth_middleware;
mod gateway_middleware;
pub(crate) mod forecast;
pub(crate) mod health;
pub(crate) mod message;
pub(crate) mod sse;

use crate::api::auth_middleware::bearer_auth_middleware;
use crate::api::gateway_middleware::gateway_middleware;
use crate::state::AppState;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

/// Combines all API routes into a single router.
///
/// Layer order matters: the bearer-token middleware must run before the
/// gateway middleware so the gateway sees the verified claims, and axum
/// runs the last-added layer first.
pub(super) fn router(state: &AppState) -> Router<AppState> {
    // Permissive CORS for the browser SPA; the bearer token is the actual
    // access control.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(forecast::router())
        .merge(message::router())
        .merge(sse::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ))
        .layer(cors)
}
