use axum::{
    body::Bytes,
    routing::get,
    Json, Router,
};

use crate::models::MessageAck;
use crate::openapi::DIAGNOSTICS_TAG;
use crate::state::AppState;

/// Message sink used to exercise the gateway's body capture.
///
/// The gateway middleware has already read and logged the body by the time
/// this handler runs; the handler only acknowledges how many bytes arrived,
/// proving the body survived the capture intact.
#[utoipa::path(
    post,
    path = "/message",
    tag = DIAGNOSTICS_TAG,
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Body received", body = MessageAck)
    )
)]
pub(crate) async fn post_message(body: Bytes) -> Json<MessageAck> {
    Json(MessageAck {
        received: body.len(),
    })
}

/// GET variant of the message sink; there is never a body to count.
#[utoipa::path(
    get,
    path = "/message",
    tag = DIAGNOSTICS_TAG,
    responses(
        (status = 200, description = "No body received", body = MessageAck)
    )
)]
pub(crate) async fn get_message() -> Json<MessageAck> {
    Json(MessageAck { received: 0 })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/message", get(get_message).post(post_message))
}
