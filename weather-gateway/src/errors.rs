use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Bad Request Error (400) with a detail message
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

/// The 401 body every authentication failure maps to. Internal detail
/// (expired vs. bad signature vs. issuer unreachable) stays in the logs.
pub fn invalid_token_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_token",
            "error_description": "Missing or invalid access token",
        })),
    )
        .into_response()
}

/// 403 for an authenticated principal missing a required scope.
pub fn scope_denied_response(scope: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        format!("Forbidden: token is missing the required scope '{scope}'."),
    )
        .into_response()
}
