use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures while constructing the issuer itself.
#[derive(Error, Debug)]
pub enum IssuerError {
    #[error("failed to generate signing key: {0}")]
    KeyGeneration(String),

    #[error("failed to encode signing key: {0}")]
    KeyEncoding(String),

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("invalid registry: {0}")]
    Registry(#[from] crate::registry::RegistryError),
}

/// OAuth2 protocol error, rendered as the standard
/// `{"error": ..., "error_description": ...}` envelope.
#[derive(Debug, Clone)]
pub struct OAuthError {
    pub error: &'static str,
    pub description: String,
    pub status: StatusCode,
}

impl OAuthError {
    pub fn invalid_request<S: ToString>(description: S) -> Self {
        Self {
            error: "invalid_request",
            description: description.to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_client<S: ToString>(description: S) -> Self {
        Self {
            error: "invalid_client",
            description: description.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn unauthorized_client<S: ToString>(description: S) -> Self {
        Self {
            error: "unauthorized_client",
            description: description.to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_grant<S: ToString>(description: S) -> Self {
        Self {
            error: "invalid_grant",
            description: description.to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_scope<S: ToString>(description: S) -> Self {
        Self {
            error: "invalid_scope",
            description: description.to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unsupported_grant_type<S: ToString>(description: S) -> Self {
        Self {
            error: "unsupported_grant_type",
            description: description.to_string(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn server_error<S: ToString>(description: S) -> Self {
        Self {
            error: "server_error",
            description: description.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "error_description": self.description,
        });
        (self.status, Json(body)).into_response()
    }
}
