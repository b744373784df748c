//! Error types for the token exchange proxy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors produced while handling a token request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Method other than POST/OPTIONS.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Missing or malformed input from the caller.
    #[error("{0}")]
    InvalidRequest(String),

    /// Provider credentials are not configured.
    #[error("missing provider credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// Invalid proxy configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// The provider rejected the grant.
    #[error("Provider error ({status}): {error}")]
    Upstream {
        status: u16,
        error: String,
        description: String,
    },

    /// Network or parse failure talking to the provider.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Method Not Allowed" })),
            )
                .into_response(),
            ProxyError::InvalidRequest(message) => {
                tracing::warn!(error = %message, "Rejected token request");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ProxyError::MissingCredentials(missing) => {
                tracing::error!(?missing, "Missing provider credentials");
                server_configuration_error()
            }
            ProxyError::Config(message) => {
                tracing::error!(error = %message, "Proxy configuration error");
                server_configuration_error()
            }
            ProxyError::Upstream {
                status,
                error,
                description,
            } => {
                tracing::warn!(status, error = %error, description = %description, "Provider rejected grant");
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    status,
                    Json(json!({ "error": error, "error_description": description })),
                )
                    .into_response()
            }
            ProxyError::Transport(message) => {
                tracing::error!(error = %message, "Token exchange error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error", "message": message })),
                )
                    .into_response()
            }
        }
    }
}

fn server_configuration_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Server configuration error" })),
    )
        .into_response()
}
