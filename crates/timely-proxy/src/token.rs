//! `/api/auth/token`: validate the grant, attach the secret, forward upstream.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::ProxyState;
use crate::config::{Credentials, ProviderCredentials};
use crate::error::{ProxyError, Result};

/// Body accepted from the front end.
#[derive(Debug, Deserialize)]
struct TokenRequest {
    #[serde(default = "default_grant_type")]
    grant_type: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_grant_type() -> String {
    "authorization_code".to_string()
}

/// A validated grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode(String),
    RefreshToken(String),
}

impl Grant {
    /// Parse and validate a raw request body.
    pub fn parse(body: &str) -> Result<Self> {
        let request: TokenRequest = serde_json::from_str(body)
            .map_err(|e| ProxyError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        match request.grant_type.as_str() {
            "authorization_code" => present(request.code)
                .map(Grant::AuthorizationCode)
                .ok_or_else(|| {
                    ProxyError::InvalidRequest("Authorization code is required".to_string())
                }),
            "refresh_token" => present(request.refresh_token)
                .map(Grant::RefreshToken)
                .ok_or_else(|| ProxyError::InvalidRequest("Refresh token is required".to_string())),
            other => {
                tracing::debug!(grant_type = other, "Unsupported grant type");
                Err(ProxyError::InvalidRequest("Unsupported grant type".to_string()))
            }
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode(_) => "authorization_code",
            Grant::RefreshToken(_) => "refresh_token",
        }
    }

    /// Form fields sent to the provider, secret included.
    pub fn form_params<'a>(&'a self, creds: &'a ProviderCredentials) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("grant_type", self.grant_type()),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
        ];
        match self {
            Grant::AuthorizationCode(code) => {
                params.push(("code", code.as_str()));
                params.push(("redirect_uri", creds.redirect_uri.as_str()));
            }
            Grant::RefreshToken(refresh_token) => {
                params.push(("refresh_token", refresh_token.as_str()));
            }
        }
        params
    }
}

/// Handle POST /api/auth/token
pub(crate) async fn handle_token(
    State(state): State<Arc<ProxyState>>,
    body: String,
) -> Result<Json<Value>> {
    let grant = Grant::parse(&body)?;

    let creds = match &state.config.credentials {
        Credentials::Ready(creds) => creds,
        Credentials::Missing(missing) => {
            return Err(ProxyError::MissingCredentials(missing.clone()));
        }
    };

    tracing::info!(grant_type = grant.grant_type(), "Forwarding token request");
    exchange(&state.client, &state.config.token_url, &grant, creds)
        .await
        .map(Json)
}

/// Send the grant to the provider token endpoint and shape the reply.
pub async fn exchange(
    client: &reqwest::Client,
    token_url: &str,
    grant: &Grant,
    creds: &ProviderCredentials,
) -> Result<Value> {
    let response = client
        .post(token_url)
        .form(&grant.form_params(creds))
        .send()
        .await
        .map_err(|e| ProxyError::Transport(format!("Token request failed: {}", e)))?;

    let status = response.status();
    let data: Value = response
        .json()
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to parse provider response: {}", e)))?;

    if !status.is_success() {
        let field = |name: &str, fallback: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            error: field("error", "Token exchange failed"),
            description: field("error_description", "Unknown error"),
        });
    }

    let pick = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);
    Ok(json!({
        "access_token": pick("access_token"),
        "refresh_token": pick("refresh_token"),
        "expires_in": pick("expires_in"),
        "token_type": pick("token_type"),
    }))
}

/// Handle OPTIONS /api/auth/token
pub(crate) async fn handle_preflight() -> impl IntoResponse {
    StatusCode::OK
}

/// Any other method on /api/auth/token
pub(crate) async fn handle_method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}
