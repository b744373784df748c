//! OAuth 2.0 authorization-code flow against Asana, via the token exchange proxy.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::session::Profile;

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL the user is sent to.
pub fn build_authorization_url(config: &AuthConfig, state: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("state", state),
        ("scope", config.scope.as_str()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Grant sent to the token exchange proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenGrant {
    AuthorizationCode { code: String },
    RefreshToken { refresh_token: String },
}

impl TokenGrant {
    fn label(&self) -> &'static str {
        match self {
            TokenGrant::AuthorizationCode { .. } => "Token exchange",
            TokenGrant::RefreshToken { .. } => "Token refresh",
        }
    }
}

/// Token payload relayed by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error payload relayed by the proxy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProxyErrorBody {
    fn describe(&self) -> Option<String> {
        let error = self.error.as_deref()?;
        let detail = self.error_description.as_deref().or(self.message.as_deref());
        Some(match detail {
            Some(detail) => format!("{}: {}", error, detail),
            None => error.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    data: Profile,
}

/// POST a grant to the proxy and parse the token payload.
pub async fn request_tokens(
    client: &reqwest::Client,
    config: &AuthConfig,
    grant: &TokenGrant,
) -> Result<TokenResponse> {
    let response = client
        .post(&config.proxy_url)
        .json(grant)
        .send()
        .await
        .map_err(|e| AuthError::network(grant.label(), &e))?;

    let status = response.status();
    if !status.is_success() {
        let body: ProxyErrorBody = response.json().await.unwrap_or_default();
        let detail = body.describe().unwrap_or_else(|| "Unknown error".to_string());
        return Err(AuthError::Upstream {
            status: status.as_u16(),
            message: format!("{} failed ({}): {}", grant.label(), status.as_u16(), detail),
        });
    }

    response.json().await.map_err(|e| {
        AuthError::Serialization(format!("Failed to parse {} response: {}", grant.label(), e))
    })
}

/// Fetch the profile of the user owning `access_token`.
pub async fn fetch_current_user(
    client: &reqwest::Client,
    config: &AuthConfig,
    access_token: &str,
) -> Result<Profile> {
    let response = client
        .get(config.current_user_url())
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError::network("User", &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Upstream {
            status: status.as_u16(),
            message: format!("Failed to fetch user profile ({})", status.as_u16()),
        });
    }

    let envelope: UserEnvelope = response
        .json()
        .await
        .map_err(|e| AuthError::Serialization(format!("Failed to parse user profile: {}", e)))?;
    Ok(envelope.data)
}
