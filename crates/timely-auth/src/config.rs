//! Client-side OAuth configuration.

use std::time::Duration;

use crate::error::{AuthError, Result};

/// Provider authorization endpoint.
pub const ASANA_AUTHORIZE_URL: &str = "https://app.asana.com/-/oauth_authorize";

/// Provider REST API base.
pub const ASANA_API_BASE: &str = "https://app.asana.com/api/1.0";

/// Token exchange proxy used during local development.
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/auth/token";

/// Default timeout for every outbound request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names. There is exactly one name per setting.
pub const ENV_CLIENT_ID: &str = "ASANA_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "ASANA_REDIRECT_URI";
pub const ENV_PERSONAL_TOKEN: &str = "ASANA_TOKEN";
pub const ENV_PROXY_URL: &str = "TIMELY_PROXY_URL";

/// Everything the session store needs to know about the provider and proxy.
///
/// The client secret is deliberately absent; it only lives in the proxy.
#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub proxy_url: String,
    pub api_base_url: String,
    pub scope: String,
    pub request_timeout: Duration,
    /// Long-lived token used by `login_with_token` when none is passed in.
    pub personal_access_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("proxy_url", &self.proxy_url)
            .field("api_base_url", &self.api_base_url)
            .field("scope", &self.scope)
            .field("request_timeout", &self.request_timeout)
            .field(
                "personal_access_token",
                &self.personal_access_token.as_ref().map(|_| "****"),
            )
            .finish()
    }
}

impl AuthConfig {
    /// Create a config for the Asana provider with the default proxy location.
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            authorize_url: ASANA_AUTHORIZE_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            api_base_url: ASANA_API_BASE.to_string(),
            scope: "default".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            personal_access_token: None,
        }
    }

    /// Load from the process environment.
    ///
    /// `ASANA_CLIENT_ID` and `ASANA_REDIRECT_URI` are required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = [ENV_CLIENT_ID, ENV_REDIRECT_URI]
            .into_iter()
            .filter(|name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::Config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let mut config = Self::new(
            get(ENV_CLIENT_ID).unwrap_or_default(),
            get(ENV_REDIRECT_URI).unwrap_or_default(),
        );
        if let Some(proxy_url) = get(ENV_PROXY_URL) {
            config.proxy_url = proxy_url;
        }
        config.personal_access_token = get(ENV_PERSONAL_TOKEN);
        Ok(config)
    }

    /// Set the token exchange proxy endpoint.
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = url.into();
        self
    }

    /// Set the provider API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the provider authorization endpoint.
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Set the timeout applied to each outbound request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the fallback personal access token.
    pub fn with_personal_access_token(mut self, token: impl Into<String>) -> Self {
        self.personal_access_token = Some(token.into());
        self
    }

    /// The "current user" endpoint.
    pub fn current_user_url(&self) -> String {
        format!("{}/users/me", self.api_base_url)
    }
}
