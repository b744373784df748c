//! Proxy configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{ProxyError, Result};

/// Provider token endpoint.
pub const ASANA_TOKEN_URL: &str = "https://app.asana.com/-/oauth_token";

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default timeout for the upstream token request.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Front-end origins allowed to call the proxy from a browser.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:4173",
    "https://time-tracking-app-sigma.vercel.app",
];

/// Environment variable names. There is exactly one name per setting.
pub const ENV_CLIENT_ID: &str = "ASANA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ASANA_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "ASANA_REDIRECT_URI";
pub const ENV_ALLOWED_ORIGINS: &str = "TIMELY_ALLOWED_ORIGINS";
pub const ENV_BIND_ADDR: &str = "TIMELY_PROXY_BIND";
pub const ENV_TOKEN_URL: &str = "TIMELY_PROVIDER_TOKEN_URL";

/// Server-held OAuth client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Whether the credentials were fully configured.
///
/// A proxy with missing credentials still starts, but every token request
/// fails with a server configuration error naming what is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Ready(ProviderCredentials),
    Missing(Vec<String>),
}

impl Credentials {
    /// Resolve the three credential variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let client_id = get(ENV_CLIENT_ID);
        let client_secret = get(ENV_CLIENT_SECRET);
        let redirect_uri = get(ENV_REDIRECT_URI);

        match (client_id, client_secret, redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
                Credentials::Ready(ProviderCredentials {
                    client_id,
                    client_secret,
                    redirect_uri,
                })
            }
            (client_id, client_secret, redirect_uri) => {
                let missing = [
                    (ENV_CLIENT_ID, client_id.is_none()),
                    (ENV_CLIENT_SECRET, client_secret.is_none()),
                    (ENV_REDIRECT_URI, redirect_uri.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| name.to_string())
                .collect();
                Credentials::Missing(missing)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Credentials::Ready(_))
    }
}

/// Configuration for the proxy server.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_addr: SocketAddr,
    pub token_url: String,
    pub allowed_origins: Vec<String>,
    pub credentials: Credentials,
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    /// Create a config with the given credentials and default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            token_url: ASANA_TOKEN_URL.to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            credentials,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(Credentials::from_lookup(&lookup));

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr.parse().map_err(|e| {
                ProxyError::Config(format!("invalid {} '{}': {}", ENV_BIND_ADDR, addr, e))
            })?;
        }
        if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
            config.allowed_origins = parse_origins(&origins);
        }
        if let Some(url) = lookup(ENV_TOKEN_URL) {
            config.token_url = url;
        }
        Ok(config)
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the provider token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Replace the CORS allow-list.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set the upstream request timeout.
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Whether `origin` is on the allow-list (exact match).
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
