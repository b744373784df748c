//! Common test utilities for proxy integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::oneshot;
use tokio::time::timeout;
use wiremock::MockServer;

use timely_proxy::{Credentials, ProviderCredentials, ProxyConfig, ProxyServer};

pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const CLIENT_SECRET: &str = "integration-secret";

/// A proxy running in the background, with a mock provider behind it.
pub struct TestProxy {
    /// The proxy's address.
    pub addr: SocketAddr,
    /// HTTP client for talking to the proxy.
    pub client: Client,
    /// Mock standing in for the provider's token endpoint and API.
    pub provider: MockServer,
    _shutdown: oneshot::Sender<()>,
}

impl TestProxy {
    /// Start a proxy with working credentials.
    pub async fn start() -> Result<Self> {
        Self::start_with(Credentials::Ready(ProviderCredentials {
            client_id: "client-1".to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            redirect_uri: "http://localhost:5173/auth/callback".to_string(),
        }))
        .await
    }

    /// Start a proxy with the given credentials.
    pub async fn start_with(credentials: Credentials) -> Result<Self> {
        let provider = MockServer::start().await;

        let config = ProxyConfig::new(credentials)
            .with_bind_addr("127.0.0.1:0".parse()?)
            .with_token_url(format!("{}/-/oauth_token", provider.uri()))
            .with_upstream_timeout(Duration::from_secs(2));

        let (tx, rx) = oneshot::channel::<()>();
        let addr = ProxyServer::new(config)?
            .run_with_shutdown(async move {
                rx.await.ok();
            })
            .await?;

        let client = Client::new();
        wait_for_proxy(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            provider,
            _shutdown: tx,
        })
    }

    /// Base URL of the proxy.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL of the token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url(), timely_proxy::TOKEN_PATH)
    }
}

/// Wait for the proxy to answer its health check.
async fn wait_for_proxy(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let ready = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => break,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    if ready.is_err() {
        anyhow::bail!("Timeout waiting for proxy to start");
    }
    Ok(())
}
