//! Stateless OAuth token exchange proxy for Timely.
//!
//! Front ends post an authorization code or refresh token here; the proxy
//! attaches the server-held Asana client secret, forwards the grant to the
//! provider's token endpoint and relays the result. Nothing is stored.
//!
//! # Endpoints
//!
//! - `POST /api/auth/token`: exchange or refresh
//! - `OPTIONS /api/auth/token`: CORS pre-flight
//! - `GET /health`

pub mod config;
pub mod cors;
pub mod error;
pub mod token;

pub use config::{Credentials, ProviderCredentials, ProxyConfig};
pub use error::{ProxyError, Result};
pub use token::Grant;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Path of the token endpoint.
pub const TOKEN_PATH: &str = "/api/auth/token";

/// Shared state for the proxy server.
pub struct ProxyState {
    pub(crate) config: ProxyConfig,
    pub(crate) client: reqwest::Client,
}

/// The token exchange proxy server.
pub struct ProxyServer {
    config: ProxyConfig,
    state: Arc<ProxyState>,
}

impl ProxyServer {
    /// Create a proxy server.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        if let Credentials::Missing(missing) = &config.credentials {
            tracing::error!(
                ?missing,
                "Provider credentials are not configured; token requests will fail"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            state: Arc::new(ProxyState {
                config: config.clone(),
                client,
            }),
            config,
        })
    }

    /// Build the axum router.
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                TOKEN_PATH,
                post(token::handle_token)
                    .options(token::handle_preflight)
                    .fallback(token::handle_method_not_allowed),
            )
            .route("/health", get(handle_health))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                cors::cors_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the proxy server.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Starting token exchange proxy");
        axum::serve(listener, self.router()).await
    }

    /// Run with graceful shutdown, returning the bound address.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Starting token exchange proxy");
        tokio::spawn(async move {
            axum::serve(listener, self.router())
                .with_graceful_shutdown(shutdown)
                .await
                .ok();
        });
        Ok(local_addr)
    }
}

/// Handle GET /health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "timely-proxy"
    }))
}
