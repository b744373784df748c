//! Serve command - runs the token exchange proxy.

use std::net::SocketAddr;

use anyhow::{Context as _, Result};
use clap::Args;

use timely_proxy::{ProxyConfig, ProxyServer};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override environment values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides TIMELY_PROXY_BIND)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Allowed CORS origin (can be specified multiple times)
    #[arg(long = "allow-origin")]
    pub allow_origins: Vec<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, _ctx: &Context) -> Result<()> {
    let mut config = ProxyConfig::from_env().context("Invalid proxy configuration")?;
    if let Some(bind) = args.bind {
        config = config.with_bind_addr(bind);
    }
    if !args.allow_origins.is_empty() {
        config = config.with_allowed_origins(args.allow_origins);
    }

    println!("Token exchange proxy on http://{}", config.bind_addr);
    if !config.credentials.is_ready() {
        eprintln!("warning: Asana credentials are missing; token requests will fail");
    }

    let server = ProxyServer::new(config)?;
    tokio::select! {
        result = server.run() => result.context("Proxy server failed")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
