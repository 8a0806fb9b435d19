//! Web gateway for the tokenizer: static assets plus an `/api` proxy.

mod assets;
mod config;
mod error;
mod proxy;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Args;
use server::{create_router, GatewayState};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let addr = args.listen_addr()?;

    if !args.root.join("index.html").exists() {
        tracing::warn!(root = %args.root.display(), "asset root has no index.html");
    }

    let state = GatewayState::new(args.root.clone(), &args.backend_base(), args.proxy_timeout())
        .context("Failed to build proxy client")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        addr = %addr,
        root = %args.root.display(),
        backend = %args.backend_base(),
        "Tokenizer gateway listening"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
