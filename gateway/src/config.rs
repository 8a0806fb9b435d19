use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "tokenizer-gateway",
    version,
    about = "Serves the tokenizer web assets and forwards /api requests to the backend"
)]
pub struct Args {
    /// Interface to listen on
    #[arg(long, env = "GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "GATEWAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Tokenizer backend that /api requests are forwarded to
    #[arg(short, long, env = "TOKENIZER_BACKEND_URL", default_value = "http://localhost:8080")]
    pub backend: String,

    /// Directory holding index.html, 404.html and other assets
    #[arg(short, long, env = "GATEWAY_ROOT", default_value = "public")]
    pub root: PathBuf,

    /// Seconds to wait on the backend before giving up
    #[arg(long, env = "GATEWAY_PROXY_TIMEOUT", default_value_t = 30)]
    pub proxy_timeout_secs: u64,
}

impl Args {
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        use anyhow::Context;
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs)
    }

    /// Backend base URL without a trailing slash.
    pub fn backend_base(&self) -> String {
        self.backend.trim_end_matches('/').to_string()
    }
}
