//! Manifold orchestrator binary.
//!
//! ```bash
//! # Discover backends from the environment and serve on the default port
//! RUST_LOG=info MANIFOLD_BACKENDS="10.0.0.2:9001;10.0.0.3:9001" \
//!     cargo run --bin manifold-node
//!
//! # Explicit backend list and listen address
//! RUST_LOG=info cargo run --bin manifold-node -- \
//!     --listen 0.0.0.0:8080 --backends "10.0.0.2:9001;10.0.0.3:9001"
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use manifold_net::{bind, serve};
use manifold_types::NodeConfig;

use crate::service::OrchestratorService;

mod service;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "manifold-node",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Manifold — pipeline routing orchestrator"
)]
struct Cli {
    /// Address the RPC endpoint listens on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Semicolon-delimited backend addresses. Falls back to the
    /// MANIFOLD_BACKENDS environment variable.
    #[arg(long)]
    backends: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Default log level: INFO. Override with RUST_LOG=manifold_engine=debug etc.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = NodeConfig::resolve(cli.listen, cli.backends)?;
    info!(
        listen = %config.listen_addr,
        backends = config.backends.len(),
        "starting orchestrator"
    );

    let listener = bind(&config.listen_addr).await?;
    let service = std::sync::Arc::new(OrchestratorService::new(config));
    serve(listener, service).await?;
    Ok(())
}
