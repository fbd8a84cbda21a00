//! radicle-woodpecker entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** from flags and environment variables and
//!    validate it into a [`forge::ForgeConfig`]. Invalid configuration is
//!    fatal.
//! 2. **Wire observability**: `tracing-subscriber` with a JSON or pretty
//!    layer, plus an OpenTelemetry OTLP exporter when an endpoint is set.
//! 3. **Construct infrastructure**: a [`radicle::RadicleClient`] injected
//!    into [`addon::RadicleForge`].
//! 4. **Serve** the webhook and login endpoints until Ctrl-C.

mod args;
mod sink;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use forge::{ForgeConfig, HookSecret};
use listener::AppState;
use radicle::RadicleClient;
use tracing::info;

use crate::args::Args;
use crate::sink::LoggingSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format, args.otlp_endpoint.as_deref())?;

    let result = run(args).await;
    if let Err(err) = &result {
        tracing::error!(error = %err, "radicle-woodpecker stopped with an error");
    }
    telemetry.shutdown();
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let state = build_state(&args)?;

    info!(
        addr = %args.listen_addr,
        node_url = %args.node_url,
        "Starting radicle-woodpecker"
    );
    listener::run_server(args.listen_addr, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Shut down cleanly");
    Ok(())
}

/// Validates the configuration and wires the forge and sink together.
fn build_state(args: &Args) -> anyhow::Result<AppState> {
    let config = ForgeConfig::new(
        &args.node_url,
        &args.ci_url,
        HookSecret::new(args.hook_secret.as_str()),
    )
    .context("invalid configuration")?;

    let client = RadicleClient::new(config.node_url(), args.request_timeout())
        .context("failed to build the node client")?;
    let forge = Arc::new(addon::RadicleForge::new(config, Arc::new(client)));
    Ok(AppState::new(forge, Arc::new(LoggingSink)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        return;
    }
    info!("Received Ctrl-C, draining connections");
}
