//! `serve` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use registry::RegistryServer;

use super::{load_blueprint, shutdown_signal};
use crate::cli::ServeArgs;
use crate::error::CliError;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;

    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding bind host from CLI");
        blueprint.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port, "Overriding bind port from CLI");
        blueprint.server.port = port;
    }
    if let Some(ttl) = args.record_ttl_secs {
        info!(ttl_secs = ttl, "Overriding record TTL from CLI");
        blueprint.server.record_ttl_secs = Some(ttl);
    }
    if let Some(ref path) = args.lines_path {
        info!(path = %path.display(), "Overriding line catalog from CLI");
        blueprint.server.lines_path = Some(path.clone());
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config(args.config.as_deref(), e))?;

    let addr = blueprint.server.bind_addr();
    let server = RegistryServer::bind(&blueprint.server)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        addr = %server.local_addr().context("Listener has no local address")?,
        record_ttl_secs = ?blueprint.server.record_ttl_secs,
        lines = server.lines().len(),
        "Starting registry..."
    );

    server
        .run_until(async {
            shutdown_signal().await;
            info!("Received shutdown signal, draining requests...");
        })
        .await
        .context("Registry server failed")?;

    info!("Bus Tracker registry finished");
    Ok(())
}
