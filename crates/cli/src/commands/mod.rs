//! Command implementations.

mod locate;
mod serve;
mod share;
mod stop;
mod validate;

pub use locate::run_locate;
pub use serve::run_serve;
pub use share::run_share;
pub use stop::run_stop;
pub use validate::run_validate;

use std::path::Path;

use anyhow::Result;
use contracts::TrackerBlueprint;
use reporter::HttpTransport;
use tracing::{error, info};

use crate::cli::EndpointArgs;
use crate::error::CliError;

/// Load (or default) and validate the configuration
fn load_blueprint(path: Option<&Path>) -> Result<TrackerBlueprint> {
    if let Some(path) = path {
        info!(config = %path.display(), "Loading configuration");
    }
    config_loader::ConfigLoader::load_or_default(path)
        .map_err(|e| CliError::config(path, e).into())
}

/// Configuration with `--endpoint` applied, plus a transport for it
fn registry_client(args: &EndpointArgs) -> Result<(TrackerBlueprint, HttpTransport)> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding registry endpoint from CLI");
        blueprint.reporter.endpoint = endpoint.clone();
    }
    config_loader::ConfigLoader::validate(&blueprint)
        .map_err(|e| CliError::config(args.config.as_deref(), e))?;

    let transport = HttpTransport::from_config(&blueprint.reporter)
        .map_err(|e| CliError::config(args.config.as_deref(), e))?;
    Ok((blueprint, transport))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
