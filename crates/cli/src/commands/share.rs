//! `share` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use reporter::{
    Reporter, ReporterSettings, SessionController, SimulatedConfig, SimulatedLocationSource,
    UploadQueue, UploadSnapshot,
};

use super::{registry_client, shutdown_signal};
use crate::cli::ShareArgs;

/// Execute the `share` command
pub async fn run_share(args: &ShareArgs) -> Result<()> {
    let (mut blueprint, transport) = registry_client(&args.endpoint)?;

    if let Some(interval_ms) = args.interval_ms {
        anyhow::ensure!(interval_ms > 0, "--interval-ms must be > 0");
        info!(interval_ms, "Overriding acquisition interval from CLI");
        let reporter = &mut blueprint.reporter;
        reporter.interval_ms = interval_ms;
        reporter.min_update_interval_ms = reporter.min_update_interval_ms.min(interval_ms);
    }
    let config = &blueprint.reporter;

    let defaults = SimulatedConfig::default();
    let source = SimulatedLocationSource::new(SimulatedConfig {
        start_latitude: args.start_lat.unwrap_or(defaults.start_latitude),
        start_longitude: args.start_lon.unwrap_or(defaults.start_longitude),
        step_m: args.step_m,
        heading_deg: args.heading_deg,
    });

    let stopper = transport.clone();
    let uploads = UploadQueue::spawn(transport, config.queue_capacity, config.max_in_flight);
    let reporter = Arc::new(Reporter::new(
        source,
        ReporterSettings::from(config),
        uploads,
    ));
    let session = SessionController::new(Arc::clone(&reporter), config.interval());

    session
        .start(&args.bus_number)
        .with_context(|| format!("Failed to start sharing bus '{}'", args.bus_number))?;

    info!(
        bus_number = %args.bus_number,
        endpoint = %config.endpoint,
        interval_ms = config.interval_ms,
        "Sharing position..."
    );

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = deadline => {
            info!("Sharing duration elapsed");
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping sharing...");
        }
    }

    // positions drain before the stop so the record stays removed
    match session.finish(&stopper).await {
        Ok(Some(bus_number)) => info!(bus_number = %bus_number, "Registry record removed"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to stop sharing on the registry"),
    }

    let snapshot = reporter.uploads().metrics().snapshot();
    info!(
        sent = snapshot.sent,
        failed = snapshot.failed,
        dropped = snapshot.dropped,
        "Sharing finished"
    );
    print_summary(&args.bus_number, &snapshot);
    Ok(())
}

fn print_summary(bus_number: &str, snapshot: &UploadSnapshot) {
    println!("\n=== Sharing Summary: bus {bus_number} ===\n");
    println!("  Uploads sent:    {}", snapshot.sent);
    println!("  Uploads failed:  {}", snapshot.failed);
    println!("  Uploads dropped: {}", snapshot.dropped);
    println!("  Latency (ms):    {}", snapshot.latency_ms);
    println!();
}
