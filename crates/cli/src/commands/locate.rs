//! `locate` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use contracts::{BusNumber, PositionResponse, PositionTransport};

use super::registry_client;
use crate::cli::LocateArgs;
use crate::error::CliError;

/// Execute the `locate` command
pub async fn run_locate(args: &LocateArgs) -> Result<()> {
    let bus_number = BusNumber::parse(&args.bus_number).context("Invalid --bus-number")?;
    let (blueprint, transport) = registry_client(&args.endpoint)?;

    info!(bus_number = %bus_number, endpoint = %blueprint.reporter.endpoint, "Locating bus");
    let record = transport
        .fetch_position(&bus_number)
        .await
        .map_err(|e| CliError::registry(&blueprint.reporter.endpoint, &bus_number, e))?;

    if args.json {
        let json = serde_json::to_string_pretty(&PositionResponse::from(&record))
            .context("Failed to serialize position")?;
        println!("{json}");
    } else {
        println!("Bus {bus_number}");
        println!("  Latitude:  {:.6}", record.latitude);
        println!("  Longitude: {:.6}", record.longitude);
        println!("  Updated:   {}", record.received_at.to_rfc3339());
    }
    Ok(())
}
