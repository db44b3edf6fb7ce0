//! `stop` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use contracts::{sharing_stopped_message, BusNumber, PositionTransport};

use super::registry_client;
use crate::cli::StopArgs;
use crate::error::CliError;

/// Execute the `stop` command
pub async fn run_stop(args: &StopArgs) -> Result<()> {
    let bus_number = BusNumber::parse(&args.bus_number).context("Invalid --bus-number")?;
    let (blueprint, transport) = registry_client(&args.endpoint)?;

    transport
        .stop_sharing(&bus_number)
        .await
        .map_err(|e| CliError::registry(&blueprint.reporter.endpoint, &bus_number, e))?;

    info!(bus_number = %bus_number, "Sharing stopped");
    println!("{}", sharing_stopped_message(&bus_number));
    Ok(())
}
