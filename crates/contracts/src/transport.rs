//! PositionTransport trait - reporter output interface
//!
//! Abstracts the protocol client so the upload queue can be exercised
//! without a network.

use crate::{BusNumber, ContractError, PositionRecord, PositionSample};

/// Registry protocol client trait
#[trait_variant::make(PositionTransport: Send)]
pub trait LocalPositionTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Upload one sample (`POST /api/position`)
    ///
    /// # Errors
    /// `Transport` on network failure, timeout or non-2xx status
    async fn send_position(&self, sample: &PositionSample) -> Result<(), ContractError>;

    /// Ask the registry to discard a bus number (`POST /api/stopSharing`)
    ///
    /// # Errors
    /// `NotFound` when the registry has no record, `Transport` otherwise
    async fn stop_sharing(&self, bus_number: &BusNumber) -> Result<(), ContractError>;

    /// Read the current record (`GET /api/position/{busNumber}`)
    ///
    /// # Errors
    /// `NotFound` when the registry has no record, `Transport` otherwise
    async fn fetch_position(&self, bus_number: &BusNumber)
        -> Result<PositionRecord, ContractError>;
}
