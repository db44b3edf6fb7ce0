//! # Reporter
//!
//! Client side of the bus tracker: acquires positions from a
//! [`contracts::LocationSource`] and ships them to the registry without
//! blocking the acquisition loop.
//!
//! ## Pipeline
//!
//! ```text
//! LocationSource -> Reporter (floors, gate) -> on_sample -> UploadQueue -> PositionTransport
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let transport = HttpTransport::from_config(&config)?;
//! let uploads = UploadQueue::spawn(transport, config.queue_capacity, config.max_in_flight);
//! let reporter = Arc::new(Reporter::new(source, ReporterSettings::from(&config), uploads));
//! let session = SessionController::new(reporter, config.interval());
//! session.start("42")?;
//! ```

mod error;
mod http;
mod reporter;
mod session;
mod simulated;
mod upload;

#[cfg(test)]
mod test_support;

pub use error::ReporterError;
pub use http::HttpTransport;
pub use reporter::{Reporter, ReporterSettings, UpdateHandle};
pub use session::SessionController;
pub use simulated::{SimulatedConfig, SimulatedLocationSource};
pub use upload::{UploadJob, UploadMetrics, UploadQueue, UploadSnapshot};
