//! # Registry
//!
//! Authoritative in-memory table of the last known position of every bus,
//! served over HTTP.
//!
//! ## Endpoints
//! - `POST /api/position` records `{busNumber, latitude, longitude}`
//! - `GET /api/position/{busNumber}` returns `{latitude, longitude, timestamp}`
//! - `POST /api/stopSharing` discards the record for `{busNumber}`
//! - `GET /api/line/{code}` returns the GeoJSON feature of a bus line
//! - `GET /` describes the service
//!
//! ## Usage
//!
//! ```ignore
//! let server = RegistryServer::bind(&blueprint.server).await?;
//! server.run_until(shutdown_signal()).await?;
//! ```

mod error;
mod handlers;
mod lines;
mod router;
mod server;
mod state;
mod store;
mod sweeper;

pub use error::RegistryError;
pub use lines::LineCatalog;
pub use router::build_router;
pub use server::{RegistryHandle, RegistryServer};
pub use state::AppState;
pub use store::PositionStore;
pub use sweeper::ExpirySweeper;
