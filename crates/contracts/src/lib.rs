//! # Contracts
//!
//! Frozen interface contracts shared by the registry, the reporter and the CLI.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Fixes and samples carry the instant they were observed (`DateTime<Utc>`)
//! - Records carry the instant the registry accepted them
//! - On the wire, record timestamps are milliseconds since the Unix epoch

mod blueprint;
mod bus_number;
mod error;
mod geo;
mod location_source;
mod position;
mod transport;
mod wire;

pub use blueprint::*;
pub use bus_number::BusNumber;
pub use error::*;
pub use geo::{haversine_m, is_valid_latitude, is_valid_longitude, EARTH_RADIUS_M};
pub use location_source::{LocalLocationSource, LocationSource, SampleCallback};
pub use position::*;
pub use transport::{LocalPositionTransport, PositionTransport};
pub use wire::*;
