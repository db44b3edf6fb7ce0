//! LocationSource trait - position provider abstraction
//!
//! The platform location service is an external collaborator. The reporter
//! only needs "is the permission granted", "what is the cached position" and
//! "fetch one position now"; the periodic loop is owned by the reporter.

use std::sync::Arc;

use crate::LocationFix;

/// Callback receiving every fix delivered by an update loop.
pub type SampleCallback = Arc<dyn Fn(LocationFix) + Send + Sync>;

/// Location data source trait
///
/// Implemented by the simulated source used in the CLI and tests, and by
/// any platform binding.
#[trait_variant::make(LocationSource: Send)]
pub trait LocalLocationSource {
    /// Whether the location permission is currently granted.
    ///
    /// Queried before every acquisition; a `false` answer is reported as a
    /// capability denial, never as a panic or transport error.
    fn has_permission(&self) -> bool;

    /// Cached last-known fix, if the platform has one (may be stale)
    fn last_known(&self) -> Option<LocationFix>;

    /// One-shot, highest-accuracy fetch.
    ///
    /// Returns `None` when no position can be obtained.
    async fn fetch_current(&self) -> Option<LocationFix>;
}
