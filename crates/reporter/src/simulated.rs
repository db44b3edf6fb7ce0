//! Simulated location source
//!
//! Moves a fixed distance along a fixed heading on every fetch. Used by the
//! `share` command when no platform location service exists, and by tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{LocationFix, LocationSource, EARTH_RADIUS_M};
use tracing::trace;

/// Simulated source configuration
#[derive(Debug, Clone, Copy)]
pub struct SimulatedConfig {
    /// Starting latitude (degrees)
    pub start_latitude: f64,
    /// Starting longitude (degrees)
    pub start_longitude: f64,
    /// Distance travelled per fetch (meters)
    pub step_m: f64,
    /// Direction of travel (degrees clockwise from north)
    pub heading_deg: f64,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        // Paris, heading east
        Self {
            start_latitude: 48.8566,
            start_longitude: 2.3522,
            step_m: 10.0,
            heading_deg: 90.0,
        }
    }
}

/// Deterministic moving location source with a switchable permission
#[derive(Debug)]
pub struct SimulatedLocationSource {
    config: SimulatedConfig,
    position: Mutex<(f64, f64)>,
    last: Mutex<Option<LocationFix>>,
    permission: Arc<AtomicBool>,
    fetches: AtomicU64,
}

impl SimulatedLocationSource {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            position: Mutex::new((config.start_latitude, config.start_longitude)),
            config,
            last: Mutex::new(None),
            permission: Arc::new(AtomicBool::new(true)),
            fetches: AtomicU64::new(0),
        }
    }

    /// Grant or revoke the location permission
    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Shared switch, for flipping the permission from elsewhere
    pub fn permission_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.permission)
    }

    /// Number of `fetch_current` calls so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    fn advance(&self) -> (f64, f64) {
        let mut position = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        let (lat, lon) = *position;
        let heading = self.config.heading_deg.to_radians();
        let angular = self.config.step_m / EARTH_RADIUS_M;

        let next_lat = (lat + (angular * heading.cos()).to_degrees()).clamp(-90.0, 90.0);
        let cos_lat = lat.to_radians().cos().max(1e-9);
        let mut next_lon = lon + (angular * heading.sin() / cos_lat).to_degrees();
        if next_lon > 180.0 {
            next_lon -= 360.0;
        } else if next_lon < -180.0 {
            next_lon += 360.0;
        }

        *position = (next_lat, next_lon);
        (lat, lon)
    }
}

impl LocationSource for SimulatedLocationSource {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn last_known(&self) -> Option<LocationFix> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_current(&self) -> Option<LocationFix> {
        if !self.has_permission() {
            return None;
        }
        let n = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;
        let (latitude, longitude) = self.advance();
        let fix = LocationFix::now(latitude, longitude);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(fix);
        trace!(fetch = n, latitude, longitude, "Simulated fix");
        Some(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::haversine_m;

    #[tokio::test]
    async fn test_moves_by_step_along_heading() {
        let source = SimulatedLocationSource::new(SimulatedConfig::default());
        let a = source.fetch_current().await.expect("fix");
        let b = source.fetch_current().await.expect("fix");

        let moved = haversine_m(a.latitude, a.longitude, b.latitude, b.longitude);
        assert!((moved - 10.0).abs() < 0.05, "moved {moved}");
        assert!(b.longitude > a.longitude);
        assert!((b.latitude - a.latitude).abs() < 1e-9);
        assert_eq!(source.last_known(), Some(b));
    }

    #[tokio::test]
    async fn test_northbound_step_agrees_with_haversine() {
        let config = SimulatedConfig {
            step_m: 5_000.0,
            heading_deg: 0.0,
            ..SimulatedConfig::default()
        };
        let source = SimulatedLocationSource::new(config);
        let a = source.fetch_current().await.expect("fix");
        let b = source.fetch_current().await.expect("fix");

        // same earth model on both sides: a meridian step is exact
        let moved = haversine_m(a.latitude, a.longitude, b.latitude, b.longitude);
        assert!((moved - 5_000.0).abs() < 1e-6, "moved {moved}");
        assert_eq!(a.longitude, b.longitude);
    }

    #[tokio::test]
    async fn test_first_fix_is_start_point() {
        let config = SimulatedConfig {
            start_latitude: 5.0,
            start_longitude: -3.0,
            ..SimulatedConfig::default()
        };
        let source = SimulatedLocationSource::new(config);
        assert!(source.last_known().is_none());

        let fix = source.fetch_current().await.expect("fix");
        assert_eq!((fix.latitude, fix.longitude), (5.0, -3.0));
    }

    #[tokio::test]
    async fn test_revoked_permission_yields_nothing() {
        let source = SimulatedLocationSource::new(SimulatedConfig::default());
        source.permission_switch().store(false, Ordering::SeqCst);

        assert!(!source.has_permission());
        assert!(source.fetch_current().await.is_none());
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_longitude_wraps_at_antimeridian() {
        let config = SimulatedConfig {
            start_latitude: 0.0,
            start_longitude: 179.99995,
            step_m: 20.0,
            heading_deg: 90.0,
        };
        let source = SimulatedLocationSource::new(config);
        source.fetch_current().await;
        let wrapped = source.fetch_current().await.expect("fix");
        assert!(wrapped.longitude < 0.0);
        assert!(contracts::is_valid_longitude(wrapped.longitude));
    }
}
