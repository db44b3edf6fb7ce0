//! TrackerBlueprint - Config Loader output
//!
//! Describes the registry server and the reporter. Every field has a default,
//! so an empty configuration file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Registry (server side)
    #[serde(default)]
    pub server: ServerConfig,

    /// Reporter (client side)
    #[serde(default)]
    pub reporter: ReporterConfig,
}

/// Registry server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Records older than this are treated as absent (None = never expire)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_ttl_secs: Option<u64>,

    /// Period of the background expiry sweep (only used with a TTL)
    pub sweep_interval_secs: u64,

    /// GeoJSON FeatureCollection of bus lines (None = no line geometry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            record_ttl_secs: None,
            sweep_interval_secs: 30,
            lines_path: None,
        }
    }
}

impl ServerConfig {
    pub fn record_ttl(&self) -> Option<Duration> {
        self.record_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reporter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Registry base URL (e.g. "http://localhost:10000")
    pub endpoint: String,

    /// Acquisition interval hint (ms), must be > 0
    pub interval_ms: u64,

    /// Minimum spacing between delivered fixes (ms), <= interval_ms
    pub min_update_interval_ms: u64,

    /// Minimum displacement between delivered fixes (meters)
    pub min_displacement_m: f64,

    /// Whole-request timeout for registry calls (seconds)
    pub request_timeout_secs: u64,

    /// Connect timeout for registry calls (seconds)
    pub connect_timeout_secs: u64,

    /// Bound on a one-shot location fetch (seconds)
    pub fetch_timeout_secs: u64,

    /// Cached fixes younger than this are served without a fresh fetch (ms)
    pub max_cached_age_ms: u64,

    /// Upload queue capacity; jobs beyond it are dropped
    pub queue_capacity: usize,

    /// Concurrent upload requests
    pub max_in_flight: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:10000".to_string(),
            interval_ms: 1000,
            min_update_interval_ms: 500,
            min_displacement_m: 1.0,
            request_timeout_secs: 10,
            connect_timeout_secs: 10,
            fetch_timeout_secs: 10,
            max_cached_age_ms: 30_000,
            queue_capacity: 64,
            max_in_flight: 4,
        }
    }
}

impl ReporterConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn min_update_interval(&self) -> Duration {
        Duration::from_millis(self.min_update_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn max_cached_age(&self) -> Duration {
        Duration::from_millis(self.max_cached_age_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let bp: TrackerBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.server.port, 10000);
        assert!(bp.server.record_ttl().is_none());
        assert_eq!(bp.reporter.interval(), Duration::from_secs(1));
        assert_eq!(bp.reporter.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let bp: TrackerBlueprint =
            serde_json::from_str(r#"{"server": {"port": 3000, "record_ttl_secs": 60}}"#).unwrap();
        assert_eq!(bp.server.port, 3000);
        assert_eq!(bp.server.host, "0.0.0.0");
        assert_eq!(bp.server.record_ttl(), Some(Duration::from_secs(60)));
        assert_eq!(bp.server.bind_addr(), "0.0.0.0:3000");
        assert!(bp.server.lines_path.is_none());
    }

    #[test]
    fn test_lines_path_is_optional() {
        let bp: TrackerBlueprint =
            serde_json::from_str(r#"{"server": {"lines_path": "data/light.geojson"}}"#).unwrap();
        assert_eq!(
            bp.server.lines_path.as_deref(),
            Some(std::path::Path::new("data/light.geojson"))
        );

        let json = serde_json::to_value(&TrackerBlueprint::default()).unwrap();
        assert!(json["server"].get("lines_path").is_none());
    }
}
