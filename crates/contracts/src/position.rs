//! Position data model
//!
//! `LocationFix` (source output) -> `PositionSample` (tagged, validated)
//! -> `PositionRecord` (registry-resident).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{is_valid_latitude, is_valid_longitude};
use crate::{BusNumber, ContractError};

/// Raw position produced by a location source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// When the source observed the position
    pub observed_at: DateTime<Utc>,
}

impl LocationFix {
    /// Fix observed now
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            observed_at: Utc::now(),
        }
    }

    /// Age of the fix relative to `now` (zero if observed in the future)
    pub fn age_at(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.observed_at).to_std().unwrap_or_default()
    }
}

/// A fix tagged with the bus number it is shared under.
///
/// Immutable once built; only obtainable through [`PositionSample::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    bus_number: BusNumber,
    latitude: f64,
    longitude: f64,
    observed_at: DateTime<Utc>,
}

impl PositionSample {
    /// Tag a fix with a bus number.
    ///
    /// # Errors
    /// `ContractError::Validation` when the bus number is blank or a
    /// coordinate is non-finite or out of range.
    pub fn new(bus_number: BusNumber, fix: LocationFix) -> Result<Self, ContractError> {
        if bus_number.is_blank() {
            return Err(ContractError::validation(
                "busNumber",
                "bus number must not be empty",
            ));
        }
        validate_coordinates(fix.latitude, fix.longitude)?;
        Ok(Self {
            bus_number,
            latitude: fix.latitude,
            longitude: fix.longitude,
            observed_at: fix.observed_at,
        })
    }

    pub fn bus_number(&self) -> &BusNumber {
        &self.bus_number
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// Last-known position held by the registry for one bus number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// When the registry accepted the write
    pub received_at: DateTime<Utc>,
}

impl PositionRecord {
    /// Whether the record is older than `ttl` at `now`
    pub fn is_expired(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        match (now - self.received_at).to_std() {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }
}

/// Check both coordinates are finite and in range.
///
/// # Errors
/// `ContractError::Validation` naming the first offending field.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ContractError> {
    if !is_valid_latitude(latitude) {
        return Err(ContractError::validation(
            "latitude",
            format!("latitude must be within [-90, 90], got {latitude}"),
        ));
    }
    if !is_valid_longitude(longitude) {
        return Err(ContractError::validation(
            "longitude",
            format!("longitude must be within [-180, 180], got {longitude}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sample_accepts_valid_fix() {
        let sample = PositionSample::new("42".into(), LocationFix::now(48.85, 2.35)).unwrap();
        assert_eq!(sample.bus_number(), &BusNumber::from("42"));
        assert_eq!(sample.latitude(), 48.85);
        assert_eq!(sample.longitude(), 2.35);
    }

    #[test]
    fn test_sample_rejects_blank_bus_number() {
        let err = PositionSample::new("".into(), LocationFix::now(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, ContractError::Validation { ref field, .. } if field == "busNumber"));
    }

    #[test]
    fn test_sample_rejects_out_of_range() {
        let err = PositionSample::new("1".into(), LocationFix::now(91.0, 0.0)).unwrap_err();
        assert!(matches!(err, ContractError::Validation { ref field, .. } if field == "latitude"));

        let err = PositionSample::new("1".into(), LocationFix::now(0.0, -181.0)).unwrap_err();
        assert!(matches!(err, ContractError::Validation { ref field, .. } if field == "longitude"));
    }

    #[test]
    fn test_record_expiry() {
        let now = Utc::now();
        let record = PositionRecord {
            latitude: 0.0,
            longitude: 0.0,
            received_at: now - Duration::seconds(10),
        };
        assert!(record.is_expired(std::time::Duration::from_secs(5), now));
        assert!(!record.is_expired(std::time::Duration::from_secs(30), now));
    }

    #[test]
    fn test_fix_age() {
        let now = Utc::now();
        let fix = LocationFix {
            latitude: 0.0,
            longitude: 0.0,
            observed_at: now - Duration::milliseconds(1500),
        };
        assert_eq!(fix.age_at(now).as_millis(), 1500);
    }
}
