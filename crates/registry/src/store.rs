//! PositionStore - the authoritative bus number -> record table
//!
//! One coarse mutex guards the whole table. Every operation is O(1) under
//! the lock and the lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{validate_coordinates, BusNumber, ContractError, PositionRecord};
use tracing::{debug, instrument};

use crate::error::RegistryError;

/// In-memory table of last-known positions.
///
/// With a TTL, records older than the TTL read as absent and are removed
/// lazily on access or by [`PositionStore::purge_expired`].
#[derive(Debug, Default)]
pub struct PositionStore {
    records: Mutex<HashMap<BusNumber, PositionRecord>>,
    ttl: Option<Duration>,
}

impl PositionStore {
    /// Store whose records never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with an optional record TTL
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Insert or overwrite the record for `bus_number`, stamped now
    pub fn upsert(
        &self,
        bus_number: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<PositionRecord, RegistryError> {
        self.upsert_at(bus_number, latitude, longitude, Utc::now())
    }

    /// Insert or overwrite the record for `bus_number`, stamped `now`.
    ///
    /// Validation happens before the lock is taken; an invalid request never
    /// touches the table.
    ///
    /// # Errors
    /// `Validation` for a blank bus number, a missing coordinate, or a
    /// coordinate that is non-finite or out of range.
    #[instrument(name = "store_upsert", skip(self, now), level = "debug")]
    pub fn upsert_at(
        &self,
        bus_number: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<PositionRecord, RegistryError> {
        let key = parse_key(bus_number)?;
        let latitude = latitude.ok_or_else(|| RegistryError::missing("latitude"))?;
        let longitude = longitude.ok_or_else(|| RegistryError::missing("longitude"))?;

        validate_coordinates(latitude, longitude).map_err(|e| match e {
            ContractError::Validation { field, message } => {
                RegistryError::invalid_coordinate(field, message)
            }
            other => RegistryError::invalid_coordinate("coordinates", other.to_string()),
        })?;

        let record = PositionRecord {
            latitude,
            longitude,
            received_at: now,
        };
        let size = {
            let mut records = self.lock();
            records.insert(key, record);
            records.len()
        };
        observability::record_registry_size(size);
        Ok(record)
    }

    /// Current record for `bus_number`
    pub fn read(&self, bus_number: &str) -> Result<PositionRecord, RegistryError> {
        self.read_at(bus_number, Utc::now())
    }

    /// Current record for `bus_number` as seen at `now`.
    ///
    /// # Errors
    /// `NotFound` when absent, blank or expired.
    pub fn read_at(
        &self,
        bus_number: &str,
        now: DateTime<Utc>,
    ) -> Result<PositionRecord, RegistryError> {
        let key = bus_number.trim();
        let mut records = self.lock();
        match records.get(key).copied() {
            Some(record) if self.is_expired(&record, now) => {
                records.remove(key);
                debug!(bus_number = %key, "Expired record dropped on read");
                Err(RegistryError::not_found(key))
            }
            Some(record) => Ok(record),
            None => Err(RegistryError::not_found(key)),
        }
    }

    /// Remove the record for `bus_number`
    pub fn delete(&self, bus_number: &str) -> Result<PositionRecord, RegistryError> {
        self.delete_at(bus_number, Utc::now())
    }

    /// Remove the record for `bus_number` as seen at `now`.
    ///
    /// Repeating a delete is safe: the second call reports `NotFound`.
    ///
    /// # Errors
    /// `Validation` for a blank bus number, `NotFound` when absent or expired.
    #[instrument(name = "store_delete", skip(self, now), level = "debug")]
    pub fn delete_at(
        &self,
        bus_number: &str,
        now: DateTime<Utc>,
    ) -> Result<PositionRecord, RegistryError> {
        let key = parse_key(bus_number)?;
        let (removed, size) = {
            let mut records = self.lock();
            let removed = records.remove(key.as_str());
            (removed, records.len())
        };
        observability::record_registry_size(size);

        match removed {
            Some(record) if !self.is_expired(&record, now) => Ok(record),
            _ => Err(RegistryError::not_found(key.as_str())),
        }
    }

    /// Remove every expired record, returning how many were removed.
    /// Without a TTL this is a no-op.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let (purged, size) = {
            let mut records = self.lock();
            let before = records.len();
            records.retain(|_, record| !record.is_expired(ttl, now));
            (before - records.len(), records.len())
        };
        observability::record_registry_size(size);
        purged
    }

    /// Number of stored records (expired ones included until purged)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the table, sorted by bus number
    pub fn snapshot(&self) -> Vec<(BusNumber, PositionRecord)> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn is_expired(&self, record: &PositionRecord, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| record.is_expired(ttl, now))
    }

    // A panic while holding the lock cannot leave a half-written entry:
    // inserts and removes on the map are all-or-nothing.
    fn lock(&self) -> MutexGuard<'_, HashMap<BusNumber, PositionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_key(bus_number: &str) -> Result<BusNumber, RegistryError> {
    BusNumber::parse(bus_number).map_err(|_| RegistryError::missing("busNumber"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;

    #[test]
    fn test_upsert_then_read() {
        let store = PositionStore::new();
        store.upsert("42", Some(48.85), Some(2.35)).unwrap();

        let record = store.read("42").unwrap();
        assert_eq!(record.latitude, 48.85);
        assert_eq!(record.longitude, 2.35);
    }

    #[test]
    fn test_upsert_same_value_is_idempotent() {
        let store = PositionStore::new();
        let t0 = Utc::now();
        store.upsert_at("7", Some(1.5), Some(2.5), t0).unwrap();
        store
            .upsert_at("7", Some(1.5), Some(2.5), t0 + ChronoDuration::seconds(1))
            .unwrap();

        let record = store.read("7").unwrap();
        assert_eq!((record.latitude, record.longitude), (1.5, 2.5));
        assert_eq!(record.received_at, t0 + ChronoDuration::seconds(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let store = PositionStore::new();
        store.upsert("id", Some(1.0), Some(1.0)).unwrap();
        store.upsert("id", Some(2.0), Some(2.0)).unwrap();

        let record = store.read("id").unwrap();
        assert_eq!((record.latitude, record.longitude), (2.0, 2.0));
    }

    #[test]
    fn test_delete_then_read() {
        let store = PositionStore::new();
        store.upsert("id", Some(1.0), Some(1.0)).unwrap();

        assert!(store.delete("id").is_ok());
        assert!(matches!(
            store.read("id"),
            Err(RegistryError::NotFound { .. })
        ));
        // second delete is reported, not fatal
        assert!(matches!(
            store.delete("id"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_unknown_on_empty_table() {
        let store = PositionStore::new();
        assert!(matches!(
            store.delete("ghost"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_validation_creates_nothing() {
        let store = PositionStore::new();

        let err = store.upsert("", Some(1.0), Some(1.0)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { field: Some(ref f), .. } if f == "busNumber"));

        let err = store.upsert("id", None, Some(1.0)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { field: Some(ref f), .. } if f == "latitude"));

        let err = store.upsert("id", Some(1.0), None).unwrap_err();
        assert!(matches!(err, RegistryError::Validation { field: Some(ref f), .. } if f == "longitude"));

        assert!(store.is_empty());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let store = PositionStore::new();
        assert!(store.upsert("id", Some(95.0), Some(0.0)).is_err());
        assert!(store.upsert("id", Some(f64::NAN), Some(0.0)).is_err());

        let err = store.upsert("id", Some(0.0), Some(-200.0)).unwrap_err();
        match err {
            RegistryError::Validation { reason, field, detail } => {
                assert_eq!(reason, contracts::ERR_INVALID_COORDINATES);
                assert_eq!(field.as_deref(), Some("longitude"));
                assert!(detail.contains("-200"), "detail {detail}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_blank_is_validation_error() {
        let store = PositionStore::new();
        assert!(matches!(
            store.delete("  "),
            Err(RegistryError::Validation { .. })
        ));
    }

    #[test]
    fn test_bus_number_is_trimmed() {
        let store = PositionStore::new();
        store.upsert(" 42 ", Some(1.0), Some(1.0)).unwrap();
        assert!(store.read("42").is_ok());
        assert!(store.delete("42 ").is_ok());
    }

    #[test]
    fn test_ttl_lazy_expiry_on_read() {
        let store = PositionStore::with_ttl(Some(Duration::from_secs(60)));
        let t0 = Utc::now();
        store.upsert_at("42", Some(1.0), Some(1.0), t0).unwrap();

        assert!(store.read_at("42", t0 + ChronoDuration::seconds(30)).is_ok());
        assert!(store.read_at("42", t0 + ChronoDuration::seconds(61)).is_err());
        // removed on the failed read
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_expired_reports_not_found() {
        let store = PositionStore::with_ttl(Some(Duration::from_secs(10)));
        let t0 = Utc::now();
        store.upsert_at("42", Some(1.0), Some(1.0), t0).unwrap();

        let result = store.delete_at("42", t0 + ChronoDuration::seconds(11));
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = PositionStore::with_ttl(Some(Duration::from_secs(10)));
        let t0 = Utc::now();
        store.upsert_at("old", Some(1.0), Some(1.0), t0).unwrap();
        store
            .upsert_at("fresh", Some(1.0), Some(1.0), t0 + ChronoDuration::seconds(8))
            .unwrap();

        let purged = store.purge_expired(t0 + ChronoDuration::seconds(12));
        assert_eq!(purged, 1);
        let remaining: Vec<_> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(remaining, vec![BusNumber::from("fresh")]);
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let store = PositionStore::new();
        let t0 = Utc::now();
        store.upsert_at("42", Some(1.0), Some(1.0), t0).unwrap();

        assert_eq!(store.purge_expired(t0 + ChronoDuration::days(365)), 0);
        assert!(store
            .read_at("42", t0 + ChronoDuration::days(365))
            .is_ok());
    }

    #[test]
    fn test_concurrent_writers_leave_one_submitted_value() {
        let store = Arc::new(PositionStore::new());
        let writers: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let v = i as f64;
                    store.upsert("shared", Some(v), Some(v)).unwrap();
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let record = store.read("shared").unwrap();
        assert_eq!(record.latitude, record.longitude);
        assert!((0..32).any(|i| i as f64 == record.latitude));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let store = Arc::new(PositionStore::new());
        store.upsert("42", Some(1.0), Some(1.0)).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.lock().unwrap();
            panic!("poison the table lock");
        })
        .join();

        assert!(store.read("42").is_ok());
        store.upsert("42", Some(2.0), Some(2.0)).unwrap();
        assert_eq!(store.read("42").unwrap().latitude, 2.0);
    }
}
