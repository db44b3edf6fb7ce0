//! Metric recording helpers
//!
//! Registry-side: upserts, reads, stops, expiries, table size.
//! Reporter-side: upload outcomes, drops and latency.
//! Without an installed recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Record an accepted position update
pub fn record_position_upserted() {
    counter!("bus_tracker_positions_upserted_total").increment(1);
}

/// Record a position read; `hit` is false on not-found
pub fn record_position_read(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("bus_tracker_position_reads_total", "outcome" => outcome).increment(1);
}

/// Record a stop-sharing request; `hit` is false on not-found
pub fn record_sharing_stopped(hit: bool) {
    let outcome = if hit { "removed" } else { "unknown" };
    counter!("bus_tracker_sharing_stopped_total", "outcome" => outcome).increment(1);
}

/// Record records removed by expiry
pub fn record_records_expired(count: usize) {
    if count > 0 {
        counter!("bus_tracker_records_expired_total").increment(count as u64);
    }
}

/// Record current table size
pub fn record_registry_size(size: usize) {
    gauge!("bus_tracker_registry_records").set(size as f64);
}

/// Record an upload attempt outcome (`kind` = "position" | "stop_sharing")
pub fn record_upload_result(kind: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "bus_tracker_uploads_total",
        "kind" => kind,
        "status" => status
    )
    .increment(1);
}

/// Record an upload dropped because the queue was full
pub fn record_upload_dropped(kind: &'static str) {
    counter!("bus_tracker_uploads_dropped_total", "kind" => kind).increment(1);
}

/// Record upload round-trip latency
pub fn record_upload_latency_ms(latency_ms: f64) {
    histogram!("bus_tracker_upload_latency_ms").record(latency_ms);
}

/// Latency summary for end-of-run reports
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.count {
            0 => f.write_str("no samples"),
            n => write!(
                f,
                "mean {:.1} ± {:.1} [{:.1}..{:.1}] over {n}",
                self.mean, self.std_dev, self.min, self.max
            ),
        }
    }
}

/// Streaming mean/variance/min/max (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.range = Some(match self.range {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (0 below two samples)
    pub fn variance(&self) -> f64 {
        match self.count {
            0 | 1 => 0.0,
            n => self.m2 / (n - 1) as f64,
        }
    }

    pub fn summary(&self) -> StatsSummary {
        let (min, max) = self.range.unwrap_or_default();
        StatsSummary {
            count: self.count,
            min,
            max,
            mean: self.mean,
            std_dev: self.variance().sqrt(),
        }
    }
}
