//! Mock collaborators for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{BusNumber, ContractError, PositionRecord, PositionSample, PositionTransport};

#[derive(Debug, Default)]
struct Calls {
    positions: Mutex<Vec<PositionSample>>,
    stops: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared view of what a [`RecordingTransport`] received
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Calls>);

impl CallLog {
    pub fn positions(&self) -> Vec<PositionSample> {
        self.0.positions.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<String> {
        self.0.stops.lock().unwrap().clone()
    }

    /// Completed calls in order, as `position:<bus>` / `stop:<bus>`
    pub fn events(&self) -> Vec<String> {
        self.0.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.0.events.lock().unwrap().push(event);
    }

    pub fn max_concurrency(&self) -> usize {
        self.0.peak.load(Ordering::SeqCst)
    }
}

/// Transport that records calls, optionally slow or failing
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: CallLog,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingTransport {
    /// Transport appending to an existing log
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    async fn enter(&self) -> Result<(), ContractError> {
        let calls = &self.log.0;
        let now = calls.current.fetch_add(1, Ordering::SeqCst) + 1;
        calls.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        calls.current.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            Err(ContractError::transport("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl PositionTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_position(&self, sample: &PositionSample) -> Result<(), ContractError> {
        self.enter().await?;
        self.log.0.positions.lock().unwrap().push(sample.clone());
        self.log.record(format!("position:{}", sample.bus_number()));
        Ok(())
    }

    async fn stop_sharing(&self, bus_number: &BusNumber) -> Result<(), ContractError> {
        self.enter().await?;
        self.log.0.stops.lock().unwrap().push(bus_number.to_string());
        self.log.record(format!("stop:{bus_number}"));
        Ok(())
    }

    async fn fetch_position(&self, bus_number: &BusNumber) -> Result<PositionRecord, ContractError> {
        Err(ContractError::not_found(bus_number.as_str()))
    }
}
