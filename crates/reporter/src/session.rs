//! SessionController - "currently broadcasting under bus number X"

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, instrument, warn};

use contracts::{
    BusNumber, ContractError, LocationFix, LocationSource, PositionSample, PositionTransport,
    SampleCallback,
};

use crate::error::ReporterError;
use crate::reporter::{Reporter, UpdateHandle};

struct ActiveSession {
    bus_number: BusNumber,
    handle: UpdateHandle,
}

/// Owns at most one sharing session at a time
pub struct SessionController<S> {
    reporter: Arc<Reporter<S>>,
    interval: Duration,
    active: Mutex<Option<ActiveSession>>,
}

impl<S> SessionController<S>
where
    S: LocationSource + Sync + 'static,
{
    pub fn new(reporter: Arc<Reporter<S>>, interval: Duration) -> Self {
        Self {
            reporter,
            interval,
            active: Mutex::new(None),
        }
    }

    pub fn reporter(&self) -> &Arc<Reporter<S>> {
        &self.reporter
    }

    /// Start sharing under `bus_number`.
    ///
    /// Any running session is torn down first; if the bus number changes,
    /// a stop-sharing request is queued for the old one. If the new session
    /// cannot start, the old bus number is stopped as well so no record is
    /// left behind on the registry.
    ///
    /// # Errors
    /// `Validation` for a blank bus number, `CapabilityDenied` when the
    /// location permission is missing.
    #[instrument(name = "session_start", skip(self))]
    pub fn start(&self, bus_number: &str) -> Result<(), ReporterError> {
        let bus_number = BusNumber::parse(bus_number)
            .map_err(|_| ReporterError::validation("busNumber", "bus number must not be empty"))?;

        let mut active = self.lock();
        // still shared on the registry under this number, with no session
        let mut orphaned = None;
        if let Some(previous) = active.take() {
            self.reporter.stop_updates(Some(&previous.handle));
            if previous.bus_number != bus_number {
                self.reporter.cancel_sharing(previous.bus_number);
            } else {
                orphaned = Some(previous.bus_number);
            }
        }

        let reporter = Arc::clone(&self.reporter);
        let tag = bus_number.clone();
        let on_sample: SampleCallback = Arc::new(move |fix: LocationFix| {
            match PositionSample::new(tag.clone(), fix) {
                Ok(sample) => reporter.submit_sample(sample),
                Err(e) => warn!(bus_number = %tag, error = %e, "Discarding invalid fix"),
            }
        });

        let handle = match self.reporter.start_updates(self.interval, on_sample) {
            Ok(handle) => handle,
            Err(e) => {
                if let Some(orphaned) = orphaned {
                    warn!(bus_number = %orphaned, error = %e, "Restart failed, sharing stopped");
                    self.reporter.cancel_sharing(orphaned);
                }
                return Err(e);
            }
        };
        info!(bus_number = %bus_number, "Sharing started");
        *active = Some(ActiveSession { bus_number, handle });
        Ok(())
    }

    /// Stop updates and queue a stop-sharing request. No-op when idle.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&self) {
        let Some(previous) = self.lock().take() else {
            return;
        };
        self.reporter.stop_updates(Some(&previous.handle));
        info!(bus_number = %previous.bus_number, "Sharing stopped");
        self.reporter.cancel_sharing(previous.bus_number);
    }

    /// Stop updates, drain the upload queue, then stop sharing through
    /// `transport`.
    ///
    /// Unlike [`SessionController::stop`] the stop-sharing request goes out
    /// only after every queued position upload has completed, so no late
    /// position can re-create the record. The upload queue is shut down.
    ///
    /// Returns the bus number that was stopped, `None` when idle.
    #[instrument(name = "session_finish", skip(self, transport))]
    pub async fn finish<T>(&self, transport: &T) -> Result<Option<BusNumber>, ContractError>
    where
        T: PositionTransport + Sync,
    {
        let previous = self.lock().take();
        if let Some(ref previous) = previous {
            self.reporter.stop_updates(Some(&previous.handle));
        }
        self.reporter.uploads().shutdown().await;

        let Some(previous) = previous else {
            return Ok(None);
        };
        transport.stop_sharing(&previous.bus_number).await?;
        info!(bus_number = %previous.bus_number, "Sharing stopped");
        Ok(Some(previous.bus_number))
    }

    pub fn active_bus_number(&self) -> Option<BusNumber> {
        self.lock().as_ref().map(|s| s.bus_number.clone())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
