//! Reporter - acquires fixes and hands them to the upload queue

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use contracts::{
    haversine_m, BusNumber, LocationFix, LocationSource, PositionSample, ReporterConfig,
    SampleCallback,
};

use crate::error::ReporterError;
use crate::upload::{UploadJob, UploadQueue};

/// Acquisition tuning
#[derive(Debug, Clone, Copy)]
pub struct ReporterSettings {
    /// Minimum spacing between delivered fixes
    pub min_update_interval: Duration,
    /// Minimum displacement between delivered fixes (meters)
    pub min_displacement_m: f64,
    /// Bound on a single fetch
    pub fetch_timeout: Duration,
    /// Cached fixes younger than this skip the fetch
    pub max_cached_age: Duration,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self::from(&ReporterConfig::default())
    }
}

impl From<&ReporterConfig> for ReporterSettings {
    fn from(config: &ReporterConfig) -> Self {
        Self {
            min_update_interval: config.min_update_interval(),
            min_displacement_m: config.min_displacement_m,
            fetch_timeout: config.fetch_timeout(),
            max_cached_age: config.max_cached_age(),
        }
    }
}

/// Delivery gate shared by an update loop and its handle.
///
/// `open` is read without blocking; `delivering` is held by the loop for the
/// duration of one callback so that a cancel from another task can wait for
/// it to finish.
#[derive(Debug)]
struct Gate {
    open: AtomicBool,
    delivering: Mutex<()>,
}

impl Gate {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            delivering: Mutex::new(()),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Cancellation handle for one update loop.
///
/// Once [`UpdateHandle::cancel`] returns, the callback is never invoked again
/// for this loop. The callback itself may cancel its own loop. Dropping the
/// handle cancels the loop.
#[derive(Debug)]
pub struct UpdateHandle {
    gate: Arc<Gate>,
    task: JoinHandle<()>,
}

impl UpdateHandle {
    pub fn is_active(&self) -> bool {
        self.gate.is_open() && !self.task.is_finished()
    }

    /// Close the gate and abort the loop. Idempotent.
    pub fn cancel(&self) {
        self.gate.open.store(false, Ordering::SeqCst);
        // From inside the callback the loop re-checks the gate on return;
        // anywhere else, wait out a delivery already in progress.
        if tokio::task::try_id() != Some(self.task.id()) {
            drop(
                self.gate
                    .delivering
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }
        self.task.abort();
    }
}

impl Drop for UpdateHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Client-side location loop over a [`LocationSource`]
pub struct Reporter<S> {
    source: Arc<S>,
    settings: ReporterSettings,
    uploads: Arc<UploadQueue>,
}

impl<S> Reporter<S>
where
    S: LocationSource + Sync + 'static,
{
    pub fn new(source: S, settings: ReporterSettings, uploads: UploadQueue) -> Self {
        Self::with_shared(Arc::new(source), settings, Arc::new(uploads))
    }

    pub fn with_shared(
        source: Arc<S>,
        settings: ReporterSettings,
        uploads: Arc<UploadQueue>,
    ) -> Self {
        Self {
            source,
            settings,
            uploads,
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn settings(&self) -> &ReporterSettings {
        &self.settings
    }

    pub fn uploads(&self) -> &Arc<UploadQueue> {
        &self.uploads
    }

    /// One-shot position.
    ///
    /// `None` when the permission is missing or no fix arrives within the
    /// fetch timeout. A cached fix younger than `max_cached_age` is returned
    /// without fetching.
    #[instrument(name = "reporter_current_position", skip(self))]
    pub async fn request_current_position(&self) -> Option<LocationFix> {
        if !self.source.has_permission() {
            warn!("Location permission not granted");
            return None;
        }

        if let Some(cached) = self.source.last_known() {
            if cached.age_at(Utc::now()) < self.settings.max_cached_age {
                debug!("Serving cached fix");
                return Some(cached);
            }
        }

        match timeout(self.settings.fetch_timeout, self.source.fetch_current()).await {
            Ok(fix) => fix,
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.fetch_timeout.as_millis() as u64,
                    "Location fetch timed out"
                );
                None
            }
        }
    }

    /// Start the periodic loop delivering fixes to `on_sample`.
    ///
    /// # Errors
    /// `CapabilityDenied` when the permission is missing (nothing is
    /// started), `Validation` for a zero interval.
    #[instrument(name = "reporter_start_updates", skip(self, on_sample))]
    pub fn start_updates(
        &self,
        interval_hint: Duration,
        on_sample: SampleCallback,
    ) -> Result<UpdateHandle, ReporterError> {
        if !self.source.has_permission() {
            warn!("Location permission not granted, updates not started");
            return Err(ReporterError::location_denied());
        }
        if interval_hint.is_zero() {
            return Err(ReporterError::validation(
                "interval",
                "update interval must be > 0",
            ));
        }

        let gate = Arc::new(Gate::new());
        let task = tokio::spawn(update_loop(
            Arc::clone(&self.source),
            self.settings,
            interval_hint,
            Arc::clone(&gate),
            on_sample,
        ));

        info!(interval_ms = interval_hint.as_millis() as u64, "Location updates started");
        Ok(UpdateHandle { gate, task })
    }

    /// Cancel an update loop. `None` and repeated calls are no-ops.
    pub fn stop_updates(&self, handle: Option<&UpdateHandle>) {
        if let Some(handle) = handle {
            if handle.is_active() {
                info!("Location updates stopped");
            }
            handle.cancel();
        }
    }

    /// Queue a position upload; never blocks
    pub fn submit_sample(&self, sample: PositionSample) {
        self.uploads.try_submit(UploadJob::Position(sample));
    }

    /// Queue a stop-sharing request; never blocks
    pub fn cancel_sharing(&self, bus_number: BusNumber) {
        info!(bus_number = %bus_number, "Stop sharing requested");
        self.uploads.try_submit(UploadJob::StopSharing(bus_number));
    }
}

async fn update_loop<S>(
    source: Arc<S>,
    settings: ReporterSettings,
    interval: Duration,
    gate: Arc<Gate>,
    on_sample: SampleCallback,
) where
    S: LocationSource + Sync,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_delivered: Option<(LocationFix, Instant)> = None;

    loop {
        ticker.tick().await;

        if !source.has_permission() {
            warn!("Location permission revoked, skipping tick");
            continue;
        }

        let fix = match timeout(settings.fetch_timeout, source.fetch_current()).await {
            Ok(Some(fix)) => fix,
            Ok(None) => {
                debug!("No fix available");
                continue;
            }
            Err(_) => {
                warn!("Location fetch timed out");
                continue;
            }
        };

        if let Some((previous, delivered_at)) = last_delivered {
            if delivered_at.elapsed() < settings.min_update_interval {
                trace!("Fix suppressed by spacing floor");
                continue;
            }
            let moved = haversine_m(
                previous.latitude,
                previous.longitude,
                fix.latitude,
                fix.longitude,
            );
            if moved < settings.min_displacement_m {
                trace!(moved_m = moved, "Fix suppressed by displacement floor");
                continue;
            }
        }

        {
            let _delivering = gate
                .delivering
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !gate.is_open() {
                break;
            }
            on_sample(fix);
        }
        if !gate.is_open() {
            break;
        }
        last_delivered = Some((fix, Instant::now()));
    }
}
