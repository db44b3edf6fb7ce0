//! UploadQueue - bounded, non-blocking position uploads
//!
//! Jobs go through a bounded channel to a dispatcher task. The dispatcher
//! runs each job as its own task, with a semaphore capping concurrent
//! requests. A full queue drops the job; nothing is retried.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, instrument, warn};

use contracts::{BusNumber, ContractError, PositionSample, PositionTransport};
use observability::{RunningStats, StatsSummary};

/// One request to the registry
#[derive(Debug, Clone)]
pub enum UploadJob {
    Position(PositionSample),
    StopSharing(BusNumber),
}

impl UploadJob {
    /// Metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Position(_) => "position",
            Self::StopSharing(_) => "stop_sharing",
        }
    }

    pub fn bus_number(&self) -> &BusNumber {
        match self {
            Self::Position(sample) => sample.bus_number(),
            Self::StopSharing(bus_number) => bus_number,
        }
    }
}

/// Counters for one upload queue
#[derive(Debug, Default)]
pub struct UploadMetrics {
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    in_flight: AtomicUsize,
    latency_ms: Mutex<RunningStats>,
}

impl UploadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    fn record_latency(&self, latency_ms: f64) {
        self.latency_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(latency_ms);
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        UploadSnapshot {
            sent: self.sent(),
            failed: self.failed(),
            dropped: self.dropped(),
            in_flight: self.in_flight(),
            latency_ms: self
                .latency_ms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .summary(),
        }
    }
}

/// Point-in-time copy of [`UploadMetrics`]
#[derive(Debug, Clone)]
pub struct UploadSnapshot {
    pub sent: u64,
    pub failed: u64,
    pub dropped: u64,
    pub in_flight: usize,
    pub latency_ms: StatsSummary,
}

/// Handle to a running upload dispatcher
pub struct UploadQueue {
    transport_name: String,
    tx: mpsc::Sender<UploadJob>,
    metrics: Arc<UploadMetrics>,
    shutdown_tx: watch::Sender<bool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl UploadQueue {
    /// Spawn the dispatcher for `transport`.
    ///
    /// `queue_capacity` and `max_in_flight` are clamped to at least 1.
    pub fn spawn<T>(transport: T, queue_capacity: usize, max_in_flight: usize) -> Self
    where
        T: PositionTransport + Sync + 'static,
    {
        let transport_name = transport.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(UploadMetrics::new());

        let dispatcher = tokio::spawn(dispatch_loop(
            Arc::new(transport),
            rx,
            shutdown_rx,
            Arc::clone(&metrics),
            max_in_flight.max(1),
        ));

        Self {
            transport_name,
            tx,
            metrics,
            shutdown_tx,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    pub fn transport_name(&self) -> &str {
        &self.transport_name
    }

    pub fn metrics(&self) -> &Arc<UploadMetrics> {
        &self.metrics
    }

    /// Enqueue a job without waiting.
    ///
    /// Returns false when the job was dropped (queue full or closed).
    pub fn try_submit(&self, job: UploadJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                observability::record_upload_dropped(job.kind());
                warn!(
                    transport = %self.transport_name,
                    kind = job.kind(),
                    bus_number = %job.bus_number(),
                    "Upload queue full, job dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                observability::record_upload_dropped(job.kind());
                debug!(
                    kind = job.kind(),
                    bus_number = %job.bus_number(),
                    "Upload queue closed, job dropped"
                );
                false
            }
        }
    }

    /// Stop accepting jobs, run what is already queued, and wait for
    /// in-flight requests. Safe to call more than once.
    #[instrument(name = "upload_queue_shutdown", skip(self), fields(transport = %self.transport_name))]
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(dispatcher) = dispatcher {
            if let Err(e) = dispatcher.await {
                error!(error = ?e, "Upload dispatcher panicked");
            }
        }
        debug!(snapshot = ?self.metrics.snapshot(), "Upload queue shutdown complete");
    }
}

async fn dispatch_loop<T>(
    transport: Arc<T>,
    mut rx: mpsc::Receiver<UploadJob>,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: Arc<UploadMetrics>,
    max_in_flight: usize,
) where
    T: PositionTransport + Sync + 'static,
{
    let permits = Arc::new(Semaphore::new(max_in_flight));
    let mut tasks = JoinSet::new();
    let mut closing = false;

    debug!(max_in_flight, "Upload dispatcher started");

    loop {
        let job = if closing {
            rx.recv().await
        } else {
            tokio::select! {
                job = rx.recv() => job,
                _ = shutdown_rx.changed() => {
                    // drain what is buffered, refuse the rest
                    rx.close();
                    closing = true;
                    continue;
                }
            }
        };
        let Some(job) = job else { break };

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        metrics.in_flight.fetch_add(1, Ordering::Relaxed);

        let transport = Arc::clone(&transport);
        let metrics = Arc::clone(&metrics);
        tasks.spawn(async move {
            run_job(transport.as_ref(), job, &metrics).await;
            metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
            drop(permit);
        });

        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                error!(error = ?e, "Upload task panicked");
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = ?e, "Upload task panicked");
        }
    }
    debug!("Upload dispatcher stopped");
}

async fn run_job<T>(transport: &T, job: UploadJob, metrics: &UploadMetrics)
where
    T: PositionTransport + Sync,
{
    let started = Instant::now();
    let result: Result<(), ContractError> = match &job {
        UploadJob::Position(sample) => transport.send_position(sample).await,
        UploadJob::StopSharing(bus_number) => transport.stop_sharing(bus_number).await,
    };
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    observability::record_upload_result(job.kind(), result.is_ok());
    match result {
        Ok(()) => {
            metrics.sent.fetch_add(1, Ordering::Relaxed);
            metrics.record_latency(latency_ms);
            observability::record_upload_latency_ms(latency_ms);
            debug!(kind = job.kind(), bus_number = %job.bus_number(), latency_ms, "Upload sent");
        }
        Err(e) => {
            metrics.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                transport = %transport.name(),
                kind = job.kind(),
                bus_number = %job.bus_number(),
                error = %e,
                "Upload failed"
            );
        }
    }
}
