//! Background expiry of stale records

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::PositionStore;

/// Periodically purges expired records from a store
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Start sweeping `store` every `interval`.
    ///
    /// A store without a TTL never expires anything, so each tick is a cheap no-op.
    pub fn spawn(store: Arc<PositionStore>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.purge_expired(Utc::now());
                        observability::record_records_expired(removed);
                        if removed > 0 {
                            info!(removed, remaining = store.len(), "Expired positions purged");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Expiry sweeper stopped");
        });

        Self { shutdown_tx, join }
    }

    /// Stop the sweeper and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_records() {
        let store = Arc::new(PositionStore::with_ttl(Some(Duration::from_secs(60))));
        let stale = Utc::now() - chrono::Duration::seconds(120);
        store
            .upsert_at("old", Some(1.0), Some(1.0), stale)
            .expect("valid upsert");
        store
            .upsert("fresh", Some(2.0), Some(2.0))
            .expect("valid upsert");

        let sweeper = ExpirySweeper::spawn(Arc::clone(&store), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        sweeper.shutdown().await;

        let keys: Vec<String> = store
            .snapshot()
            .into_iter()
            .map(|(bus, _)| bus.to_string())
            .collect();
        assert_eq!(keys, vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_is_prompt() {
        let store = Arc::new(PositionStore::new());
        let sweeper = ExpirySweeper::spawn(store, Duration::from_secs(3600));
        tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown())
            .await
            .expect("sweeper exits on shutdown");
    }
}
