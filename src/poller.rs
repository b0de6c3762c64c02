// MIT License - Copyright (c) 2026 Peter Wright
// Poll loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::client::StatusSource;
use crate::devices::record::{DeviceRecord, Snapshot};
use crate::error::Result;
use crate::notify::ChangeNotifier;
use crate::state::StateStore;

/// Drives the fetch-compare-publish cycle on a fixed interval.
///
/// Fetch errors never stop the loop: a failed sub-fetch contributes zero
/// records of that kind for the cycle and the fixed interval is the
/// retry policy. The store update always happens before the notify, so a
/// consumer woken by a signal reads a snapshot at least as new as the
/// one that triggered it.
pub struct Poller<S> {
    source: S,
    store: Arc<StateStore>,
    notifier: ChangeNotifier,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(
        source: S,
        store: Arc<StateStore>,
        notifier: ChangeNotifier,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            poll_interval,
            fetch_timeout,
        }
    }

    /// Run until `shutdown` flips to true. Suspends only while sleeping
    /// between cycles and during the timeout-bounded device fetch.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Polling device every {:.0}s",
            self.poll_interval.as_secs_f64()
        );
        loop {
            self.poll_once().await;

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                res = shutdown.changed() => {
                    // A dropped sender means the process is going away too.
                    if res.is_err() || *shutdown.borrow() {
                        info!("Poll loop stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One fetch-compare-publish cycle. Returns whether a new snapshot
    /// was published.
    pub async fn poll_once(&self) -> bool {
        debug!("Fetching new data from the device");
        let snapshot = self.fetch_snapshot().await;

        let previous = self.store.current().await;
        if !snapshot.differs(&previous) {
            debug!("No change in {} records", snapshot.len());
            return false;
        }

        debug!("Snapshot changed ({} records), notifying consumers", snapshot.len());
        self.store.replace(Arc::new(snapshot)).await;
        self.notifier.notify();
        true
    }

    /// Fetch both collections and flatten them, zones first. A failed or
    /// timed-out sub-fetch is logged and yields no records of that kind.
    async fn fetch_snapshot(&self) -> Snapshot {
        let mut records: Vec<DeviceRecord> = Vec::new();

        match bounded(self.fetch_timeout, self.source.fetch_zone_statuses()).await {
            Ok(zones) => records.extend(zones.iter().map(|z| z.to_record())),
            Err(e) => warn!("Zone status fetch failed: {e}"),
        }

        match bounded(self.fetch_timeout, self.source.fetch_aux_device_statuses()).await {
            Ok(sirens) => records.extend(sirens.iter().map(|s| s.to_record())),
            Err(e) => warn!("Auxiliary device status fetch failed: {e}"),
        }

        Snapshot::new(records)
    }
}

/// Apply the fetch timeout, flattening elapsed timers into the error
/// message the caller logs.
async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> std::result::Result<T, String> {
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {:.0}s", limit.as_secs_f64())),
    }
}
