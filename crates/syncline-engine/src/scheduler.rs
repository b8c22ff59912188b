//! Fixed-interval reconciliation loop.
//!
//! Runs cycles back to back with a sleep in between and publishes the
//! last-success timestamp for the health endpoint.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::reconciler::Reconciler;

/// Shared handle to the timestamp of the last successful cycle.
///
/// Kept under its own lock, independent of reconciliation state, so a
/// concurrently polled health check always reads a consistent value.
/// `None` until the first cycle succeeds.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    last_success: Arc<RwLock<Option<OffsetDateTime>>>,
}

impl SyncStatus {
    /// Creates a status handle with no recorded success.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful cycle at the current instant.
    pub fn mark_success(&self) {
        let mut guard = self.last_success.write().expect("status lock poisoned");
        *guard = Some(OffsetDateTime::now_utc());
    }

    /// Timestamp of the last successful cycle, if any.
    #[must_use]
    pub fn last_success(&self) -> Option<OffsetDateTime> {
        *self.last_success.read().expect("status lock poisoned")
    }
}

/// Owns the timing of reconciliation cycles.
///
/// The loop is strictly sequential: cycle N+1 never starts before cycle N
/// has fully drained. Failures are logged and retried on the next tick
/// without backoff; every cycle is a fresh attempt against fresh snapshots.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    status: SyncStatus,
    interval: Duration,
    cache_refresh_cycles: u32,
}

impl Scheduler {
    /// Creates a scheduler that never re-refreshes the cache after startup.
    pub fn new(reconciler: Arc<Reconciler>, status: SyncStatus, interval: Duration) -> Self {
        Self {
            reconciler,
            status,
            interval,
            cache_refresh_cycles: 0,
        }
    }

    /// Refreshes the target state cache wholesale after every `cycles`
    /// successful cycles. `0` disables re-refreshing.
    #[must_use]
    pub fn with_cache_refresh_cycles(mut self, cycles: u32) -> Self {
        self.cache_refresh_cycles = cycles;
        self
    }

    /// Runs the loop until the shutdown signal fires.
    ///
    /// Shutdown aborts the sleep between cycles but lets an in-flight cycle
    /// drain.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            source = self.reconciler.source_name(),
            target = self.reconciler.target_name(),
            interval_secs = self.interval.as_secs(),
            cache_refresh_cycles = self.cache_refresh_cycles,
            "starting reconciliation loop"
        );

        let mut successes_since_refresh: u32 = 0;
        loop {
            match self.reconciler.reconcile().await {
                Ok(report) => {
                    self.status.mark_success();
                    successes_since_refresh += 1;
                    if report.is_noop() {
                        tracing::debug!("reconciliation cycle converged, nothing to do");
                    } else {
                        tracing::info!(
                            creates = report.planned_creates,
                            deletes = report.planned_deletes,
                            "reconciliation cycle converged"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, kind = %e.kind(), "reconciliation cycle failed");
                }
            }

            if self.cache_refresh_cycles > 0
                && successes_since_refresh >= self.cache_refresh_cycles
            {
                match self.reconciler.refresh_target_state().await {
                    Ok(_) => successes_since_refresh = 0,
                    Err(e) => {
                        tracing::error!(error = %e, "target state refresh failed");
                    }
                }
            }

            // Wait for shutdown signal or the next tick
            tokio::select! {
                biased;

                result = shutdown.changed() => {
                    match result {
                        Ok(()) if *shutdown.borrow() => {
                            tracing::info!("reconciliation loop shutting down");
                            break;
                        }
                        Ok(()) => {
                            // Value changed but not to shutdown, continue
                        }
                        Err(_) => {
                            tracing::info!("reconciliation loop shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
