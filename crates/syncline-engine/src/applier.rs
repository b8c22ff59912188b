//! Concurrent plan execution with per-item failure isolation.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use syncline_core::{
    ApplyReport, DynSourceAdapter, DynTargetAdapter, ExecutionOutcome, ReconciliationPlan,
    SourceRecord, SyncError, TargetRecord,
};

use crate::cache::TargetStateCache;

/// Default cap on concurrently dispatched units of work.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum UnitKind {
    Create,
    Delete,
}

/// Executes reconciliation plans against the target system.
///
/// Every plan item becomes one unit of work in a bounded pool: at most
/// `max_in_flight` units run at a time, and `apply` returns only after all
/// of them have completed. A failed unit is reported in its outcome and
/// never prevents its siblings from running.
pub struct Applier {
    source: DynSourceAdapter,
    target: DynTargetAdapter,
    cache: Arc<TargetStateCache>,
    max_in_flight: usize,
}

impl Applier {
    /// Creates an applier with the default pool size.
    pub fn new(
        source: DynSourceAdapter,
        target: DynTargetAdapter,
        cache: Arc<TargetStateCache>,
    ) -> Self {
        Self {
            source,
            target,
            cache,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Sets the pool size. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Applies a plan and reports every outcome.
    ///
    /// Creations and deletions are dispatched into the same pool; there is
    /// no ordering between units. The state cache is updated only after a
    /// unit's confirmed success, so failed items are naturally retried by
    /// the next cycle's diff.
    pub async fn apply(&self, plan: ReconciliationPlan) -> ApplyReport {
        let mut report = ApplyReport::default();
        if plan.is_empty() {
            tracing::debug!("empty plan, nothing to apply");
            return report;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut units: JoinSet<(UnitKind, ExecutionOutcome)> = JoinSet::new();
        let mut pending = HashSet::new();

        for record in plan.to_create {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let target = self.target.clone();
            let cache = self.cache.clone();
            pending.insert((UnitKind::Create, record.key.clone()));
            units.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("apply pool semaphore closed");
                (UnitKind::Create, run_create(source, target, cache, record).await)
            });
        }

        for record in plan.to_delete {
            let semaphore = semaphore.clone();
            let target = self.target.clone();
            let cache = self.cache.clone();
            pending.insert((UnitKind::Delete, record.key.clone()));
            units.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("apply pool semaphore closed");
                (UnitKind::Delete, run_delete(target, cache, record).await)
            });
        }

        // Drain every unit; nothing returns before the whole batch is done
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok((kind, outcome)) => {
                    pending.remove(&(kind, outcome.key.clone()));
                    match kind {
                        UnitKind::Create => report.creates.push(outcome),
                        UnitKind::Delete => report.deletes.push(outcome),
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "apply unit aborted before reporting");
                }
            }
        }

        // Units that panicked or were aborted never reported an outcome;
        // they are recorded as failed
        for (kind, key) in pending {
            let outcome = match kind {
                UnitKind::Create => ExecutionOutcome::failure(
                    key.clone(),
                    SyncError::create(key.as_str(), "unit aborted before completion"),
                ),
                UnitKind::Delete => ExecutionOutcome::failure(
                    key.clone(),
                    SyncError::delete(key.as_str(), "unit aborted before completion"),
                ),
            };
            match kind {
                UnitKind::Create => report.creates.push(outcome),
                UnitKind::Delete => report.deletes.push(outcome),
            }
        }

        for outcome in report.failures() {
            if let Some(error) = &outcome.error {
                tracing::error!(key = %outcome.key, error = %error, "apply unit failed");
            }
        }
        tracing::info!(
            creates = report.creates.len(),
            deletes = report.deletes.len(),
            failed = report.failure_count(),
            "plan applied"
        );

        report
    }
}

/// One creation: resolve the payload if deferred, create the mirror entity,
/// record the assigned identifier.
async fn run_create(
    source: DynSourceAdapter,
    target: DynTargetAdapter,
    cache: Arc<TargetStateCache>,
    record: SourceRecord,
) -> ExecutionOutcome {
    let key = record.key.clone();

    let record = if record.has_payload() {
        record
    } else {
        match source.fetch_payload(&key).await {
            Ok(payload) => record.with_payload(payload),
            Err(e) => {
                return ExecutionOutcome::failure(
                    key.clone(),
                    SyncError::payload_fetch(key.as_str(), e.to_string()),
                );
            }
        }
    };

    match target.create_entity(&record).await {
        Ok(target_id) => {
            cache.record(key.clone(), target_id);
            ExecutionOutcome::success(key)
        }
        Err(e) => {
            ExecutionOutcome::failure(key.clone(), SyncError::create(key.as_str(), e.to_string()))
        }
    }
}

/// One deletion: remove the mirror entity, then drop it from the cache.
async fn run_delete(
    target: DynTargetAdapter,
    cache: Arc<TargetStateCache>,
    record: TargetRecord,
) -> ExecutionOutcome {
    match target.delete_entity(&record.target_id).await {
        Ok(()) => {
            cache.forget(&record.key);
            ExecutionOutcome::success(record.key)
        }
        Err(e) => {
            let key = record.key;
            let error = SyncError::delete(key.as_str(), e.to_string());
            ExecutionOutcome::failure(key, error)
        }
    }
}
