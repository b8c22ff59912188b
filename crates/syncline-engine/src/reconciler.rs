//! One reconciliation cycle: snapshot, diff, apply.

use std::sync::Arc;

use syncline_core::{
    DynSourceAdapter, DynTargetAdapter, ExecutionOutcome, ReconciliationPlan, SyncError, diff,
};

use crate::applier::Applier;
use crate::cache::TargetStateCache;

/// What one converged cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Number of creations the plan called for.
    pub planned_creates: usize,
    /// Number of deletions the plan called for.
    pub planned_deletes: usize,
    /// Outcomes of the creation units.
    pub creates: Vec<ExecutionOutcome>,
    /// Outcomes of the deletion units.
    pub deletes: Vec<ExecutionOutcome>,
}

impl CycleReport {
    /// Returns `true` when the cycle found nothing to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.planned_creates == 0 && self.planned_deletes == 0
    }
}

/// Drives one source/target pair through reconciliation cycles.
///
/// The reconciler owns the target state cache. [`refresh_target_state`]
/// rebuilds it wholesale from the target adapter; between refreshes the
/// applier maintains it incrementally, so a cycle normally costs one source
/// listing plus the plan's mutations.
///
/// [`refresh_target_state`]: Self::refresh_target_state
pub struct Reconciler {
    source: DynSourceAdapter,
    target: DynTargetAdapter,
    cache: Arc<TargetStateCache>,
    applier: Applier,
}

impl Reconciler {
    /// Creates a reconciler with the default apply pool size.
    pub fn new(source: DynSourceAdapter, target: DynTargetAdapter) -> Self {
        let cache = Arc::new(TargetStateCache::new());
        let applier = Applier::new(source.clone(), target.clone(), cache.clone());
        Self {
            source,
            target,
            cache,
            applier,
        }
    }

    /// Sets the apply pool size.
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.applier = self.applier.with_max_in_flight(max_in_flight);
        self
    }

    /// The cached projection of the target system.
    #[must_use]
    pub fn cache(&self) -> &TargetStateCache {
        &self.cache
    }

    /// Name of the source system for logging.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.system_name()
    }

    /// Name of the target system for logging.
    #[must_use]
    pub fn target_name(&self) -> &'static str {
        self.target.system_name()
    }

    /// Rebuilds the state cache from a fresh target listing.
    ///
    /// Returns the number of entities now cached.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::TargetFetch` when the listing fails; the cache
    /// keeps its previous contents.
    pub async fn refresh_target_state(&self) -> Result<usize, SyncError> {
        let records = self
            .target
            .list_entities()
            .await
            .map_err(|e| SyncError::target_fetch(e.to_string()))?;
        let count = records.len();
        self.cache.replace(records);
        tracing::info!(
            entities = count,
            target = self.target.system_name(),
            "target state cache refreshed"
        );
        Ok(count)
    }

    /// Computes the plan for the current cycle from a fresh source listing
    /// and the cached target state.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::SourceFetch` when the source listing fails and
    /// `SyncError::DuplicateKey` when the listing violates key uniqueness.
    pub async fn plan(&self) -> Result<ReconciliationPlan, SyncError> {
        let source_records = self
            .source
            .list_entities()
            .await
            .map_err(|e| SyncError::source_fetch(e.to_string()))?;
        let target_records = self.cache.snapshot();
        diff(source_records, target_records)
    }

    /// Runs one full cycle: plan, then apply.
    ///
    /// # Errors
    ///
    /// A fetch or validation error aborts the cycle before anything is
    /// applied. When the plan was applied but at least one unit failed, the
    /// cycle fails with `SyncError::Apply` carrying the failure counts; the
    /// successful units stand and the failed ones are retried next cycle.
    pub async fn reconcile(&self) -> Result<CycleReport, SyncError> {
        let plan = self.plan().await?;
        let planned_creates = plan.to_create.len();
        let planned_deletes = plan.to_delete.len();

        if plan.is_empty() {
            tracing::debug!(
                source = self.source.system_name(),
                target = self.target.system_name(),
                "systems already converged"
            );
            return Ok(CycleReport::default());
        }

        let report = self.applier.apply(plan).await;
        if let Some(error) = report.aggregate_error() {
            return Err(error);
        }

        Ok(CycleReport {
            planned_creates,
            planned_deletes,
            creates: report.creates,
            deletes: report.deletes,
        })
    }
}
