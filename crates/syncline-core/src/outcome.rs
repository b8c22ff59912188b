//! Per-item and per-batch results of applying a reconciliation plan.

use crate::error::SyncError;
use crate::record::CorrelationKey;

/// Result of one unit of work (one create or one delete).
///
/// Outcomes within a batch carry no ordering guarantee.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Correlation key of the entity the unit operated on.
    pub key: CorrelationKey,
    /// The failure, when the unit did not succeed.
    pub error: Option<SyncError>,
}

impl ExecutionOutcome {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(key: CorrelationKey) -> Self {
        Self { key, error: None }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(key: CorrelationKey, error: SyncError) -> Self {
        Self {
            key,
            error: Some(error),
        }
    }

    /// Returns `true` when the unit succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The applier's batch result: every outcome of every unit of work.
///
/// Nothing is dropped. A report with one failed unit among many successes
/// still aggregates to an error, while the successful siblings stand.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Outcomes of the creation units.
    pub creates: Vec<ExecutionOutcome>,
    /// Outcomes of the deletion units.
    pub deletes: Vec<ExecutionOutcome>,
}

impl ApplyReport {
    /// Total number of units of work in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.creates.len() + self.deletes.len()
    }

    /// Number of failed units.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Returns `true` when every unit succeeded (an empty batch converges
    /// trivially).
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Iterates over every failed outcome, creations first.
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionOutcome> {
        self.creates
            .iter()
            .chain(self.deletes.iter())
            .filter(|outcome| !outcome.succeeded())
    }

    /// Collapses the batch into a single error carrying the failure counts,
    /// or `None` when the batch converged.
    #[must_use]
    pub fn aggregate_error(&self) -> Option<SyncError> {
        let failed = self.failure_count();
        if failed == 0 {
            None
        } else {
            Some(SyncError::apply(failed, self.total()))
        }
    }
}
