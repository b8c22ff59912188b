//! # syncline-core
//!
//! Core model for the Syncline reconciliation engine.
//!
//! This crate defines the pieces every synchronizer shares: the record types
//! correlated across the source and target systems, the snapshot diff that
//! produces a [`ReconciliationPlan`], the per-item execution outcomes, the
//! error taxonomy, and the [`SourceAdapter`] / [`TargetAdapter`] contracts.
//! It performs no I/O; concrete adapters live in `syncline-connectors` and
//! the loop machinery in `syncline-engine`.
//!
//! ## Overview
//!
//! A reconciliation cycle reads two snapshots, diffs them by correlation
//! key, and applies the plan:
//!
//! ```ignore
//! use syncline_core::{diff, SourceRecord, TargetRecord};
//!
//! let source = vec![SourceRecord::new("42", "commerce-42")];
//! let target = vec![TargetRecord::new("17", "app-0b1")];
//!
//! let plan = diff(source, target)?;
//! assert_eq!(plan.to_create.len(), 1); // key 42 has no mirror
//! assert_eq!(plan.to_delete.len(), 1); // key 17 lost its source entity
//! ```
//!
//! ## Adapters
//!
//! To plug in a new system pair, implement the adapter traits:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use syncline_core::{AdapterError, SourceAdapter, SourceRecord};
//!
//! struct MyCatalog { /* ... */ }
//!
//! #[async_trait]
//! impl SourceAdapter for MyCatalog {
//!     async fn list_entities(&self) -> Result<Vec<SourceRecord>, AdapterError> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

mod adapter;
mod error;
mod outcome;
mod plan;
mod record;

// Re-export everything from submodules
pub use adapter::{AdapterError, SourceAdapter, TargetAdapter};
pub use error::{ErrorKind, SyncError, SyncResult};
pub use outcome::{ApplyReport, ExecutionOutcome};
pub use plan::{ReconciliationPlan, diff};
pub use record::{CorrelationKey, Payload, SourceRecord, TargetId, TargetRecord};

/// Type alias for a shared source adapter trait object.
pub type DynSourceAdapter = std::sync::Arc<dyn SourceAdapter>;

/// Type alias for a shared target adapter trait object.
pub type DynTargetAdapter = std::sync::Arc<dyn TargetAdapter>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use syncline_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::{AdapterError, SourceAdapter, TargetAdapter};
    pub use crate::error::{ErrorKind, SyncError, SyncResult};
    pub use crate::outcome::{ApplyReport, ExecutionOutcome};
    pub use crate::plan::{ReconciliationPlan, diff};
    pub use crate::record::{CorrelationKey, Payload, SourceRecord, TargetId, TargetRecord};
    pub use crate::{DynSourceAdapter, DynTargetAdapter};
}
