//! # syncline-engine
//!
//! Loop machinery for the Syncline reconciliation service.
//!
//! One [`Reconciler`] drives a source/target adapter pair through cycles:
//! it keeps the [`TargetStateCache`] as its projection of the target system,
//! plans with the core differ, and hands the plan to the [`Applier`], which
//! fans the units of work into a bounded pool and reports every outcome.
//! The [`Scheduler`] owns timing: fixed-interval cycles, last-success
//! tracking via [`SyncStatus`], periodic wholesale cache refreshes, and
//! graceful shutdown.
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use syncline_engine::{Reconciler, Scheduler, SyncStatus};
//!
//! let reconciler = Arc::new(Reconciler::new(source, target).with_max_in_flight(4));
//! reconciler.refresh_target_state().await?;
//!
//! let status = SyncStatus::new();
//! let scheduler = Scheduler::new(reconciler, status.clone(), Duration::from_secs(60));
//! tokio::spawn(scheduler.run(shutdown_rx));
//! ```

mod applier;
mod cache;
mod reconciler;
mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use applier::{Applier, DEFAULT_MAX_IN_FLIGHT};
pub use cache::TargetStateCache;
pub use reconciler::{CycleReport, Reconciler};
pub use scheduler::{Scheduler, SyncStatus};
