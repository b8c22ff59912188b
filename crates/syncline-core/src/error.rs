//! Error types for reconciliation cycles.
//!
//! Every failure mode the engine can report is enumerated here so callers
//! can branch on [`SyncError::kind`] by value instead of probing error
//! internals.

use std::fmt;
use thiserror::Error;

/// Errors produced while planning or applying a reconciliation cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing the source system failed; the cycle was aborted before any
    /// mutation.
    #[error("Failed to list source entities: {message}")]
    SourceFetch {
        /// Description of the underlying failure.
        message: String,
    },

    /// Listing the target system failed; the cycle was aborted before any
    /// mutation.
    #[error("Failed to list target entities: {message}")]
    TargetFetch {
        /// Description of the underlying failure.
        message: String,
    },

    /// Fetching the deferred payload for one creation failed.
    #[error("Failed to fetch payload for {key}: {message}")]
    PayloadFetch {
        /// Correlation key of the affected entity.
        key: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// Creating one mirror entity failed.
    #[error("Failed to create mirror entity for {key}: {message}")]
    Create {
        /// Correlation key of the affected entity.
        key: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// Deleting one mirror entity failed.
    #[error("Failed to delete mirror entity for {key}: {message}")]
    Delete {
        /// Correlation key of the affected entity.
        key: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// At least one unit of work in an applied plan failed. The successful
    /// siblings stand; the failed items are retried on the next cycle.
    #[error("Reconciliation incomplete: {failed} of {total} operations failed")]
    Apply {
        /// Number of failed units of work.
        failed: usize,
        /// Total number of units of work in the plan.
        total: usize,
    },

    /// The source snapshot contained the same correlation key twice.
    #[error("Duplicate correlation key in source snapshot: {key}")]
    DuplicateKey {
        /// The offending key.
        key: String,
    },

    /// The engine was wired with an unusable configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl SyncError {
    /// Creates a new `SourceFetch` error.
    #[must_use]
    pub fn source_fetch(message: impl Into<String>) -> Self {
        Self::SourceFetch {
            message: message.into(),
        }
    }

    /// Creates a new `TargetFetch` error.
    #[must_use]
    pub fn target_fetch(message: impl Into<String>) -> Self {
        Self::TargetFetch {
            message: message.into(),
        }
    }

    /// Creates a new `PayloadFetch` error.
    #[must_use]
    pub fn payload_fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadFetch {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Create` error.
    #[must_use]
    pub fn create(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Create {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Delete` error.
    #[must_use]
    pub fn delete(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delete {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Apply` error.
    #[must_use]
    pub fn apply(failed: usize, total: usize) -> Self {
        Self::Apply { failed, total }
    }

    /// Creates a new `DuplicateKey` error.
    #[must_use]
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the kind of this error for by-value dispatch.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceFetch { .. } => ErrorKind::SourceFetch,
            Self::TargetFetch { .. } => ErrorKind::TargetFetch,
            Self::PayloadFetch { .. } | Self::Create { .. } | Self::Delete { .. } => {
                ErrorKind::Apply
            }
            Self::Apply { .. } => ErrorKind::Apply,
            Self::DuplicateKey { .. } => ErrorKind::Validation,
            Self::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Returns `true` when the error aborted a cycle before any mutation.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SourceFetch | ErrorKind::TargetFetch
        )
    }

    /// Returns the correlation key of the affected entity, when the error
    /// is scoped to a single unit of work.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::PayloadFetch { key, .. }
            | Self::Create { key, .. }
            | Self::Delete { key, .. }
            | Self::DuplicateKey { key } => Some(key),
            _ => None,
        }
    }
}

/// Kinds of reconciliation errors, compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source listing failed.
    SourceFetch,
    /// Target listing failed.
    TargetFetch,
    /// One or more units of an applied plan failed.
    Apply,
    /// A snapshot violated a differ precondition.
    Validation,
    /// The engine configuration is unusable.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFetch => write!(f, "source_fetch"),
            Self::TargetFetch => write!(f, "target_fetch"),
            Self::Apply => write!(f, "apply"),
            Self::Validation => write!(f, "validation"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for reconciliation operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
