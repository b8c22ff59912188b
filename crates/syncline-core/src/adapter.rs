//! Adapter contracts isolating the engine from the two external systems.
//!
//! The engine only ever talks to a source and a target through these traits;
//! everything protocol-specific lives behind them. Implementations must be
//! thread-safe (`Send + Sync`) because the applier shares them across
//! concurrently dispatched units of work.

use async_trait::async_trait;

use crate::record::{CorrelationKey, Payload, SourceRecord, TargetId, TargetRecord};

/// Errors raised by source and target adapters.
///
/// Adapters translate their protocol failures into these variants; the
/// engine wraps them with operation context on the way up.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The request never produced a usable response.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The remote system answered with an unexpected status.
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code returned by the remote system.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Response decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// The adapter was constructed with an unusable configuration.
    #[error("Invalid adapter configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },
}

impl AdapterError {
    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Status` error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code when the remote system answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The authoritative system whose catalog drives reconciliation.
///
/// # Example
///
/// ```ignore
/// use syncline_core::{SourceAdapter, AdapterError};
///
/// async fn count_entities(source: &dyn SourceAdapter) -> Result<usize, AdapterError> {
///     Ok(source.list_entities().await?.len())
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Lists every entity the source currently owns.
    ///
    /// Returns one record per entity with a unique correlation key. Records
    /// may defer their payload (`payload: None`).
    ///
    /// # Errors
    ///
    /// Returns an error when the listing could not be produced; the caller
    /// aborts the cycle without mutating anything.
    async fn list_entities(&self) -> Result<Vec<SourceRecord>, AdapterError>;

    /// Fetches the deferred payload for one entity.
    ///
    /// Only called for records listed with `payload: None`, at apply time.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload is unavailable; the affected
    /// creation fails in isolation and is retried next cycle.
    async fn fetch_payload(&self, key: &CorrelationKey) -> Result<Payload, AdapterError>;

    /// Name of the source system for logging.
    fn system_name(&self) -> &'static str;
}

/// The mirror system reconciliation converges on the source.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    /// Lists every mirror entity this synchronizer owns in the target.
    ///
    /// Implementations scope the listing to entities created by this
    /// synchronizer (label or publication-URL filtering); foreign entities
    /// must never appear, or they would be deleted as orphans.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing could not be produced.
    async fn list_entities(&self) -> Result<Vec<TargetRecord>, AdapterError>;

    /// Creates the mirror entity for one source record.
    ///
    /// The record's payload is always resolved before this call. Returns
    /// the identifier the target assigned, required for later deletion.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails. Multi-step implementations may
    /// leave partial state behind; the next cycle observes whatever the
    /// listing reports.
    async fn create_entity(&self, record: &SourceRecord) -> Result<TargetId, AdapterError>;

    /// Deletes one mirror entity by its target-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when deletion fails; the entity is retried next
    /// cycle.
    async fn delete_entity(&self, id: &TargetId) -> Result<(), AdapterError>;

    /// Name of the target system for logging.
    fn system_name(&self) -> &'static str;
}
