//! Error taxonomy for the Shapr runtime.
//!
//! Configuration problems are fatal at build/startup time and never silently
//! tolerated; everything else maps onto a client- or server-facing response
//! in the HTTP layer.

use thiserror::Error;

/// Main result type for the framework
pub type Result<T> = std::result::Result<T, ShaprError>;

/// Main error type for the Shapr framework
#[derive(Debug, Error)]
pub enum ShaprError {
    /// Invalid configuration: duplicate slugs, blank relationship targets,
    /// malformed DSL blocks, unresolvable entity names. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller does not satisfy the access rule for the operation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A beforeOperation hook returned a cancellation sentinel. Distinct from
    /// access-denied and not-found so callers can tell the cases apart.
    #[error("operation cancelled by beforeOperation hook for collection '{collection}'")]
    OperationCancelled { collection: String },

    /// The requested collection or document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed filter JSON, unknown field path, or an unsupported operator
    /// combination in a query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A hook raised an error mid-pipeline; the remaining stages are skipped
    /// and the failure surfaces for this request only.
    #[error("hook {stage} failed for collection '{collection}': {message}")]
    Hook { collection: String, stage: &'static str, message: String },

    /// Persistence-layer failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ShaprError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    pub fn hook(collection: impl Into<String>, stage: &'static str, message: impl Into<String>) -> Self {
        Self::Hook { collection: collection.into(), stage, message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
