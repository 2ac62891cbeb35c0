//! Error types for the model layer.

use cloudgraph_types::ServiceType;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while turning raw records into entities or edges.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The record has no usable identity at the expected location.
    #[error("{service} record has no identity at {pointer}")]
    MissingIdentity { service: ServiceType, pointer: String },

    /// The record is structurally unusable for this service.
    #[error("invalid {service} record: {reason}")]
    InvalidRecord { service: ServiceType, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
