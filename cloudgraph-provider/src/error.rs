//! Error types for providers.

use cloudgraph_types::ProviderName;
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors a provider can report.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials could not be produced.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The account/tenant behind the credentials could not be resolved.
    #[error("identity lookup failed: {0}")]
    Identity(String),

    /// Raw data retrieval failed.
    #[error("data fetch failed: {0}")]
    Fetch(String),

    /// The provider definition itself is unusable.
    #[error("invalid provider definition: {0}")]
    Definition(String),

    /// No provider is registered under this name.
    #[error("unknown provider: {0}")]
    UnknownProvider(ProviderName),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
