//! Error types for a scan run.

use cloudgraph_store::StoreError;
use cloudgraph_types::{ProviderName, ServiceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations.
pub type RunResult<T> = Result<T, ScanError>;

/// The steps a provider goes through in a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// Looking the provider up in the registry.
    Resolve,
    Credentials,
    Identity,
    Fetch,
    /// Formatting records and resolving connections.
    Process,
    Snapshot,
    Sync,
}

impl ScanPhase {
    /// The phases the scan driver runs, in order.
    pub const SCAN: [ScanPhase; 4] = [
        ScanPhase::Credentials,
        ScanPhase::Identity,
        ScanPhase::Fetch,
        ScanPhase::Process,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScanPhase::Resolve => "resolve",
            ScanPhase::Credentials => "credentials",
            ScanPhase::Identity => "identity",
            ScanPhase::Fetch => "fetch",
            ScanPhase::Process => "process",
            ScanPhase::Snapshot => "snapshot",
            ScanPhase::Sync => "sync",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a scan run.
///
/// `Config` and `SchemaPublish` end the run. The rest are scoped to one
/// provider or one service and end up in the run summary.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No provider could be resolved, or the run configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{provider}: authentication failed: {message}")]
    Auth {
        provider: ProviderName,
        message: String,
    },

    #[error("{provider}: identity lookup failed: {message}")]
    Identity {
        provider: ProviderName,
        message: String,
    },

    #[error("{provider}: data fetch failed: {message}")]
    Fetch {
        provider: ProviderName,
        message: String,
    },

    /// A formatting task died.
    #[error("{provider}: processing failed: {message}")]
    Process {
        provider: ProviderName,
        message: String,
    },

    /// The store rejected the combined schema.
    #[error("schema publish failed: {0}")]
    SchemaPublish(#[source] StoreError),

    #[error("{provider}/{service}: sync failed: {source}")]
    Sync {
        provider: ProviderName,
        service: ServiceType,
        #[source]
        source: StoreError,
    },

    /// The snapshot file could not be written.
    #[error("snapshot {} not written: {message}", path.display())]
    Snapshot { path: PathBuf, message: String },
}

impl ScanError {
    /// The phase this error belongs to.
    pub fn phase(&self) -> ScanPhase {
        match self {
            ScanError::Config(_) => ScanPhase::Resolve,
            ScanError::Auth { .. } => ScanPhase::Credentials,
            ScanError::Identity { .. } => ScanPhase::Identity,
            ScanError::Fetch { .. } => ScanPhase::Fetch,
            ScanError::Process { .. } => ScanPhase::Process,
            ScanError::Snapshot { .. } => ScanPhase::Snapshot,
            ScanError::SchemaPublish(_) | ScanError::Sync { .. } => ScanPhase::Sync,
        }
    }

    /// Whether the error ends the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::Config(_) | ScanError::SchemaPublish(_))
    }
}
