//! Audit snapshots of provider scans.
//!
//! One pretty-printed JSON file per provider scan, named
//! `<provider>_<accountId>_<unix-millis>.json`. Written for humans and
//! never read back.

use crate::{RunResult, ScanError};
use cloudgraph_model::ScanResult;
use cloudgraph_types::{AccountId, ProviderName};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes scan snapshots into a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    data_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The snapshot path for a scan taken at `unix_millis`.
    pub fn path_for(&self, provider: &ProviderName, account_id: &AccountId, unix_millis: i64) -> PathBuf {
        self.data_dir
            .join(format!("{provider}_{account_id}_{unix_millis}.json"))
    }

    /// Writes `scan` and returns the file path.
    pub async fn write(
        &self,
        provider: &ProviderName,
        account_id: &AccountId,
        scan: &ScanResult,
    ) -> RunResult<PathBuf> {
        let millis = chrono::Utc::now().timestamp_millis();
        let path = self.path_for(provider, account_id, millis);
        let failed = |message: String| ScanError::Snapshot {
            path: path.clone(),
            message,
        };

        let body = serde_json::to_vec_pretty(scan).map_err(|e| failed(e.to_string()))?;
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| failed(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| failed(e.to_string()))?;

        debug!(provider = %provider, path = %path.display(), "Snapshot written");
        Ok(path)
    }
}
