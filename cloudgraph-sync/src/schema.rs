//! Schema aggregation and publishing.

use crate::{RunResult, ScanError};
use cloudgraph_model::CombinedSchema;
use cloudgraph_provider::{Provider, ProviderOptions};
use cloudgraph_store::GraphStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// File name of the combined schema artifact.
pub const COMBINED_SCHEMA_FILE: &str = "combined.graphql";

/// Collects provider schema fragments into one document and publishes it.
#[derive(Debug, Clone, Default)]
pub struct SchemaAggregator {
    artifact_dir: Option<PathBuf>,
}

impl SchemaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also writes each fragment and the combined document under
    /// `<data_dir>/schema/`.
    pub fn with_artifacts(data_dir: impl AsRef<Path>) -> Self {
        Self {
            artifact_dir: Some(data_dir.as_ref().join("schema")),
        }
    }

    /// Fragments in provider order.
    pub fn collect(providers: &[Arc<dyn Provider>], options: &ProviderOptions) -> CombinedSchema {
        providers
            .iter()
            .map(|provider| provider.schema_fragment(options))
            .collect()
    }

    /// Writes the schema artifacts, returning the written paths. No-op
    /// without an artifact directory.
    pub async fn write_artifacts(&self, schema: &CombinedSchema) -> std::io::Result<Vec<PathBuf>> {
        let Some(dir) = &self.artifact_dir else {
            return Ok(Vec::new());
        };
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::new();
        for fragment in schema.fragments() {
            let path = dir.join(format!("{}.graphql", fragment.provider));
            tokio::fs::write(&path, fragment.document()).await?;
            written.push(path);
        }
        let combined = dir.join(COMBINED_SCHEMA_FILE);
        tokio::fs::write(&combined, schema.document()).await?;
        written.push(combined);

        debug!(dir = %dir.display(), files = written.len(), "Schema artifacts written");
        Ok(written)
    }

    /// Publishes the combined schema. Any failure is fatal for the run.
    pub async fn publish(&self, store: &dyn GraphStore, schema: &CombinedSchema) -> RunResult<()> {
        info!(
            providers = schema.fragments().len(),
            types = schema.type_def_count(),
            store = %store.describe(),
            "Publishing combined schema"
        );
        store
            .publish_schema(schema)
            .await
            .map_err(ScanError::SchemaPublish)
    }
}
