use crate::StoreResult;
use async_trait::async_trait;
use cloudgraph_model::{CombinedSchema, MutationDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgement of an accepted upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAck {
    /// Number of entity inputs the store accepted.
    pub accepted: usize,
}

/// A remote graph store.
///
/// Both calls are atomic at batch granularity: an error means the whole
/// request was rejected or its outcome is unknown.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short label for logs (e.g. the endpoint).
    fn describe(&self) -> String;

    /// Replaces the store schema with the combined document.
    async fn publish_schema(&self, schema: &CombinedSchema) -> StoreResult<()>;

    /// Submits one service's entity inputs with its mutation.
    async fn upsert(&self, mutation: &MutationDescriptor, input: &[Value])
    -> StoreResult<UpsertAck>;
}
