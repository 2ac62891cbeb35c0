//! In-memory store for tests.

use crate::{GraphStore, StoreError, StoreResult, UpsertAck};
use async_trait::async_trait;
use cloudgraph_model::{CombinedSchema, MutationDescriptor};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One call the store received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Schema(String),
    Upsert {
        mutation: MutationDescriptor,
        input: Vec<Value>,
    },
}

/// A [`GraphStore`] that records every call and fails on request.
///
/// Clones share the same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    transient_failures: Arc<AtomicUsize>,
    fail_schema: bool,
    failing_mutations: Vec<String>,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every schema publish.
    pub fn failing_schema(mut self) -> Self {
        self.fail_schema = true;
        self
    }

    /// Rejects upserts whose mutation text contains `fragment`.
    pub fn failing_mutation(mut self, fragment: impl Into<String>) -> Self {
        self.failing_mutations.push(fragment.into());
        self
    }

    /// Answers the next `count` upserts with a 503.
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log().clone()
    }

    /// Schema documents received.
    pub fn schemas(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Schema(document) => Some(document.clone()),
                RecordedCall::Upsert { .. } => None,
            })
            .collect()
    }

    /// Upserts received, as (mutation, input) pairs.
    pub fn upserts(&self) -> Vec<(MutationDescriptor, Vec<Value>)> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Upsert { mutation, input } => Some((mutation.clone(), input.clone())),
                RecordedCall::Schema(_) => None,
            })
            .collect()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts().len()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    fn describe(&self) -> String {
        "recording store".to_string()
    }

    async fn publish_schema(&self, schema: &CombinedSchema) -> StoreResult<()> {
        self.pause().await;
        self.log().push(RecordedCall::Schema(schema.document()));
        if self.fail_schema {
            return Err(StoreError::GraphQl(vec!["schema rejected".to_string()]));
        }
        Ok(())
    }

    async fn upsert(
        &self,
        mutation: &MutationDescriptor,
        input: &[Value],
    ) -> StoreResult<UpsertAck> {
        self.pause().await;
        self.log().push(RecordedCall::Upsert {
            mutation: mutation.clone(),
            input: input.to_vec(),
        });

        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        if self
            .failing_mutations
            .iter()
            .any(|fragment| mutation.mutation.contains(fragment.as_str()))
        {
            return Err(StoreError::GraphQl(vec![format!(
                "mutation rejected: {}",
                mutation.mutation
            )]));
        }
        Ok(UpsertAck {
            accepted: input.len(),
        })
    }
}
