//! Retry policy for store calls.

use async_trait::async_trait;
use cloudgraph_model::{CombinedSchema, MutationDescriptor};
use cloudgraph_store::{GraphStore, StoreError, StoreResult, UpsertAck};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently to retry transient store errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. `1` disables retry.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Upper bound for any single delay.
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy allowing `retries` retries after the first attempt.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `backoff_max`. Zero for `retry == 0`.
    pub fn compute_backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let base_ms = self.backoff_base.as_millis() as u64;
        let max_ms = self.backoff_max.as_millis() as u64;
        let multiplier = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
    }

    /// Delay before retrying after `error`. A server-supplied retry-after
    /// wins over the computed backoff but is still capped.
    fn delay_for(&self, retry: u32, error: &StoreError) -> Duration {
        error
            .retry_after()
            .map_or_else(|| self.compute_backoff(retry), |after| after.min(self.backoff_max))
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt, &e);
                    warn!(
                        call = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        rate_limited = e.is_rate_limited(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient store error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// A [`GraphStore`] that retries transient errors of the wrapped store.
pub struct RetryingStore {
    inner: Arc<dyn GraphStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn GraphStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl GraphStore for RetryingStore {
    fn describe(&self) -> String {
        format!(
            "{} (up to {} attempts)",
            self.inner.describe(),
            self.policy.max_attempts
        )
    }

    async fn publish_schema(&self, schema: &CombinedSchema) -> StoreResult<()> {
        self.policy
            .run("publish_schema", || self.inner.publish_schema(schema))
            .await
    }

    async fn upsert(
        &self,
        mutation: &MutationDescriptor,
        input: &[Value],
    ) -> StoreResult<UpsertAck> {
        self.policy
            .run("upsert", || self.inner.upsert(mutation, input))
            .await
    }
}
