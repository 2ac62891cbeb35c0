//! Scripted provider for tests.
//!
//! [`MockProvider`] hands back a fixed dataset and can be told to fail at a
//! given step or to stall before answering. [`JsonHandler`] formats records
//! that already carry an `id` and an optional `connections` array.

use crate::{
    Credentials, DataRequest, Provider, ProviderError, ProviderOptions, ProviderResult, Selector,
};
use async_trait::async_trait;
use cloudgraph_model::{
    Cardinality, ConnectionIndex, Entity, ModelError, ModelResult, MutationDescriptor,
    ProviderDataset, RawRecord, RawServiceData, RegionContext, SchemaFragment, ServiceHandler,
    ServiceRegistry,
};
use cloudgraph_types::{AccountId, EntityIdentity, ProviderName, ServiceType};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// The provider step a [`MockProvider`] fails at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Credentials,
    Identity,
    Fetch,
}

/// Per-step call counters.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub credentials: AtomicUsize,
    pub identity: AtomicUsize,
    pub raw_data: AtomicUsize,
}

impl CallCounts {
    pub fn credentials(&self) -> usize {
        self.credentials.load(Ordering::SeqCst)
    }

    pub fn identity(&self) -> usize {
        self.identity.load(Ordering::SeqCst)
    }

    pub fn raw_data(&self) -> usize {
        self.raw_data.load(Ordering::SeqCst)
    }
}

/// A provider with a canned dataset.
pub struct MockProvider {
    name: ProviderName,
    account_id: AccountId,
    schema: Vec<String>,
    selector: Selector,
    services: Vec<RawServiceData>,
    handlers: ServiceRegistry,
    fail_at: Option<FailAt>,
    delay: Option<Duration>,
    calls: Arc<CallCounts>,
}

impl MockProvider {
    pub fn new(name: impl Into<ProviderName>) -> Self {
        Self {
            name: name.into(),
            account_id: AccountId::new("000000000000"),
            schema: Vec::new(),
            selector: Selector::default(),
            services: Vec::new(),
            handlers: ServiceRegistry::new(),
            fail_at: None,
            delay: None,
            calls: Arc::new(CallCounts::default()),
        }
    }

    pub fn with_account(mut self, account_id: impl Into<AccountId>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_type_defs<I, S>(mut self, type_defs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = type_defs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Adds a service's records, handled by `handler`.
    pub fn with_service(mut self, data: RawServiceData, handler: Arc<dyn ServiceHandler>) -> Self {
        self.handlers.register(data.service_type.clone(), handler);
        self.services.push(data);
        self
    }

    /// Adds a service's records with no handler registered for it.
    pub fn with_unhandled_service(mut self, data: RawServiceData) -> Self {
        self.services.push(data);
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Sleeps before answering each async call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle on the call counters.
    pub fn calls(&self) -> Arc<CallCounts> {
        Arc::clone(&self.calls)
    }

    async fn step(&self, counter: &AtomicUsize, step: FailAt) -> ProviderResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_at != Some(step) {
            return Ok(());
        }
        let message = format!("{} scripted failure", self.name);
        Err(match step {
            FailAt::Credentials => ProviderError::Auth(message),
            FailAt::Identity => ProviderError::Identity(message),
            FailAt::Fetch => ProviderError::Fetch(message),
        })
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    fn schema_fragment(&self, _options: &ProviderOptions) -> SchemaFragment {
        SchemaFragment::new(self.name.clone(), self.schema.clone())
    }

    fn default_selector(&self) -> Selector {
        self.selector.clone()
    }

    async fn credentials(&self, _options: &ProviderOptions) -> ProviderResult<Credentials> {
        self.step(&self.calls.credentials, FailAt::Credentials).await?;
        Ok(Credentials::new(json!({ "mock": self.name.as_str() })))
    }

    async fn identity(
        &self,
        _credentials: &Credentials,
        _options: &ProviderOptions,
    ) -> ProviderResult<AccountId> {
        self.step(&self.calls.identity, FailAt::Identity).await?;
        Ok(self.account_id.clone())
    }

    async fn raw_data(&self, request: DataRequest<'_>) -> ProviderResult<ProviderDataset> {
        self.step(&self.calls.raw_data, FailAt::Fetch).await?;
        let services = self
            .services
            .iter()
            .filter(|s| request.selector.includes_service(&s.service_type))
            .map(|s| RawServiceData {
                service_type: s.service_type.clone(),
                regions: s
                    .regions
                    .iter()
                    .filter(|r| request.selector.includes_region(&r.region))
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(ProviderDataset::new(services))
    }

    fn service_handler(&self, service_type: &ServiceType) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.get(service_type)
    }
}

/// Handler for records shaped like
/// `{"id": "...", "connections": [{"relation": "...", "target": "..."}], ...}`.
///
/// Every other top-level field becomes an attribute; `null` fields become
/// the absent marker.
#[derive(Debug, Clone)]
pub struct JsonHandler {
    service_type: ServiceType,
    mutation: MutationDescriptor,
    many: Vec<String>,
}

impl JsonHandler {
    pub fn new(service_type: impl Into<ServiceType>, type_name: &str) -> Self {
        Self {
            service_type: service_type.into(),
            mutation: MutationDescriptor::add_upsert(type_name),
            many: Vec::new(),
        }
    }

    /// Pins `relation` to list-valued attachment.
    pub fn with_many(mut self, relation: impl Into<String>) -> Self {
        self.many.push(relation.into());
        self
    }

    pub fn shared(self) -> Arc<dyn ServiceHandler> {
        Arc::new(self)
    }

    fn identity(&self, record: &RawRecord) -> ModelResult<EntityIdentity> {
        record
            .get_str("/id")
            .filter(|id| !id.is_empty())
            .map(EntityIdentity::from)
            .ok_or_else(|| ModelError::MissingIdentity {
                service: self.service_type.clone(),
                pointer: "/id".to_string(),
            })
    }
}

impl ServiceHandler for JsonHandler {
    fn format(&self, record: &RawRecord, _ctx: &RegionContext) -> ModelResult<Entity> {
        let id = self.identity(record)?;
        let Value::Object(fields) = record.as_value() else {
            return Err(ModelError::InvalidRecord {
                service: self.service_type.clone(),
                reason: "record is not an object".to_string(),
            });
        };
        let mut entity = Entity::new(self.service_type.clone(), id);
        for (key, value) in fields {
            if key == "id" || key == "connections" {
                continue;
            }
            entity = entity.with_optional(key.as_str(), (!value.is_null()).then(|| value.clone()));
        }
        Ok(entity)
    }

    fn resolve_connections(
        &self,
        record: &RawRecord,
        _ctx: &RegionContext,
        _dataset: &ProviderDataset,
    ) -> ModelResult<ConnectionIndex> {
        let mut edges = ConnectionIndex::new();
        let Some(Value::Array(connections)) = record.pointer("/connections") else {
            return Ok(edges);
        };
        let source = self.identity(record)?;
        for connection in connections {
            let relation = connection.get("relation").and_then(Value::as_str);
            let target = connection.get("target").and_then(Value::as_str);
            if let (Some(relation), Some(target)) = (relation, target) {
                edges.connect(source.clone(), relation, target);
            }
        }
        Ok(edges)
    }

    fn mutation(&self) -> MutationDescriptor {
        self.mutation.clone()
    }

    fn relation_cardinality(&self, relation: &str) -> Option<Cardinality> {
        self.many
            .iter()
            .any(|r| r == relation)
            .then_some(Cardinality::Many)
    }
}
