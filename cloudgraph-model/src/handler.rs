use crate::{
    Cardinality, ConnectionIndex, Entity, ModelResult, ProviderDataset, RawRecord, RegionContext,
};
use cloudgraph_types::ServiceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

fn default_input_variable() -> String {
    "input".to_string()
}

/// How a service's entities are written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationDescriptor {
    /// The mutation document, e.g. `mutation($input: [AddAwsAlbInput!]!) { ... }`.
    pub mutation: String,
    /// Name of the variable the entity list is bound to.
    #[serde(default = "default_input_variable")]
    pub input_variable: String,
}

impl MutationDescriptor {
    pub fn new(mutation: impl Into<String>) -> Self {
        Self {
            mutation: mutation.into(),
            input_variable: default_input_variable(),
        }
    }

    pub fn with_input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variable = name.into();
        self
    }

    /// The conventional upserting `add<Type>` mutation for a store type.
    pub fn add_upsert(type_name: &str) -> Self {
        Self::new(format!(
            "mutation($input: [Add{type_name}Input!]!) {{ \
             add{type_name}(input: $input, upsert: true) {{ numUids }} }}"
        ))
    }
}

/// Per-service-type capabilities a provider hands to the scan driver.
///
/// Implementations must be pure: the same record and context always yield
/// the same entity and edges, and neither call touches the network.
pub trait ServiceHandler: Send + Sync {
    /// Formats one raw record into an entity.
    fn format(&self, record: &RawRecord, ctx: &RegionContext) -> ModelResult<Entity>;

    /// Resolves the record's outgoing edges. May read any service in the
    /// provider's dataset. Services without cross-references keep the
    /// default, which returns no edges.
    fn resolve_connections(
        &self,
        record: &RawRecord,
        ctx: &RegionContext,
        dataset: &ProviderDataset,
    ) -> ModelResult<ConnectionIndex> {
        let _ = (record, ctx, dataset);
        Ok(ConnectionIndex::new())
    }

    /// The store mutation for this service's batch.
    fn mutation(&self) -> MutationDescriptor;

    /// Pins a relation's cardinality. `None` lets the joiner infer it from
    /// the edge count of each source.
    fn relation_cardinality(&self, relation: &str) -> Option<Cardinality> {
        let _ = relation;
        None
    }
}

/// Maps service-type tags to their handlers.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    handlers: HashMap<ServiceType, Arc<dyn ServiceHandler>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for the same type.
    pub fn register(&mut self, service_type: impl Into<ServiceType>, handler: Arc<dyn ServiceHandler>) {
        self.handlers.insert(service_type.into(), handler);
    }

    pub fn with(mut self, service_type: impl Into<ServiceType>, handler: Arc<dyn ServiceHandler>) -> Self {
        self.register(service_type, handler);
        self
    }

    pub fn get(&self, service_type: &ServiceType) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.get(service_type).cloned()
    }

    pub fn contains(&self, service_type: &ServiceType) -> bool {
        self.handlers.contains_key(service_type)
    }

    /// Registered service types, sorted.
    pub fn service_types(&self) -> Vec<ServiceType> {
        let mut types: Vec<_> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_types", &self.service_types())
            .finish()
    }
}
