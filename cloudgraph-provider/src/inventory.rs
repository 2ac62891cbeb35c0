//! File-backed provider that replays a recorded inventory.
//!
//! An inventory document describes one provider account: its credentials
//! block, account id, default regions, schema fragment, and for every
//! service a declarative handler spec plus the recorded raw records. Large
//! record sets can live in a separate `dataFile`, read at fetch time.
//!
//! ```json
//! {
//!   "credentials": {"profile": "default"},
//!   "accountId": "123456789012",
//!   "regions": ["us-east-1"],
//!   "schema": ["type AwsEc2 { id: String! @id ... }"],
//!   "services": [
//!     {
//!       "name": "ec2",
//!       "identity": "/InstanceId",
//!       "fields": {"instanceType": "/InstanceType", "keyName": "/KeyName"},
//!       "data": [{"region": "us-east-1", "records": [{"InstanceId": "i-1"}]}]
//!     },
//!     {
//!       "name": "alb",
//!       "identity": "/LoadBalancerArn",
//!       "relations": [
//!         {"relation": "instances", "source": "/TargetIps", "targetService": "ec2",
//!          "targetKey": "/PrivateIpAddress", "many": true}
//!       ],
//!       "dataFile": "alb.json"
//!     }
//!   ]
//! }
//! ```

use crate::{
    Credentials, DataRequest, Provider, ProviderError, ProviderOptions, ProviderResult, Selector,
};
use async_trait::async_trait;
use cloudgraph_model::{
    Cardinality, ConnectionIndex, Entity, ModelError, ModelResult, MutationDescriptor,
    ProviderDataset, RawRecord, RawServiceData, RegionContext, RegionRecords, SchemaFragment,
    ServiceHandler, ServiceRegistry, is_reserved_key,
};
use cloudgraph_types::{AccountId, EntityIdentity, ProviderName, Region, ServiceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// The on-disk inventory format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDocument {
    #[serde(default)]
    pub credentials: Option<Value>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub schema: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// Declarative handler spec and recorded data for one service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: ServiceType,
    /// JSON pointer to the record's identity.
    pub identity: String,
    /// Attribute name → JSON pointer. A pointer that finds nothing yields
    /// the absent marker.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub relations: Vec<RelationRule>,
    /// Store mutation; defaults to the upserting `add<Provider><Service>`.
    #[serde(default)]
    pub mutation: Option<MutationSpec>,
    #[serde(default)]
    pub data: Vec<RegionRecords>,
    /// Path (relative to the inventory file) of a JSON list of region records.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// A relation declared by a service spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRule {
    pub relation: String,
    /// JSON pointer to a string, number, or list of them in the source record.
    pub source: String,
    /// Service whose records the referenced values are looked up in.
    #[serde(default)]
    pub target_service: Option<ServiceType>,
    /// JSON pointer compared against the referenced value in each
    /// `target_service` record. Without it the value is the target identity.
    #[serde(default)]
    pub target_key: Option<String>,
    /// Always attach a list, even for a single target.
    #[serde(default)]
    pub many: bool,
}

/// Either a store type name or a full mutation descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MutationSpec {
    TypeName {
        #[serde(rename = "typeName")]
        type_name: String,
    },
    Descriptor(MutationDescriptor),
}

/// `aws` + `alb` → `AwsAlb`.
fn store_type_name(provider: &ProviderName, service: &ServiceType) -> String {
    [provider.as_str(), service.as_str()]
        .iter()
        .flat_map(|part| part.split(['_', '-']))
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Renders a scalar as an identity string.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Values referenced by a relation source: one scalar or a list of them.
fn referenced_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    }
}

fn identity_of(spec: &ServiceSpec, record: &RawRecord) -> ModelResult<EntityIdentity> {
    record
        .pointer(&spec.identity)
        .and_then(scalar_string)
        .map(EntityIdentity::from)
        .ok_or_else(|| ModelError::MissingIdentity {
            service: spec.name.clone(),
            pointer: spec.identity.clone(),
        })
}

/// [`ServiceHandler`] driven by a [`ServiceSpec`].
pub struct InventoryHandler {
    spec: ServiceSpec,
    specs: Arc<HashMap<ServiceType, ServiceSpec>>,
    mutation: MutationDescriptor,
}

impl ServiceHandler for InventoryHandler {
    fn format(&self, record: &RawRecord, ctx: &RegionContext) -> ModelResult<Entity> {
        let id = identity_of(&self.spec, record)?;
        let mut entity = Entity::new(self.spec.name.clone(), id)
            .with_attr("region", ctx.region.as_str())
            .with_attr("accountId", ctx.account_id.as_str());
        for (name, pointer) in &self.spec.fields {
            entity = entity.with_optional(name.as_str(), record.pointer(pointer).cloned());
        }
        Ok(entity)
    }

    fn resolve_connections(
        &self,
        record: &RawRecord,
        _ctx: &RegionContext,
        dataset: &ProviderDataset,
    ) -> ModelResult<ConnectionIndex> {
        let mut edges = ConnectionIndex::new();
        if self.spec.relations.is_empty() {
            return Ok(edges);
        }
        let source = identity_of(&self.spec, record)?;

        for rule in &self.spec.relations {
            let Some(value) = record.pointer(&rule.source) else {
                continue;
            };
            let wanted = referenced_values(value);

            match (&rule.target_service, &rule.target_key) {
                (Some(service), Some(key)) => {
                    let Some(target_spec) = self.specs.get(service) else {
                        continue;
                    };
                    for (_, candidate) in dataset.records_of(service) {
                        let matches = candidate
                            .pointer(key)
                            .and_then(scalar_string)
                            .is_some_and(|v| wanted.contains(&v));
                        if !matches {
                            continue;
                        }
                        if let Ok(target) = identity_of(target_spec, candidate) {
                            edges.connect(source.clone(), rule.relation.as_str(), target);
                        }
                    }
                }
                _ => {
                    for target in wanted {
                        edges.connect(source.clone(), rule.relation.as_str(), target);
                    }
                }
            }
        }
        Ok(edges)
    }

    fn mutation(&self) -> MutationDescriptor {
        self.mutation.clone()
    }

    fn relation_cardinality(&self, relation: &str) -> Option<Cardinality> {
        self.spec
            .relations
            .iter()
            .any(|r| r.relation == relation && r.many)
            .then_some(Cardinality::Many)
    }
}

/// A provider backed by an [`InventoryDocument`].
pub struct InventoryProvider {
    name: ProviderName,
    document: InventoryDocument,
    handlers: ServiceRegistry,
    base_dir: PathBuf,
}

impl InventoryProvider {
    /// Builds a provider from a parsed document. `base_dir` resolves
    /// relative `dataFile` paths.
    pub fn from_document(
        name: impl Into<ProviderName>,
        document: InventoryDocument,
        base_dir: impl Into<PathBuf>,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let mut specs = HashMap::new();
        for spec in &document.services {
            if !spec.identity.starts_with('/') {
                return Err(ProviderError::Definition(format!(
                    "{}: identity must be a JSON pointer, got {:?}",
                    spec.name, spec.identity
                )));
            }
            let reserved = spec
                .fields
                .keys()
                .map(String::as_str)
                .chain(spec.relations.iter().map(|r| r.relation.as_str()))
                .find(|key| is_reserved_key(key));
            if let Some(key) = reserved {
                return Err(ProviderError::Definition(format!(
                    "{}: {key:?} is reserved for the entity itself",
                    spec.name
                )));
            }
            if specs.insert(spec.name.clone(), spec.clone()).is_some() {
                return Err(ProviderError::Definition(format!(
                    "service {} declared twice",
                    spec.name
                )));
            }
        }
        let specs = Arc::new(specs);

        let mut handlers = ServiceRegistry::new();
        for spec in &document.services {
            let mutation = match &spec.mutation {
                Some(MutationSpec::Descriptor(descriptor)) => descriptor.clone(),
                Some(MutationSpec::TypeName { type_name }) => {
                    MutationDescriptor::add_upsert(type_name)
                }
                None => MutationDescriptor::add_upsert(&store_type_name(&name, &spec.name)),
            };
            let handler = InventoryHandler {
                spec: spec.clone(),
                specs: Arc::clone(&specs),
                mutation,
            };
            handlers.register(spec.name.clone(), Arc::new(handler));
        }

        Ok(Self {
            name,
            document,
            handlers,
            base_dir: base_dir.into(),
        })
    }

    /// Reads and parses an inventory file.
    pub async fn load(name: impl Into<ProviderName>, path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let document: InventoryDocument = serde_json::from_str(&content)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_document(name, document, base_dir)
    }

    pub fn document(&self) -> &InventoryDocument {
        &self.document
    }

    async fn region_records(&self, spec: &ServiceSpec) -> ProviderResult<Vec<RegionRecords>> {
        let Some(file) = &spec.data_file else {
            return Ok(spec.data.clone());
        };
        let path = self.base_dir.join(file);
        debug!(service = %spec.name, path = %path.display(), "Reading recorded service data");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ProviderError::Fetch(format!("{}: {e}", path.display())))?;
        let mut records: Vec<RegionRecords> = serde_json::from_str(&content)
            .map_err(|e| ProviderError::Fetch(format!("{}: {e}", path.display())))?;
        records.extend(spec.data.iter().cloned());
        Ok(records)
    }
}

#[async_trait]
impl Provider for InventoryProvider {
    fn name(&self) -> &ProviderName {
        &self.name
    }

    fn schema_fragment(&self, _options: &ProviderOptions) -> SchemaFragment {
        SchemaFragment::new(self.name.clone(), self.document.schema.clone())
    }

    fn default_selector(&self) -> Selector {
        let resource_types = self.document.services.iter().map(|s| s.name.clone()).collect();
        Selector::new(self.document.regions.clone(), resource_types)
    }

    async fn credentials(&self, _options: &ProviderOptions) -> ProviderResult<Credentials> {
        match &self.document.credentials {
            Some(value) if !value.is_null() => Ok(Credentials::new(value.clone())),
            _ => Err(ProviderError::Auth(format!(
                "no credentials recorded for {}",
                self.name
            ))),
        }
    }

    async fn identity(
        &self,
        _credentials: &Credentials,
        _options: &ProviderOptions,
    ) -> ProviderResult<AccountId> {
        self.document
            .account_id
            .clone()
            .ok_or_else(|| ProviderError::Identity(format!("no account id recorded for {}", self.name)))
    }

    async fn raw_data(&self, request: DataRequest<'_>) -> ProviderResult<ProviderDataset> {
        for wanted in &request.selector.resource_types {
            if !self.handlers.contains(wanted) {
                warn!(provider = %self.name, service = %wanted, "Service not present in inventory");
            }
        }

        let mut services = Vec::new();
        for spec in &self.document.services {
            if !request.selector.includes_service(&spec.name) {
                continue;
            }
            let mut data = RawServiceData::new(spec.name.clone());
            for region_records in self.region_records(spec).await? {
                if request.selector.includes_region(&region_records.region) {
                    data.regions.push(region_records);
                }
            }
            services.push(data);
        }
        Ok(ProviderDataset::new(services))
    }

    fn service_handler(&self, service_type: &ServiceType) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.get(service_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_type_name_pascal_cases_parts() {
        let name = store_type_name(&ProviderName::new("aws"), &ServiceType::new("alb"));
        assert_eq!(name, "AwsAlb");
        let name = store_type_name(&ProviderName::new("aws"), &ServiceType::new("ec2_instance"));
        assert_eq!(name, "AwsEc2Instance");
    }

    #[test]
    fn referenced_values_flattens_scalars() {
        let value = serde_json::json!(["a", 1, null, {"x": 1}, ""]);
        assert_eq!(referenced_values(&value), vec!["a".to_string(), "1".to_string()]);
        assert!(referenced_values(&Value::Bool(true)).is_empty());
    }
}
