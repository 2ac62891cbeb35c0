use crate::{ProviderResult, Selector};
use async_trait::async_trait;
use cloudgraph_model::{ProviderDataset, SchemaFragment, ServiceHandler};
use cloudgraph_types::{AccountId, ProviderName, ServiceType};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Run-wide switches passed through to every provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOptions {
    pub debug: bool,
    pub dev_mode: bool,
}

/// Opaque provider credentials. Never printed.
#[derive(Clone)]
pub struct Credentials(Value);

impl Credentials {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Everything a provider needs to fetch raw data.
#[derive(Debug, Clone, Copy)]
pub struct DataRequest<'a> {
    pub selector: &'a Selector,
    pub credentials: &'a Credentials,
    pub options: &'a ProviderOptions,
}

/// The capability contract a cloud provider exposes to the scan driver.
///
/// The async methods are network-bound; the driver bounds each of them with
/// its own timeout.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable registry key (e.g. `aws`).
    fn name(&self) -> &ProviderName;

    /// The provider's store schema declarations.
    fn schema_fragment(&self, options: &ProviderOptions) -> SchemaFragment;

    /// Regions and services scanned when no explicit selector is configured.
    fn default_selector(&self) -> Selector;

    /// Acquires credentials.
    async fn credentials(&self, options: &ProviderOptions) -> ProviderResult<Credentials>;

    /// Resolves the account the credentials belong to.
    async fn identity(
        &self,
        credentials: &Credentials,
        options: &ProviderOptions,
    ) -> ProviderResult<AccountId>;

    /// Fetches raw records for the selected regions and services, in the
    /// provider's service enumeration order.
    async fn raw_data(&self, request: DataRequest<'_>) -> ProviderResult<ProviderDataset>;

    /// Format/connect/mutation capabilities for one service type.
    fn service_handler(&self, service_type: &ServiceType) -> Option<Arc<dyn ServiceHandler>>;
}
