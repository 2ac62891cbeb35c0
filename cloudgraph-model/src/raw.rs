//! Raw provider data as fetched, before formatting.

use cloudgraph_types::{AccountId, Region, ServiceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One resource instance exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Looks up a value using a JSON pointer (e.g., "/InstanceId").
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    /// Extract a string value using a JSON pointer.
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(|v| v.as_str())
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Where a record was fetched from, passed to formatters and resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionContext {
    pub region: Region,
    pub account_id: AccountId,
}

impl RegionContext {
    pub fn new(region: Region, account_id: AccountId) -> Self {
        Self { region, account_id }
    }
}

/// The records of one service in one region, in fetch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecords {
    pub region: Region,
    pub records: Vec<RawRecord>,
}

/// Everything a provider fetched for one service type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawServiceData {
    pub service_type: ServiceType,
    pub regions: Vec<RegionRecords>,
}

impl RawServiceData {
    pub fn new(service_type: ServiceType) -> Self {
        Self {
            service_type,
            regions: Vec::new(),
        }
    }

    /// Appends a region's records, preserving call order.
    pub fn with_region(mut self, region: Region, records: Vec<RawRecord>) -> Self {
        self.regions.push(RegionRecords { region, records });
        self
    }

    /// Iterates records region by region, in fetch order.
    pub fn records(&self) -> impl Iterator<Item = (&Region, &RawRecord)> {
        self.regions
            .iter()
            .flat_map(|r| r.records.iter().map(move |rec| (&r.region, rec)))
    }

    pub fn record_count(&self) -> usize {
        self.regions.iter().map(|r| r.records.len()).sum()
    }
}

/// The full raw dataset of one provider run, in the provider's service
/// enumeration order. Connection resolvers read across services through it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderDataset {
    services: Vec<RawServiceData>,
}

impl ProviderDataset {
    pub fn new(services: Vec<RawServiceData>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[RawServiceData] {
        &self.services
    }

    /// Returns the data for a service type, if the provider returned any.
    pub fn service(&self, service_type: &ServiceType) -> Option<&RawServiceData> {
        self.services.iter().find(|s| &s.service_type == service_type)
    }

    /// Iterates the records of one service; empty if the service is absent.
    pub fn records_of<'a>(
        &'a self,
        service_type: &ServiceType,
    ) -> impl Iterator<Item = (&'a Region, &'a RawRecord)> + use<'a> {
        self.service(service_type).into_iter().flat_map(|s| s.records())
    }

    pub fn record_count(&self) -> usize {
        self.services.iter().map(RawServiceData::record_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
