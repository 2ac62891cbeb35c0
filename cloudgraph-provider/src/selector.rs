use cloudgraph_types::{Region, ServiceType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which regions and resource types a scan should fetch.
///
/// An empty list selects everything on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub regions: Vec<Region>,
    pub resource_types: Vec<ServiceType>,
}

impl Selector {
    pub fn new(regions: Vec<Region>, resource_types: Vec<ServiceType>) -> Self {
        Self {
            regions,
            resource_types,
        }
    }

    /// Parses comma-separated lists such as `"us-east-1, us-west-2"`.
    /// Blank entries are skipped and repeats keep their first position.
    pub fn parse(regions: &str, resource_types: &str) -> Self {
        Self {
            regions: split_list(regions),
            resource_types: split_list(resource_types),
        }
    }

    pub fn includes_region(&self, region: &Region) -> bool {
        self.regions.is_empty() || self.regions.contains(region)
    }

    pub fn includes_service(&self, service_type: &ServiceType) -> bool {
        self.resource_types.is_empty() || self.resource_types.contains(service_type)
    }
}

fn split_list<T: From<String> + PartialEq>(list: &str) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let item = T::from(item.to_string());
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<&str>| items.join(",");
        write!(
            f,
            "regions={} resources={}",
            join(self.regions.iter().map(Region::as_str).collect()),
            join(self.resource_types.iter().map(ServiceType::as_str).collect()),
        )
    }
}
