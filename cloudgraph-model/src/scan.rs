use crate::{ConnectionIndex, ConnectionJoiner, Entity};
use cloudgraph_types::ServiceType;
use serde::{Deserialize, Serialize};

/// The formatted entities of one service type, in raw-record order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntities {
    pub name: ServiceType,
    pub data: Vec<Entity>,
}

/// One provider's scan: entities per service plus the merged connection index.
///
/// This is what gets written to the snapshot file and what the sync engine
/// turns into batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub entities: Vec<ServiceEntities>,
    pub connections: ConnectionIndex,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a service's entities. A service pushed twice keeps one group,
    /// at its first position, so each service still syncs as one batch.
    pub fn push_service(&mut self, name: ServiceType, data: Vec<Entity>) {
        match self.entities.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.data.extend(data),
            None => self.entities.push(ServiceEntities { name, data }),
        }
    }

    pub fn service(&self, name: &ServiceType) -> Option<&ServiceEntities> {
        self.entities.iter().find(|s| &s.name == name)
    }

    /// Every entity across services, in service then record order.
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().flat_map(|s| s.data.iter())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.iter().map(|s| s.data.len()).sum()
    }

    /// A joiner over this scan's full entity set and connection index.
    pub fn joiner(&self) -> ConnectionJoiner<'_> {
        ConnectionJoiner::new(self.all_entities(), &self.connections)
    }
}
