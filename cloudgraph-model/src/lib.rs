//! Entity graph model for CloudGraph.
//!
//! Defines the types that flow between a provider and the graph store:
//! - [`RawRecord`] / [`ProviderDataset`] — what a provider fetched, grouped by service and region
//! - [`Entity`] — one normalized resource (identity, service type, attribute map)
//! - [`ConnectionIndex`] — deduplicated, append-only edges keyed by source identity
//! - [`ConnectionJoiner`] — attaches target entities to their sources
//! - [`ScanResult`] — the per-provider unit written to snapshots and synced
//! - [`ServiceHandler`] / [`ServiceRegistry`] — per-service-type format/connect/mutation capabilities
//! - [`SchemaFragment`] / [`CombinedSchema`] — provider schema declarations
//!
//! Nothing here performs I/O. Formatting, resolution and joining are pure
//! functions of their inputs.

mod connection;
mod entity;
mod error;
mod handler;
mod join;
mod raw;
mod scan;
mod schema;

pub use connection::{Connection, ConnectionEdge, ConnectionIndex};
pub use entity::{ABSENT, Entity, RESERVED_KEYS, is_reserved_key};
pub use error::{ModelError, ModelResult};
pub use handler::{MutationDescriptor, ServiceHandler, ServiceRegistry};
pub use join::{Attachment, Cardinality, ConnectedEntity, ConnectionJoiner, join};
pub use raw::{ProviderDataset, RawRecord, RawServiceData, RegionContext, RegionRecords};
pub use scan::{ScanResult, ServiceEntities};
pub use schema::{CombinedSchema, SchemaFragment};
