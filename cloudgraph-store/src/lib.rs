//! Graph store interface for CloudGraph.
//!
//! The scan pipeline only talks to a [`GraphStore`]: it publishes one
//! combined schema per run and then submits one upsert per service batch.
//!
//! Implementations:
//! - [`DgraphClient`] — Dgraph's GraphQL endpoints over HTTP
//! - [`mock::RecordingStore`] — in-memory store that records calls, for tests

mod dgraph;
mod error;
pub mod mock;
mod store;

pub use dgraph::{DgraphClient, DgraphConfig};
pub use error::{StoreError, StoreResult};
pub use store::{GraphStore, UpsertAck};
