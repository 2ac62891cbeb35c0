//! Connection edges and the per-provider connection index.

use cloudgraph_types::EntityIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A directed reference from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionEdge {
    pub source: EntityIdentity,
    pub relation: String,
    pub target: EntityIdentity,
}

impl ConnectionEdge {
    pub fn new(
        source: impl Into<EntityIdentity>,
        relation: impl Into<String>,
        target: impl Into<EntityIdentity>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }
}

/// The outgoing half of an edge, as stored under its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub relation: String,
    pub target: EntityIdentity,
}

/// Edges grouped by source identity.
///
/// Append-only: edges can be added or merged in, never removed. Each source
/// keeps its edges in insertion order and holds a `(relation, target)` pair
/// at most once, so merging the same edge twice is a no-op. The same type
/// carries one resolver's partial output and the merged provider index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionIndex {
    edges: BTreeMap<EntityIdentity, Vec<Connection>>,
}

impl ConnectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge. Returns `false` if the same edge was already present.
    pub fn insert(&mut self, edge: ConnectionEdge) -> bool {
        let ConnectionEdge {
            source,
            relation,
            target,
        } = edge;
        let outgoing = self.edges.entry(source).or_default();
        if outgoing
            .iter()
            .any(|c| c.relation == relation && c.target == target)
        {
            return false;
        }
        outgoing.push(Connection { relation, target });
        true
    }

    /// Shorthand for inserting `source --relation--> target`.
    pub fn connect(
        &mut self,
        source: impl Into<EntityIdentity>,
        relation: impl Into<String>,
        target: impl Into<EntityIdentity>,
    ) -> bool {
        self.insert(ConnectionEdge::new(source, relation, target))
    }

    /// Folds another index into this one, keeping existing edges first.
    /// Returns the number of edges that were new.
    pub fn merge(&mut self, other: ConnectionIndex) -> usize {
        let mut added = 0;
        for (source, outgoing) in other.edges {
            for Connection { relation, target } in outgoing {
                if self.insert(ConnectionEdge {
                    source: source.clone(),
                    relation,
                    target,
                }) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Outgoing connections of a source, in insertion order.
    pub fn get(&self, source: &EntityIdentity) -> &[Connection] {
        self.edges.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sources(&self) -> impl Iterator<Item = &EntityIdentity> {
        self.edges.keys()
    }

    /// All edges, grouped by source in identity order.
    pub fn edges(&self) -> impl Iterator<Item = ConnectionEdge> + '_ {
        self.edges.iter().flat_map(|(source, outgoing)| {
            outgoing.iter().map(move |c| ConnectionEdge {
                source: source.clone(),
                relation: c.relation.clone(),
                target: c.target.clone(),
            })
        })
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl FromIterator<ConnectionEdge> for ConnectionIndex {
    fn from_iter<I: IntoIterator<Item = ConnectionEdge>>(iter: I) -> Self {
        let mut index = Self::new();
        for edge in iter {
            index.insert(edge);
        }
        index
    }
}
