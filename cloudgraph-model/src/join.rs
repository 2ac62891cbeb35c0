//! Connection joiner — attaches target entities to their sources.

use crate::{ConnectionIndex, Entity};
use cloudgraph_types::EntityIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Whether a relation holds one target or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

/// The target entities attached under one relation name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attachment {
    One(Entity),
    Many(Vec<Entity>),
}

impl Attachment {
    /// The attached entities, regardless of cardinality.
    pub fn entities(&self) -> &[Entity] {
        match self {
            Attachment::One(entity) => std::slice::from_ref(entity),
            Attachment::Many(entities) => entities,
        }
    }

    fn to_input(&self) -> Value {
        match self {
            Attachment::One(entity) => entity.to_input(),
            Attachment::Many(entities) => {
                Value::Array(entities.iter().map(Entity::to_input).collect())
            }
        }
    }
}

/// An entity together with the targets of its outgoing relations.
///
/// The entity's own attributes are never rewritten; relations live beside
/// them and only overlay the attribute map in [`ConnectedEntity::to_input`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedEntity {
    #[serde(flatten)]
    pub entity: Entity,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Attachment>,
}

impl ConnectedEntity {
    pub fn relation(&self, name: &str) -> Option<&Attachment> {
        self.relations.get(name)
    }

    /// The store input object: entity input with relation fields set to
    /// the target entities' inputs.
    pub fn to_input(&self) -> Value {
        let mut input = self.entity.to_input();
        if let Value::Object(object) = &mut input {
            for (name, attachment) in &self.relations {
                object.insert(name.clone(), attachment.to_input());
            }
        }
        input
    }
}

/// Resolves edge targets against a fixed entity set.
///
/// The identity lookup is built once; when two entities share an identity
/// the first one wins.
pub struct ConnectionJoiner<'a> {
    lookup: HashMap<&'a EntityIdentity, &'a Entity>,
    index: &'a ConnectionIndex,
}

impl<'a> ConnectionJoiner<'a> {
    pub fn new(entities: impl IntoIterator<Item = &'a Entity>, index: &'a ConnectionIndex) -> Self {
        let mut lookup = HashMap::new();
        for entity in entities {
            lookup.entry(&entity.id).or_insert(entity);
        }
        Self { lookup, index }
    }

    /// Looks up a formatted entity by identity.
    pub fn entity(&self, id: &EntityIdentity) -> Option<&'a Entity> {
        self.lookup.get(id).copied()
    }

    /// Connects one entity, inferring cardinality from its edge count.
    pub fn connect(&self, entity: &Entity) -> ConnectedEntity {
        self.connect_with(entity, |_| None)
    }

    /// Connects one entity. `cardinality` may pin a relation to
    /// [`Cardinality::One`] or [`Cardinality::Many`]; for relations it
    /// returns `None` for, one edge means a single value and more means a
    /// list. Targets missing from the entity set are dropped, and a relation
    /// left with no targets is omitted.
    pub fn connect_with<F>(&self, entity: &Entity, cardinality: F) -> ConnectedEntity
    where
        F: Fn(&str) -> Option<Cardinality>,
    {
        let mut grouped: Vec<(&str, Vec<&EntityIdentity>)> = Vec::new();
        for connection in self.index.get(&entity.id) {
            match grouped
                .iter_mut()
                .find(|(relation, _)| *relation == connection.relation)
            {
                Some((_, targets)) => targets.push(&connection.target),
                None => grouped.push((connection.relation.as_str(), vec![&connection.target])),
            }
        }

        let mut relations = BTreeMap::new();
        for (relation, targets) in grouped {
            let shape = cardinality(relation).unwrap_or(if targets.len() == 1 {
                Cardinality::One
            } else {
                Cardinality::Many
            });
            let mut resolved: Vec<Entity> = targets
                .into_iter()
                .filter_map(|id| self.entity(id))
                .cloned()
                .collect();
            if resolved.is_empty() {
                continue;
            }
            let attachment = match shape {
                Cardinality::One => Attachment::One(resolved.swap_remove(0)),
                Cardinality::Many => Attachment::Many(resolved),
            };
            relations.insert(relation.to_string(), attachment);
        }

        ConnectedEntity {
            entity: entity.clone(),
            relations,
        }
    }
}

/// Joins every entity against the index with inferred cardinality.
pub fn join(entities: &[Entity], index: &ConnectionIndex) -> Vec<ConnectedEntity> {
    let joiner = ConnectionJoiner::new(entities, index);
    entities.iter().map(|e| joiner.connect(e)).collect()
}
