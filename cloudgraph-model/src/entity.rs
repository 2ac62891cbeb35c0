use cloudgraph_types::{EntityIdentity, ServiceType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker stored for an optional field the raw record did not carry.
///
/// Formatters write this instead of leaving the key out, so a joiner can
/// tell "not applicable" (key missing) from "applicable but absent".
pub const ABSENT: Value = Value::Null;

/// Keys an entity serializes itself; attributes cannot use them.
pub const RESERVED_KEYS: [&str; 2] = ["id", "serviceType"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// A normalized resource produced by formatting exactly one raw record.
///
/// Serialized as a flat object: `{"id": .., "serviceType": .., <attributes>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityIdentity,
    #[serde(rename = "serviceType")]
    pub service_type: ServiceType,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(service_type: impl Into<ServiceType>, id: impl Into<EntityIdentity>) -> Self {
        Self {
            id: id.into(),
            service_type: service_type.into(),
            attributes: Map::new(),
        }
    }

    /// Sets an attribute, builder style.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Sets an optional attribute, writing [`ABSENT`] when the value is missing.
    pub fn with_optional<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.set_attr(key, value.map_or(ABSENT, Into::into));
        self
    }

    /// Sets an attribute. Writes to [`RESERVED_KEYS`] are ignored.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if is_reserved_key(&key) {
            return;
        }
        self.attributes.insert(key, value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// True when the key is present and holds the absent marker.
    pub fn is_absent(&self, key: &str) -> bool {
        matches!(self.attributes.get(key), Some(Value::Null))
    }

    /// Extract a string value from the attributes using a JSON pointer (e.g., "/tags/Name").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.lookup(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.lookup(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.lookup(pointer).and_then(|v| v.as_f64())
    }

    fn lookup(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let (head, tail) = match rest.split_once('/') {
            Some((head, tail)) => (head, Some(tail)),
            None => (rest, None),
        };
        let value = self.attributes.get(head)?;
        match tail {
            Some(tail) => value.pointer(&format!("/{tail}")),
            None => Some(value),
        }
    }

    /// The store input object for this entity: `id` plus attributes.
    /// The service type is implied by the mutation and not sent.
    pub fn to_input(&self) -> Value {
        let mut object = self.attributes.clone();
        object.insert("id".into(), Value::String(self.id.to_string()));
        Value::Object(object)
    }
}
