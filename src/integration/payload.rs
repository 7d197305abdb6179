//! Protocol v3 document written to stdout for the host agent.

use crate::error::PublishError;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::io::Write;

pub const INTEGRATION_NAME: &str = "com.newrelic.mysql";
pub const PROTOCOL_VERSION: &str = "3";
pub const NODE_ENTITY_TYPE: &str = "node";
pub const EVENT_TYPE: &str = "MysqlSample";

#[derive(Debug, Serialize)]
pub struct Integration {
    pub name: &'static str,
    pub protocol_version: &'static str,
    pub integration_version: &'static str,
    pub data: Vec<EntityData>,
}

impl Default for Integration {
    fn default() -> Self {
        Self::new()
    }
}

impl Integration {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: INTEGRATION_NAME,
            protocol_version: PROTOCOL_VERSION,
            integration_version: env!("CARGO_PKG_VERSION"),
            data: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity: EntityData) {
        self.data.push(entity);
    }

    /// Serialize the document to `writer`, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if serialization or the write fails.
    pub fn publish<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), PublishError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize)]
pub struct EntityData {
    #[serde(rename = "entity", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntityMetadata>,
    pub metrics: Vec<MetricSet>,
    pub inventory: Inventory,
    pub events: Vec<Value>,
}

impl EntityData {
    #[must_use]
    pub fn new(metadata: Option<EntityMetadata>) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Always empty: a node is identified by its name alone.
    pub id_attributes: Vec<Value>,
}

/// Flat map of `event_type`, attributes and metric values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<String, Value>);

impl MetricSet {
    #[must_use]
    pub fn new(event_type: &str, attributes: &[(&str, String)]) -> Self {
        let mut set = Self::default();
        set.set_attribute("event_type", event_type);
        for (name, value) in attributes {
            set.set_attribute(name, value);
        }
        set
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), Value::String(value.to_string()));
    }

    /// Set a numeric metric. Non-finite values are not representable and are
    /// dropped; returns whether the value was set.
    pub fn set_metric(&mut self, name: &str, value: f64) -> bool {
        match Number::from_f64(value) {
            Some(n) => {
                self.0.insert(name.to_string(), Value::Number(n));
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inventory items: `{ "<item>": { "<field>": value } }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<String, BTreeMap<String, Value>>);

impl Inventory {
    pub fn set_item(&mut self, key: &str, field: &str, value: Value) {
        self.0
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    #[must_use]
    pub fn item(&self, key: &str) -> Option<&BTreeMap<String, Value>> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
