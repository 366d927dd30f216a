//! Reference `serde_json` adapter
//!
//! Walks a JSON resource once, assigning a stable id to every object node,
//! and answers the [`ResourceAdapter`] queries from the resulting arena.
//! `choice[x]` fields resolve by prefix: asking for `value` on a node that
//! carries `valueQuantity` yields that child with type name `Quantity`.
//!
//! This is the capability interface made concrete for tests and embedders
//! that already hold JSON; it is not a schema or validation layer.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::adapter::ResourceAdapter;
use crate::error::{Error, Result};
use crate::value::{Collection, ElementHandle, Value};

const DEFAULT_TYPE: &str = "Element";

enum Child {
    Primitive(Value),
    Node(u64),
}

struct Node {
    type_name: Arc<str>,
    children: BTreeMap<String, Vec<Child>>,
}

pub struct JsonAdapter {
    nodes: Vec<Node>,
}

impl JsonAdapter {
    /// Index a resource; the returned handle is its root element.
    pub fn from_json(resource: &serde_json::Value) -> Result<(Self, ElementHandle)> {
        let serde_json::Value::Object(object) = resource else {
            return Err(Error::Type("resource root must be a JSON object".into()));
        };
        let mut adapter = Self { nodes: Vec::new() };
        let root = adapter.add_node(object, DEFAULT_TYPE);
        let handle = adapter.handle(root);
        Ok((adapter, handle))
    }

    fn handle(&self, id: u64) -> ElementHandle {
        ElementHandle::new(id, self.nodes[id as usize].type_name.clone())
    }

    fn add_node(&mut self, object: &serde_json::Map<String, serde_json::Value>, type_hint: &str) -> u64 {
        let type_name: Arc<str> = object
            .get("resourceType")
            .and_then(|v| v.as_str())
            .unwrap_or(type_hint)
            .into();

        let id = self.nodes.len() as u64;
        self.nodes.push(Node {
            type_name,
            children: BTreeMap::new(),
        });

        let mut children = BTreeMap::new();
        for (key, value) in object {
            if key == "resourceType" {
                continue;
            }
            let mut entries = Vec::new();
            match value {
                serde_json::Value::Array(items) => {
                    for item in items {
                        if let Some(child) = self.add_child(key, item) {
                            entries.push(child);
                        }
                    }
                }
                other => {
                    if let Some(child) = self.add_child(key, other) {
                        entries.push(child);
                    }
                }
            }
            if !entries.is_empty() {
                children.insert(key.clone(), entries);
            }
        }
        self.nodes[id as usize].children = children;
        id
    }

    fn add_child(&mut self, key: &str, value: &serde_json::Value) -> Option<Child> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Child::Primitive(Value::boolean(*b))),
            serde_json::Value::Number(n) => {
                let value = if let Some(i) = n.as_i64() {
                    Value::integer(i)
                } else {
                    Value::decimal(Decimal::from_str(&n.to_string()).ok()?)
                };
                Some(Child::Primitive(value))
            }
            serde_json::Value::String(s) => Some(Child::Primitive(Value::string(s.as_str()))),
            serde_json::Value::Object(object) => {
                let hint = choice_suffix(key).unwrap_or(DEFAULT_TYPE.into());
                let id = self.add_node(object, &hint);
                Some(Child::Node(id))
            }
            // Nested arrays have no FHIR meaning; drop them.
            serde_json::Value::Array(_) => None,
        }
    }

    fn materialize(&self, entries: &[Child]) -> Collection {
        entries
            .iter()
            .map(|child| match child {
                Child::Primitive(value) => value.clone(),
                Child::Node(id) => Value::element(self.handle(*id)),
            })
            .collect()
    }
}

impl ResourceAdapter for JsonAdapter {
    fn children(&self, element: &ElementHandle, name: &str) -> Collection {
        let Some(node) = self.nodes.get(element.id as usize) else {
            return Collection::empty();
        };
        if let Some(entries) = node.children.get(name) {
            return self.materialize(entries);
        }
        // choice[x] resolution: valueQuantity answers for value.
        let mut out = Collection::empty();
        for (key, entries) in &node.children {
            if key.len() > name.len()
                && key.starts_with(name)
                && key[name.len()..].starts_with(char::is_uppercase)
            {
                out.extend(self.materialize(entries));
            }
        }
        out
    }

    fn type_name<'a>(&self, element: &'a ElementHandle) -> &'a str {
        element.type_name.as_ref()
    }

    fn is_type(&self, element: &ElementHandle, type_name: &str) -> bool {
        self.type_name(element) == type_name
    }
}

/// Type suffix of a `choice[x]` key, e.g. `valueQuantity` has suffix
/// `Quantity`. Returns `None` when the key has no uppercase split.
fn choice_suffix(key: &str) -> Option<String> {
    let split = key.find(char::is_uppercase)?;
    if split == 0 {
        return None;
    }
    Some(key[split..].to_string())
}
