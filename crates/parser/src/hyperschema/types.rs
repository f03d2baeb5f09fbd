//! Hyper-Schema type definitions
//!
//! The document is kept as an arena: every definition (top-level resources and
//! their nested `definitions`) is stored once, keyed by its JSON pointer.
//! Cross references are pointer strings, never owned children, so the
//! naturally cyclic resource graph needs no recursive ownership.

use hyperschema_stackql_common::{GeneratorError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One operation template embedded in a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    /// URI template (e.g. "/apps/{(%23%2Fdefinitions%2Fapp%2Fdefinitions%2Fidentity)}")
    pub href: String,

    /// HTTP verb; Hyper-Schema defaults to GET
    #[serde(default = "default_method")]
    pub method: String,

    /// Relation name (create, update, instances, self, destroy, ...)
    #[serde(default)]
    pub rel: String,

    /// Human-readable name (e.g. "Create", "List by App")
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Input shape
    #[serde(default)]
    pub schema: Option<Value>,

    /// Output shape
    #[serde(rename = "targetSchema")]
    #[serde(default)]
    pub target_schema: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A named schema node
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Name within the parent `definitions` mapping
    pub key: String,

    /// Pointer path, e.g. "#/definitions/app/definitions/id"
    pub pointer: String,

    pub description: Option<String>,

    /// Property name -> raw type descriptor
    pub properties: IndexMap<String, Value>,

    pub links: Vec<LinkDescriptor>,

    /// Nested definition name -> pointer
    pub definitions: IndexMap<String, String>,

    /// Raw schema node
    pub schema: Value,
}

/// Fully resolved Hyper-Schema document
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub(crate) root: Value,

    /// Every definition, keyed by pointer
    pub(crate) definitions: IndexMap<String, Definition>,

    /// Pointers of direct children of the top-level `definitions`, in source order
    pub(crate) top_level: Vec<String>,

    /// `$ref` value -> pointer of the concrete node it lands on
    pub(crate) resolved_refs: HashMap<String, String>,
}

impl SchemaDocument {
    /// Top-level description of the schema
    pub fn description(&self) -> Option<&str> {
        self.root.get("description").and_then(Value::as_str)
    }

    /// Top-level title of the schema
    pub fn title(&self) -> Option<&str> {
        self.root.get("title").and_then(Value::as_str)
    }

    /// Look up a definition by pointer
    pub fn definition(&self, pointer: &str) -> Option<&Definition> {
        self.definitions.get(pointer)
    }

    /// Look up a top-level definition by key
    pub fn resource(&self, key: &str) -> Option<&Definition> {
        self.definitions.get(&format!("#/definitions/{}", escape_token(key)))
    }

    /// Direct children of the top-level `definitions`, in source order
    pub fn top_level(&self) -> impl Iterator<Item = &Definition> {
        self.top_level
            .iter()
            .filter_map(|pointer| self.definitions.get(pointer))
    }

    /// Number of definitions in the arena, nested ones included
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Raw node at a `#/...` pointer
    pub fn node(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('#')?;
        if path.is_empty() {
            return Some(&self.root);
        }
        self.root.pointer(path)
    }

    /// Pointer of the concrete node a reference lands on
    pub fn resolve_ref(&self, reference: &str) -> Result<String> {
        if let Some(pointer) = self.resolved_refs.get(reference) {
            return Ok(pointer.clone());
        }
        follow_ref(&self.root, reference)
    }

    /// Follow a `{"$ref": ...}` node to its target, or return the node itself
    pub fn resolve_node<'a>(&'a self, node: &'a Value) -> Result<&'a Value> {
        match ref_of(node) {
            Some(reference) => {
                let pointer = self.resolve_ref(reference)?;
                self.node(&pointer).ok_or_else(|| GeneratorError::SchemaResolution {
                    pointer,
                    reason: "reference target vanished".to_string(),
                })
            }
            None => Ok(node),
        }
    }
}

/// `$ref` value of a node, if it has one
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Escape a key for use as a JSON pointer token
pub fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Walk a reference chain to a concrete node
///
/// A node whose only key is `$ref` is an alias and is followed further; a
/// chain that revisits a pointer never reaches a concrete node and fails.
pub(crate) fn follow_ref(root: &Value, reference: &str) -> Result<String> {
    let mut visited = HashSet::new();
    let mut current = reference.to_string();

    loop {
        let Some(path) = current.strip_prefix('#') else {
            return Err(GeneratorError::SchemaResolution {
                pointer: current,
                reason: "only document-local references are supported".to_string(),
            });
        };

        if !visited.insert(current.clone()) {
            return Err(GeneratorError::SchemaResolution {
                pointer: current,
                reason: "reference cycle never reaches a concrete schema".to_string(),
            });
        }

        let target = if path.is_empty() {
            Some(root)
        } else {
            root.pointer(path)
        };

        let Some(target) = target else {
            return Err(GeneratorError::SchemaResolution {
                pointer: current,
                reason: "reference does not resolve to a schema node".to_string(),
            });
        };

        match target.as_object() {
            Some(object) if object.len() == 1 && object.contains_key("$ref") => {
                match ref_of(target) {
                    Some(next) => current = next.to_string(),
                    None => {
                        return Err(GeneratorError::SchemaResolution {
                            pointer: current,
                            reason: "$ref must be a string".to_string(),
                        })
                    }
                }
            }
            _ => return Ok(current),
        }
    }
}
