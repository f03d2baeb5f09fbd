//! Conversion of Hyper-Schema fragments into OpenAPI component schemas
//!
//! Referenced definitions are copied into `components/schemas` under a name
//! derived from their pointer and every `$ref` is rewritten to point there.
//! References are never inlined, so recursive definitions stay finite.
//!
//! Names are handed out by one [`ComponentNames`] per provider, so two
//! pointers that flatten to the same name never share a component.

use hyperschema_stackql_common::{GeneratorError, Result};
use hyperschema_stackql_parser::hyperschema::ref_of;
use hyperschema_stackql_parser::{sanitize_name, SchemaDocument, TypeMapper};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

/// Prefix of rewritten references
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Name of the shared error schema
pub const ERROR_COMPONENT: &str = "error";

/// Extension naming the primary identifier property of a response schema
pub const PRIMARY_IDENTIFIER_EXTENSION: &str = "x-stackQL-primaryIdentifier";

/// Hyper-Schema keys that are not valid in an OpenAPI 3.0 schema object
const STRIPPED_KEYS: &[&str] = &[
    "links",
    "definitions",
    "stability",
    "strictProperties",
    "$schema",
    "id",
    "title",
    "example",
    "patternProperties",
    "dependencies",
    "media",
];

/// Keys whose value is a single subschema
const SCHEMA_KEYS: &[&str] = &["items", "additionalProperties", "not"];

/// Keys whose value is a list of subschemas
const SCHEMA_LIST_KEYS: &[&str] = &["anyOf", "oneOf", "allOf"];

/// Preferred component name for a definition pointer
///
/// `#/definitions/app` becomes `app`, `#/definitions/app/definitions/id`
/// becomes `app_id`. Distinct pointers can flatten to the same name;
/// [`ComponentNames`] resolves those clashes.
pub fn component_name(pointer: &str) -> String {
    let joined = pointer
        .trim_start_matches('#')
        .split('/')
        .filter(|token| !token.is_empty() && *token != "definitions")
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join("_");

    let name = sanitize_name(&joined);
    if name.is_empty() {
        "root".to_string()
    } else {
        name
    }
}

/// Reference object pointing at a component
pub fn component_ref(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", SCHEMA_REF_PREFIX, name) })
}

/// Component name a `{"$ref": "#/components/schemas/..."}` node points at
pub fn referenced_component(node: &Value) -> Option<&str> {
    ref_of(node).and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
}

/// Shared error response schema
pub fn error_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "id of error raised"},
            "message": {"type": "string", "description": "end user message of error raised"},
            "url": {"type": "string", "description": "reference url with more information about the error"}
        }
    })
}

/// First property named `id` or ending in `_id`
pub fn primary_identifier(schema: &Value) -> Option<String> {
    schema
        .get("properties")
        .and_then(Value::as_object)?
        .keys()
        .find(|name| *name == "id" || name.ends_with("_id"))
        .cloned()
}

/// Provider-wide assignment of component names to schema locations
///
/// A location keeps the name it was first given. A later location whose
/// preferred name is taken gets a numeric suffix (`app_setup_2`).
#[derive(Debug)]
pub struct ComponentNames {
    by_location: HashMap<String, String>,
    taken: HashSet<String>,
}

impl ComponentNames {
    pub fn new() -> Self {
        let mut names = Self {
            by_location: HashMap::new(),
            taken: HashSet::new(),
        };
        names.assign(ERROR_COMPONENT, ERROR_COMPONENT);
        names
    }

    /// Name for a location, reserving `preferred` (or a suffixed variant)
    pub fn assign(&mut self, location: &str, preferred: &str) -> String {
        if let Some(name) = self.by_location.get(location) {
            return name.clone();
        }

        let mut name = preferred.to_string();
        let mut suffix = 2;
        while self.taken.contains(&name) {
            name = format!("{}_{}", preferred, suffix);
            suffix += 1;
        }

        self.taken.insert(name.clone());
        self.by_location.insert(location.to_string(), name.clone());
        name
    }

    /// Name for a definition pointer
    pub fn for_pointer(&mut self, pointer: &str) -> String {
        self.assign(pointer, &component_name(pointer))
    }
}

impl Default for ComponentNames {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the components one operation needs
pub struct ComponentCollector<'a> {
    doc: &'a SchemaDocument,
    names: &'a mut ComponentNames,
    components: IndexMap<String, Value>,
}

impl<'a> ComponentCollector<'a> {
    pub fn new(doc: &'a SchemaDocument, names: &'a mut ComponentNames) -> Self {
        Self {
            doc,
            names,
            components: IndexMap::new(),
        }
    }

    /// Name reserved for an inline schema at `location`
    pub fn name_inline(&mut self, location: &str, preferred: &str) -> String {
        self.names.assign(location, preferred)
    }

    /// Convert a schema fragment, pulling in every component it references
    pub fn convert(&mut self, node: &Value) -> Result<Value> {
        let Some(object) = node.as_object() else {
            return Ok(node.clone());
        };

        if let Some(reference) = ref_of(node) {
            let pointer = self.doc.resolve_ref(reference)?;
            let name = self.require(&pointer)?;
            return Ok(component_ref(&name));
        }

        let mut converted = Map::new();
        for (key, value) in object {
            if STRIPPED_KEYS.contains(&key.as_str()) {
                continue;
            }

            match key.as_str() {
                "type" => self.convert_type(value, &mut converted),
                "properties" => {
                    let mut properties = Map::new();
                    if let Some(props) = value.as_object() {
                        for (name, schema) in props {
                            properties.insert(name.clone(), self.convert(schema)?);
                        }
                    }
                    converted.insert(key.clone(), Value::Object(properties));
                }
                // `items` may also be a tuple of schemas
                k if SCHEMA_KEYS.contains(&k) => {
                    let schema = match value.as_array() {
                        Some(items) => Value::Array(self.convert_all(items)?),
                        None => self.convert(value)?,
                    };
                    converted.insert(key.clone(), schema);
                }
                k if SCHEMA_LIST_KEYS.contains(&k) => {
                    let items = match value.as_array() {
                        Some(items) => self.convert_all(items)?,
                        None => Vec::new(),
                    };
                    converted.insert(key.clone(), Value::Array(items));
                }
                _ => {
                    converted.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(Value::Object(converted))
    }

    fn convert_all(&mut self, items: &[Value]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.convert(item)).collect()
    }

    /// `type: [T, "null"]` becomes `type: T, nullable: true`
    fn convert_type(&self, value: &Value, out: &mut Map<String, Value>) {
        match value {
            Value::Array(names) => {
                if let Some(first) = names
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|name| *name != "null")
                {
                    out.insert("type".to_string(), Value::String(first.to_string()));
                }
                if TypeMapper::is_nullable(value) {
                    out.insert("nullable".to_string(), Value::Bool(true));
                }
            }
            other => {
                out.insert("type".to_string(), other.clone());
            }
        }
    }

    /// Ensure the component for a concrete pointer exists; returns its name
    ///
    /// The slot is reserved before conversion so a definition that refers
    /// back to itself sees its own name and stops.
    pub fn require(&mut self, pointer: &str) -> Result<String> {
        let name = self.names.for_pointer(pointer);
        if self.components.contains_key(&name) {
            return Ok(name);
        }

        let node = self
            .doc
            .node(pointer)
            .ok_or_else(|| GeneratorError::SchemaResolution {
                pointer: pointer.to_string(),
                reason: "component source does not exist".to_string(),
            })?;

        self.components.insert(name.clone(), Value::Null);
        let converted = self.convert(node)?;
        self.components.insert(name.clone(), converted);

        Ok(name)
    }

    /// Add an inline component under an explicit name
    pub fn insert(&mut self, name: &str, schema: Value) {
        self.components.insert(name.to_string(), schema);
    }

    /// Collected components in first-use order
    pub fn finish(self) -> IndexMap<String, Value> {
        self.components
    }
}
