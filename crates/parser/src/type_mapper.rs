//! Type mapping from Hyper-Schema nodes to parameter primitives
//!
//! Heroku schemas describe scalars as `{"type": ["string"]}`, nullable ones as
//! `{"type": ["string", "null"]}`, and identities as an `anyOf` over several
//! references. Only the first non-null primitive matters for a path parameter.

use crate::hyperschema::{ref_of, SchemaDocument};
use hyperschema_stackql_common::PrimitiveType;
use serde_json::Value;

/// Maximum number of `$ref`/`anyOf` hops followed for one node
const MAX_DEPTH: usize = 16;

/// Maps schema nodes to `PrimitiveType`
pub struct TypeMapper;

impl TypeMapper {
    /// Primitive type of a schema node, following references and unions
    ///
    /// Returns `None` for objects, arrays, unresolvable references and nodes
    /// without a type.
    pub fn primitive_of(doc: &SchemaDocument, node: &Value) -> Option<PrimitiveType> {
        Self::primitive_at_depth(doc, node, 0)
    }

    fn primitive_at_depth(doc: &SchemaDocument, node: &Value, depth: usize) -> Option<PrimitiveType> {
        if depth > MAX_DEPTH {
            return None;
        }

        if ref_of(node).is_some() {
            let target = doc.resolve_node(node).ok()?;
            return Self::primitive_at_depth(doc, target, depth + 1);
        }

        if let Some(primitive) = node.get("type").and_then(Self::map_type_value) {
            return Some(primitive);
        }

        for union in ["anyOf", "oneOf"] {
            if let Some(first) = node.get(union).and_then(Value::as_array).and_then(|v| v.first()) {
                return Self::primitive_at_depth(doc, first, depth + 1);
            }
        }

        None
    }

    /// Map a `type` value (string or array of strings) to a primitive
    ///
    /// # Examples
    /// ```
    /// use hyperschema_stackql_parser::TypeMapper;
    /// use hyperschema_stackql_common::PrimitiveType;
    /// use serde_json::json;
    ///
    /// assert_eq!(TypeMapper::map_type_value(&json!("integer")), Some(PrimitiveType::Integer));
    /// assert_eq!(TypeMapper::map_type_value(&json!(["null", "boolean"])), Some(PrimitiveType::Boolean));
    /// assert_eq!(TypeMapper::map_type_value(&json!(["object"])), None);
    /// ```
    pub fn map_type_value(value: &Value) -> Option<PrimitiveType> {
        match value {
            Value::String(name) => PrimitiveType::from_schema_type(name),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")
                .and_then(PrimitiveType::from_schema_type),
            _ => None,
        }
    }

    /// Whether a `type` value admits null (`["string", "null"]`)
    pub fn is_nullable(value: &Value) -> bool {
        match value {
            Value::Array(names) => names.iter().any(|n| n.as_str() == Some("null")),
            Value::String(name) => name == "null",
            _ => false,
        }
    }
}
