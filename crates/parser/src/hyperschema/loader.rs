//! Builds the definition arena and resolves every reference up front

use super::types::{escape_token, follow_ref, Definition, LinkDescriptor, SchemaDocument};
use hyperschema_stackql_common::{GeneratorError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Load a parsed Hyper-Schema document
///
/// Every `$ref` in the document is resolved before this returns. A reference
/// is resolved once and memoized by its pointer, so recursive schemas
/// (`app.owner` pointing back at `app`) are fine.
pub fn load(root: Value) -> Result<SchemaDocument> {
    let top = root
        .get("definitions")
        .and_then(Value::as_object)
        .ok_or_else(|| GeneratorError::SchemaResolution {
            pointer: "#/definitions".to_string(),
            reason: "document has no definitions object".to_string(),
        })?;

    let mut definitions = IndexMap::new();
    let mut top_level = Vec::with_capacity(top.len());

    for (key, node) in top {
        let pointer = format!("#/definitions/{}", escape_token(key));
        top_level.push(pointer.clone());
        collect_definition(key, &pointer, node, &mut definitions)?;
    }

    let mut resolved_refs = HashMap::new();
    resolve_all(&root, &root, "#", &mut resolved_refs)?;

    debug!(
        definitions = definitions.len(),
        references = resolved_refs.len(),
        "Loaded hyper-schema"
    );

    Ok(SchemaDocument {
        root,
        definitions,
        top_level,
        resolved_refs,
    })
}

/// Add a definition and its nested definitions to the arena
fn collect_definition(
    key: &str,
    pointer: &str,
    node: &Value,
    arena: &mut IndexMap<String, Definition>,
) -> Result<()> {
    let object = node
        .as_object()
        .ok_or_else(|| GeneratorError::SchemaResolution {
            pointer: pointer.to_string(),
            reason: "definition is not an object".to_string(),
        })?;

    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), schema.clone()))
                .collect()
        })
        .unwrap_or_default();

    let links = parse_links(pointer, object)?;

    let mut nested = IndexMap::new();
    if let Some(children) = object.get("definitions").and_then(Value::as_object) {
        for (child_key, child) in children {
            let child_pointer = format!("{}/definitions/{}", pointer, escape_token(child_key));
            nested.insert(child_key.clone(), child_pointer.clone());
            // Nested entries may be bare aliases or booleans; only objects are arena nodes.
            if child.is_object() {
                collect_definition(child_key, &child_pointer, child, arena)?;
            }
        }
    }

    arena.insert(
        pointer.to_string(),
        Definition {
            key: key.to_string(),
            pointer: pointer.to_string(),
            description: object
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            properties,
            links,
            definitions: nested,
            schema: node.clone(),
        },
    );

    Ok(())
}

fn parse_links(pointer: &str, object: &Map<String, Value>) -> Result<Vec<LinkDescriptor>> {
    let Some(raw) = object.get("links") else {
        return Ok(Vec::new());
    };

    let items = raw
        .as_array()
        .ok_or_else(|| GeneratorError::SchemaResolution {
            pointer: format!("{}/links", pointer),
            reason: "links must be an array".to_string(),
        })?;

    items
        .iter()
        .enumerate()
        .map(|(i, link)| {
            serde_json::from_value(link.clone()).map_err(|e| GeneratorError::SchemaResolution {
                pointer: format!("{}/links/{}", pointer, i),
                reason: format!("malformed link: {}", e),
            })
        })
        .collect()
}

/// Resolve every `$ref` below `node`, recording the concrete target pointer
fn resolve_all(
    root: &Value,
    node: &Value,
    location: &str,
    resolved: &mut HashMap<String, String>,
) -> Result<()> {
    match node {
        Value::Object(object) => {
            if let Some(reference) = object.get("$ref") {
                let reference = reference
                    .as_str()
                    .ok_or_else(|| GeneratorError::SchemaResolution {
                        pointer: location.to_string(),
                        reason: "$ref must be a string".to_string(),
                    })?;

                if !resolved.contains_key(reference) {
                    let target = follow_ref(root, reference).map_err(|e| match e {
                        GeneratorError::SchemaResolution { pointer, reason } => {
                            GeneratorError::SchemaResolution {
                                pointer,
                                reason: format!("{} (referenced from {})", reason, location),
                            }
                        }
                        other => other,
                    })?;
                    resolved.insert(reference.to_string(), target);
                }
            }

            for (key, child) in object {
                let child_location = format!("{}/{}", location, escape_token(key));
                resolve_all(root, child, &child_location, resolved)?;
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                resolve_all(root, child, &format!("{}/{}", location, i), resolved)?;
            }
        }
        _ => {}
    }

    Ok(())
}
