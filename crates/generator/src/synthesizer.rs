//! Operation synthesis: one OpenAPI operation per Hyper-Schema link

use crate::components::{
    component_ref, error_schema, referenced_component, ComponentCollector, ComponentNames,
    ERROR_COMPONENT,
};
use crate::href::{HrefTemplate, PlaceholderSource};
use hyperschema_stackql_common::{
    GeneratorConfig, GeneratorError, LinkSource, MediaType, OperationContext, OperationIdStyle,
    OperationSpec, Parameter, ParameterLocation, ParameterSchema, PrimitiveType, RequestBody,
    Response, Result,
};
use hyperschema_stackql_parser::hyperschema::ref_of;
use hyperschema_stackql_parser::{
    sanitize_name, slugify, Definition, LinkDescriptor, ResourceUnit, SchemaDocument, TypeMapper,
    VerbMapper,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Build the operations of one resource, in link order
///
/// `names` is shared by every resource of a provider.
pub fn synthesize(
    doc: &SchemaDocument,
    unit: &ResourceUnit,
    config: &GeneratorConfig,
    names: &mut ComponentNames,
) -> Result<Vec<OperationSpec>> {
    let definition = doc
        .definition(&unit.pointer)
        .ok_or_else(|| GeneratorError::SchemaResolution {
            pointer: unit.pointer.clone(),
            reason: "resource definition is not in the document".to_string(),
        })?;

    let mut seen: IndexMap<String, LinkSource> = IndexMap::new();
    let mut specs = Vec::with_capacity(unit.links.len());

    for (index, link) in unit.links.iter().enumerate() {
        let spec = synthesize_link(doc, unit, definition, link, index, config, names)?;

        if let Some(first) = seen.get(&spec.operation_id) {
            return Err(GeneratorError::DuplicateOperation {
                service: unit.service.clone(),
                operation_id: spec.operation_id.clone(),
                first: first.clone(),
                second: spec.context.link.clone(),
            });
        }
        seen.insert(spec.operation_id.clone(), spec.context.link.clone());

        debug!(
            resource = %unit.key,
            operation_id = %spec.operation_id,
            path = %spec.context.path,
            method = %spec.context.http_method,
            "Synthesized operation"
        );
        specs.push(spec);
    }

    Ok(specs)
}

/// Name used for `x-stackQL-method` and as the operationId prefix
pub fn method_name(link: &LinkDescriptor, index: usize, style: OperationIdStyle) -> String {
    let rel = link.rel.trim();
    let title = link.title.as_deref().map(slugify).unwrap_or_default();

    let preferred = match style {
        OperationIdStyle::Rel => [rel.to_string(), title],
        OperationIdStyle::Title => [title, rel.to_string()],
    };

    preferred
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| format!("link{}", index))
}

fn synthesize_link(
    doc: &SchemaDocument,
    unit: &ResourceUnit,
    definition: &Definition,
    link: &LinkDescriptor,
    index: usize,
    config: &GeneratorConfig,
    names: &mut ComponentNames,
) -> Result<OperationSpec> {
    let href = HrefTemplate::parse(&link.href);
    let method = method_name(link, index, config.operation_id_style);
    let operation_id = slugify(&format!("{}-{}", method, unit.key));
    let source = LinkSource {
        resource: unit.key.clone(),
        rel: link.rel.clone(),
        method: link.method.clone(),
        href: link.href.clone(),
    };

    let mut parameters = path_parameters(doc, definition, &href)?;
    let mut collector = ComponentCollector::new(doc, names);

    let mut request_body = None;
    if let Some(schema) = &link.schema {
        if VerbMapper::has_body(&link.method) {
            let body_schema = if ref_of(schema).is_some() {
                collector.convert(schema)?
            } else {
                let name = collector.name_inline(
                    &format!("{}/links/{}/schema", unit.pointer, index),
                    &sanitize_name(&format!("{}_{}_request", unit.key, method)),
                );
                let converted = collector.convert(schema)?;
                collector.insert(&name, converted);
                component_ref(&name)
            };
            request_body = Some(RequestBody {
                required: true,
                content: json_content(body_schema),
            });
        } else if link.method.trim().eq_ignore_ascii_case("GET") {
            let query = query_parameters(doc, schema, &parameters)?;
            parameters.extend(query);
        }
    }

    let target = match &link.target_schema {
        Some(target) => target.clone(),
        None => json!({ "$ref": unit.pointer }),
    };
    let response_schema = collector.convert(&target)?;
    let response_components = response_component_names(&response_schema);

    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: "Successful operation".to_string(),
            content: json_content(response_schema),
        },
    );
    if !href.placeholders.is_empty() {
        responses.insert(
            "404".to_string(),
            Response {
                description: "Not found".to_string(),
                content: IndexMap::new(),
            },
        );
    }
    collector.insert(ERROR_COMPONENT, error_schema());
    responses.insert(
        "default".to_string(),
        Response {
            description: "Error response".to_string(),
            content: json_content(component_ref(ERROR_COMPONENT)),
        },
    );

    Ok(OperationSpec {
        summary: link.title.clone(),
        description: link.description.clone(),
        operation_id,
        tags: vec![unit.service.clone()],
        parameters,
        request_body,
        responses,
        extension: None,
        context: OperationContext {
            path: href.path,
            http_method: link.method.trim().to_lowercase(),
            resource: unit.key.clone(),
            service: unit.service.clone(),
            method_name: method,
            link: source,
            order: (unit.index, index),
            components: collector.finish(),
            response_components,
        },
    })
}

fn path_parameters(
    doc: &SchemaDocument,
    definition: &Definition,
    href: &HrefTemplate,
) -> Result<Vec<Parameter>> {
    href.placeholders
        .iter()
        .map(|placeholder| {
            let node = match &placeholder.source {
                PlaceholderSource::Property(name) => definition.properties.get(name),
                PlaceholderSource::Pointer(pointer) => {
                    let resolved = doc.resolve_ref(pointer)?;
                    Some(doc.node(&resolved).ok_or_else(|| {
                        GeneratorError::SchemaResolution {
                            pointer: pointer.clone(),
                            reason: "path placeholder does not resolve to a schema".to_string(),
                        }
                    })?)
                }
            };

            let schema_type = node
                .and_then(|n| TypeMapper::primitive_of(doc, n))
                .unwrap_or(PrimitiveType::String);

            Ok(Parameter {
                name: placeholder.name.clone(),
                location: ParameterLocation::Path,
                required: true,
                description: node.and_then(|n| describe(doc, n)),
                schema: ParameterSchema { schema_type },
            })
        })
        .collect()
}

/// Top-level properties of a GET link's `schema` become query parameters
fn query_parameters(
    doc: &SchemaDocument,
    schema: &Value,
    existing: &[Parameter],
) -> Result<Vec<Parameter>> {
    let schema = doc.resolve_node(schema)?;
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    Ok(properties
        .iter()
        .filter(|(name, _)| !existing.iter().any(|p| &p.name == *name))
        .map(|(name, property)| Parameter {
            name: name.clone(),
            location: ParameterLocation::Query,
            required: required.contains(&name.as_str()),
            description: describe(doc, property),
            schema: ParameterSchema {
                schema_type: TypeMapper::primitive_of(doc, property)
                    .unwrap_or(PrimitiveType::String),
            },
        })
        .collect())
}

/// Description of a node, looking through references and union branches
fn describe(doc: &SchemaDocument, node: &Value) -> Option<String> {
    let mut current = node;
    for _ in 0..8 {
        if let Some(description) = current.get("description").and_then(Value::as_str) {
            return Some(description.to_string());
        }
        current = if ref_of(current).is_some() {
            doc.resolve_node(current).ok()?
        } else {
            ["anyOf", "oneOf"]
                .iter()
                .find_map(|key| current.get(*key).and_then(Value::as_array)?.first())?
        };
    }
    None
}

/// Components rows are read from: the body itself or the items of a list
fn response_component_names(schema: &Value) -> Vec<String> {
    referenced_component(schema)
        .or_else(|| schema.get("items").and_then(referenced_component))
        .map(|name| vec![name.to_string()])
        .unwrap_or_default()
}

fn json_content(schema: Value) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}
