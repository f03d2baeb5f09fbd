//! Grouping of annotated operations into per-service OpenAPI documents

use crate::components::{PRIMARY_IDENTIFIER_EXTENSION, SCHEMA_REF_PREFIX};
use hyperschema_stackql_common::{
    Components, GeneratorConfig, GeneratorError, Info, LinkSource, MethodResponse, OperationSpec,
    RefObject, ResourceMethod, Result, SecurityScheme, Server, ServiceDocument, SqlVerbRefs,
    StackqlResource,
};
use hyperschema_stackql_parser::hyperschema::escape_token;
use hyperschema_stackql_parser::{title_case, ResourceUnit};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

const OPENAPI_VERSION: &str = "3.0.0";

/// Group operations by service
///
/// Services come out sorted by name; operations keep extraction order.
pub fn group(
    units: &[ResourceUnit],
    specs: Vec<OperationSpec>,
    config: &GeneratorConfig,
) -> Result<Vec<ServiceDocument>> {
    let services_by_resource: HashMap<&str, &str> = units
        .iter()
        .map(|unit| (unit.key.as_str(), unit.service.as_str()))
        .collect();

    let mut by_service: BTreeMap<String, Vec<OperationSpec>> = BTreeMap::new();
    for spec in specs {
        if spec.extension.is_none() {
            return Err(GeneratorError::Annotation {
                resource: spec.context.resource.clone(),
                rel: spec.context.link.rel.clone(),
                method: spec.context.link.method.clone(),
            });
        }

        let service = services_by_resource
            .get(spec.context.resource.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| spec.context.service.clone());
        by_service.entry(service).or_default().push(spec);
    }

    let mut documents = Vec::with_capacity(by_service.len());
    for (service, mut specs) in by_service {
        specs.sort_by_key(|spec| spec.context.order);
        let document = build_document(&service, specs, config)?;
        debug!(
            service = %document.name,
            operations = document.operation_count(),
            schemas = document.components.schemas.len(),
            "Built service document"
        );
        documents.push(document);
    }

    info!(services = documents.len(), "Grouped operations into services");
    Ok(documents)
}

fn build_document(
    service: &str,
    mut specs: Vec<OperationSpec>,
    config: &GeneratorConfig,
) -> Result<ServiceDocument> {
    let mut operation_ids: IndexMap<String, LinkSource> = IndexMap::new();
    for spec in &specs {
        if let Some(first) = operation_ids.get(&spec.operation_id) {
            return Err(GeneratorError::DuplicateOperation {
                service: service.to_string(),
                operation_id: spec.operation_id.clone(),
                first: first.clone(),
                second: spec.context.link.clone(),
            });
        }
        operation_ids.insert(spec.operation_id.clone(), spec.context.link.clone());
    }

    let merged = merge_components(&specs);
    let (schemas, aliases) = dedup_components(merged);

    for spec in &mut specs {
        if let Some(body) = spec.request_body.as_mut() {
            for media in body.content.values_mut() {
                rewrite_refs(&mut media.schema, &aliases);
            }
        }
        for response in spec.responses.values_mut() {
            for media in response.content.values_mut() {
                rewrite_refs(&mut media.schema, &aliases);
            }
        }
    }

    let resources = stackql_resources(service, &specs, config);

    let mut paths: IndexMap<String, IndexMap<String, OperationSpec>> = IndexMap::new();
    for spec in specs {
        let item = paths.entry(spec.context.path.clone()).or_default();
        if let Some(existing) = item.get(&spec.context.http_method) {
            return Err(GeneratorError::Generation(format!(
                "{} {} in service '{}' is declared by both {} and {}",
                spec.context.http_method.to_uppercase(),
                spec.context.path,
                service,
                existing.context.link,
                spec.context.link
            )));
        }
        item.insert(spec.context.http_method.clone(), spec);
    }

    let mut security_schemes = IndexMap::new();
    let mut security = Vec::new();
    if let Some(auth) = &config.auth {
        let scheme = auth.auth_type.to_lowercase();
        let bearer_format = (scheme == "bearer").then(|| "API Key".to_string());
        let name = config.security_scheme_name();
        security_schemes.insert(
            name.clone(),
            SecurityScheme {
                scheme_type: "http".to_string(),
                scheme,
                bearer_format,
            },
        );
        let mut requirement = IndexMap::new();
        requirement.insert(name, Vec::new());
        security.push(requirement);
    }

    Ok(ServiceDocument {
        name: service.to_string(),
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: format!("{} - {}", config.title, title_case(service)),
            description: None,
            version: config.version.clone(),
        },
        servers: vec![Server {
            url: config.server_url.clone(),
        }],
        paths,
        components: Components {
            schemas,
            security_schemes,
            resources,
        },
        security,
    })
}

/// Union the component fragments of every operation, by name
fn merge_components(specs: &[OperationSpec]) -> IndexMap<String, Value> {
    let mut merged: IndexMap<String, Value> = IndexMap::new();
    for spec in specs {
        for (name, schema) in &spec.context.components {
            match merged.get_mut(name) {
                Some(existing) => {
                    let annotation = schema.get(PRIMARY_IDENTIFIER_EXTENSION).cloned();
                    if let (Some(annotation), Value::Object(object)) = (annotation, existing) {
                        object
                            .entry(PRIMARY_IDENTIFIER_EXTENSION.to_string())
                            .or_insert(annotation);
                    }
                }
                None => {
                    merged.insert(name.clone(), schema.clone());
                }
            }
        }
    }
    merged
}

/// Drop components that are structurally equal to an earlier one
///
/// Merging two components can make the schemas that reference them equal,
/// so passes repeat until one merges nothing. Returns the surviving schemas
/// and a map from every dropped name to its final survivor.
fn dedup_components(
    mut schemas: IndexMap<String, Value>,
) -> (IndexMap<String, Value>, HashMap<String, String>) {
    let mut aliases: HashMap<String, String> = HashMap::new();

    loop {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut merged: HashMap<String, String> = HashMap::new();
        let mut kept: IndexMap<String, Value> = IndexMap::new();

        for (name, schema) in schemas {
            let key = canonical(&schema).to_string();
            match seen.get(&key) {
                Some(survivor) => {
                    debug!(component = %name, survivor = %survivor, "Deduplicated component");
                    merged.insert(name, survivor.clone());
                }
                None => {
                    seen.insert(key, name.clone());
                    kept.insert(name, schema);
                }
            }
        }

        if merged.is_empty() {
            return (kept, aliases);
        }

        for schema in kept.values_mut() {
            rewrite_refs(schema, &merged);
        }
        for survivor in aliases.values_mut() {
            if let Some(next) = merged.get(survivor.as_str()) {
                *survivor = next.clone();
            }
        }
        aliases.extend(merged);
        schemas = kept;
    }
}

/// Copy of a value with object keys sorted at every level
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut entries: Vec<(&String, &Value)> = object.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key.clone(), canonical(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Point references at surviving component names
fn rewrite_refs(value: &mut Value, aliases: &HashMap<String, String>) {
    if aliases.is_empty() {
        return;
    }

    match value {
        Value::Object(object) => {
            for (key, child) in object.iter_mut() {
                if key == "$ref" {
                    let target = child
                        .as_str()
                        .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
                        .and_then(|name| aliases.get(name));
                    if let Some(survivor) = target {
                        *child = Value::String(format!("{}{}", SCHEMA_REF_PREFIX, survivor));
                    }
                } else {
                    rewrite_refs(child, aliases);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, aliases);
            }
        }
        _ => {}
    }
}

/// Build the `x-stackQL-resources` block from annotated operations
fn stackql_resources(
    service: &str,
    specs: &[OperationSpec],
    config: &GeneratorConfig,
) -> IndexMap<String, StackqlResource> {
    let mut resources: IndexMap<String, StackqlResource> = IndexMap::new();

    for spec in specs {
        let Some(extension) = &spec.extension else {
            continue;
        };

        let resource = resources
            .entry(extension.resource.clone())
            .or_insert_with(|| StackqlResource {
                id: format!("{}.{}.{}", config.provider, service, extension.resource),
                name: extension.resource.clone(),
                title: title_case(&extension.resource),
                methods: IndexMap::new(),
                sql_verbs: SqlVerbRefs::default(),
            });

        resource.methods.insert(
            extension.method.clone(),
            ResourceMethod {
                operation: RefObject::new(format!(
                    "#/paths/{}/{}",
                    escape_token(&spec.context.path),
                    spec.context.http_method
                )),
                response: MethodResponse {
                    media_type: "application/json".to_string(),
                    open_api_doc_key: "200".to_string(),
                },
            },
        );
        resource.sql_verbs.push(
            extension.verb,
            RefObject::new(format!(
                "#/components/x-stackQL-resources/{}/methods/{}",
                escape_token(&extension.resource),
                escape_token(&extension.method)
            )),
        );
    }

    resources
}
