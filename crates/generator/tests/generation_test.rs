//! Integration tests for provider generation

use hyperschema_stackql_common::{GeneratorConfig, GeneratorError, ServiceDocument, SqlVerb};
use hyperschema_stackql_generator::{HrefTemplate, OutputSink, ProviderGenerator, ProviderOutput};
use hyperschema_stackql_parser::hyperschema::load;
use hyperschema_stackql_parser::{HyperSchemaParser, SchemaDocument};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/heroku_minimal.json")
}

fn fixture() -> SchemaDocument {
    HyperSchemaParser::from_file(fixture_path())
        .unwrap()
        .load()
        .unwrap()
}

fn build(config: GeneratorConfig) -> ProviderOutput {
    ProviderGenerator::new(fixture(), config).build().unwrap()
}

fn service<'a>(output: &'a ProviderOutput, name: &str) -> &'a ServiceDocument {
    output
        .documents
        .iter()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("service {} missing", name))
}

#[test]
fn test_generate_heroku_provider() {
    let output = build(GeneratorConfig::default());

    let names: Vec<&str> = output.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["account-delinquencies", "apps", "formations"]);

    let apps = service(&output, "apps");
    assert_eq!(apps.openapi, "3.0.0");
    assert_eq!(apps.info.title, "Heroku Platform API - Apps");
    assert_eq!(apps.info.version, "v0");
    assert_eq!(apps.servers[0].url, "https://api.heroku.com");
    assert_eq!(apps.operation_count(), 5);

    let ids: Vec<&str> = apps.operations().map(|op| op.operation_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["create-app", "instances-app", "self-app", "update-app", "destroy-app"]
    );

    let verbs: Vec<SqlVerb> = apps
        .operations()
        .map(|op| op.extension.as_ref().unwrap().verb)
        .collect();
    assert_eq!(
        verbs,
        vec![
            SqlVerb::Insert,
            SqlVerb::Select,
            SqlVerb::Select,
            SqlVerb::Update,
            SqlVerb::Delete
        ]
    );
}

#[test]
fn test_app_instances_and_create() {
    let output = build(GeneratorConfig::default());
    let apps = service(&output, "apps");

    let list = &apps.paths["/apps"]["get"];
    let ext = list.extension.as_ref().unwrap();
    assert_eq!(list.operation_id, "instances-app");
    assert_eq!(ext.resource, "app");
    assert_eq!(ext.method, "instances");
    assert_eq!(ext.id, "app.instances");
    assert_eq!(ext.verb, SqlVerb::Select);

    let create = &apps.paths["/apps"]["post"];
    assert_eq!(create.operation_id, "create-app");
    assert_eq!(create.extension.as_ref().unwrap().verb, SqlVerb::Insert);
    let body = create.request_body.as_ref().unwrap();
    assert_eq!(
        body.content["application/json"].schema,
        json!({"$ref": "#/components/schemas/app_create_request"})
    );
}

#[test]
fn test_scale_is_exec() {
    let output = build(GeneratorConfig::default());
    let formations = service(&output, "formations");

    let scale = formations
        .operations()
        .find(|op| op.operation_id == "scale-formation")
        .unwrap();
    assert_eq!(scale.extension.as_ref().unwrap().verb, SqlVerb::Exec);
    assert_eq!(
        scale.path_parameter_names(),
        vec!["app_identity", "formation_identity"]
    );

    let resource = &formations.components.resources["formation"];
    assert_eq!(resource.id, "heroku.formations.formation");
    assert_eq!(resource.sql_verbs.exec.len(), 1);
    assert_eq!(
        resource.sql_verbs.exec[0].reference,
        "#/components/x-stackQL-resources/formation/methods/scale"
    );
    assert_eq!(
        resource.methods["scale"].operation.reference,
        "#/paths/~1apps~1{app_identity}~1formation~1{formation_identity}~1actions~1scale/post"
    );
}

#[test]
fn test_self_referencing_definition_is_finite() {
    let output = build(GeneratorConfig::default());
    let apps = service(&output, "apps");

    let app = &apps.components.schemas["app"];
    assert_eq!(
        app["properties"]["parent"]["anyOf"][0],
        json!({"$ref": "#/components/schemas/app"})
    );
    assert_eq!(app["x-stackQL-primaryIdentifier"], "id");

    // Rendering a cyclic schema must terminate
    let rendered = serde_yaml::to_string(apps).unwrap();
    assert!(rendered.contains("x-stackQL-resources"));
}

#[test]
fn test_operation_count_conservation() {
    let doc = fixture();
    let links: usize = doc.top_level().map(|d| d.links.len()).sum();

    let output = ProviderGenerator::new(doc, GeneratorConfig::default())
        .build()
        .unwrap();
    assert_eq!(output.operation_count(), links);
    assert_eq!(links, 8);
}

#[test]
fn test_services_partition_operations() {
    let output = build(GeneratorConfig {
        families: true,
        ..Default::default()
    });

    let names: Vec<&str> = output.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["account-delinquencies", "apps", "dynos"]);

    let mut seen = HashSet::new();
    for document in &output.documents {
        for op in document.operations() {
            let id = op.extension.as_ref().unwrap().id.clone();
            assert!(seen.insert(id), "operation emitted twice");
            assert_eq!(op.tags, vec![document.name.clone()]);
        }
    }
    assert_eq!(seen.len(), output.operation_count());
}

#[test]
fn test_placeholders_round_trip_to_parameters() {
    let output = build(GeneratorConfig::default());

    for document in &output.documents {
        for (path, item) in &document.paths {
            let placeholders: Vec<String> = HrefTemplate::parse(path)
                .placeholders
                .into_iter()
                .map(|p| p.name)
                .collect();
            for op in item.values() {
                assert_eq!(op.path_parameter_names(), placeholders, "{}", path);
                assert_eq!(op.responses.contains_key("404"), !placeholders.is_empty());
                assert!(op.responses.contains_key("default"));
            }
        }
    }
}

#[test]
fn test_output_is_deterministic() {
    let first = build(GeneratorConfig::default()).render().unwrap();
    let second = build(GeneratorConfig::default()).render().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_duplicate_operation_ids() {
    let doc = load(json!({
        "definitions": {
            "app": {
                "links": [
                    {"href": "/apps", "method": "GET", "rel": "instances"},
                    {"href": "/teams/apps", "method": "GET", "rel": "instances"}
                ]
            }
        }
    }))
    .unwrap();

    let err = ProviderGenerator::new(doc, GeneratorConfig::default())
        .build()
        .unwrap_err();

    match err {
        GeneratorError::DuplicateOperation {
            service,
            operation_id,
            first,
            second,
        } => {
            assert_eq!(service, "apps");
            assert_eq!(operation_id, "instances-app");
            assert_eq!(first.href, "/apps");
            assert_eq!(second.href, "/teams/apps");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_duplicate_operation_ids_across_resources() {
    let doc = load(json!({
        "definitions": {
            "add-on": {"links": [{"href": "/addons", "method": "GET", "rel": "instances"}]},
            "add_on": {"links": [{"href": "/add_ons", "method": "GET", "rel": "instances"}]}
        }
    }))
    .unwrap();
    let mut config = GeneratorConfig::default();
    config
        .service_overrides
        .insert("add_on".to_string(), "add-ons".to_string());

    let err = ProviderGenerator::new(doc, config).build().unwrap_err();
    match err {
        GeneratorError::DuplicateOperation {
            service,
            operation_id,
            first,
            second,
        } => {
            assert_eq!(service, "add-ons");
            assert_eq!(operation_id, "instances-add-on");
            assert_eq!(first.resource, "add-on");
            assert_eq!(second.resource, "add_on");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unresolvable_reference() {
    let err = load(json!({
        "definitions": {
            "app": {
                "properties": {"owner": {"$ref": "#/definitions/account"}},
                "links": [{"href": "/apps", "rel": "instances"}]
            }
        }
    }))
    .unwrap_err();

    assert!(matches!(
        err,
        GeneratorError::SchemaResolution { ref pointer, .. } if pointer == "#/definitions/account"
    ));
}

#[test]
fn test_empty_provider() {
    let doc = load(json!({"definitions": {"region": {"type": ["object"]}}})).unwrap();
    let err = ProviderGenerator::new(doc, GeneratorConfig::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, GeneratorError::EmptyProvider));
}

#[test]
fn test_generate_to_directory() {
    let temp = TempDir::new().unwrap();
    let output = ProviderGenerator::new(fixture(), GeneratorConfig::default())
        .generate_to_directory(temp.path())
        .unwrap();
    assert_eq!(output.documents.len(), 3);

    let root = temp.path().join("heroku").join("v0");
    let manifest = std::fs::read_to_string(root.join("provider.yaml")).unwrap();
    assert!(manifest.contains("name: heroku"));
    assert!(manifest.contains("file: services/apps.yaml"));
    assert!(manifest.contains("credentialsenvvar: HEROKU_API_TOKEN"));

    let apps = std::fs::read_to_string(root.join("services").join("apps.yaml")).unwrap();
    assert!(apps.contains("x-stackQL-verb: SELECT"));
    assert!(apps.contains("operationId: instances-app"));
    assert!(root.join("services").join("formations.yaml").exists());
    assert!(root.join("services").join("account-delinquencies.yaml").exists());
}

/// Records writes in memory
#[derive(Default)]
struct RecordingSink {
    files: RefCell<Vec<PathBuf>>,
}

impl OutputSink for RecordingSink {
    fn write(&self, path: &Path, _contents: &str) -> hyperschema_stackql_common::Result<()> {
        self.files.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn test_manifest_written_first() {
    let sink = RecordingSink::default();
    ProviderGenerator::new(fixture(), GeneratorConfig::default())
        .write_to(&sink)
        .unwrap();

    let files = sink.files.borrow();
    assert_eq!(files.len(), 4);
    assert_eq!(files[0], PathBuf::from("heroku/v0/provider.yaml"));
    assert_eq!(files[2], PathBuf::from("heroku/v0/services/apps.yaml"));
}

#[test]
fn test_config_overrides() {
    let config = GeneratorConfig::from_yaml(
        r#"
provider: herokutest
version: v1
service_overrides:
  formation: dynos
auth: ~
"#,
    )
    .unwrap();

    let output = build(config);
    assert_eq!(output.manifest.name, "herokutest");
    assert!(output.manifest.config.is_none());

    let dynos = service(&output, "dynos");
    assert!(dynos.components.security_schemes.is_empty());
    assert!(dynos.security.is_empty());
    assert_eq!(dynos.components.resources["formation"].id, "herokutest.dynos.formation");
}

#[test]
fn test_flattened_name_clash_keeps_both_schemas() {
    let doc = load(json!({
        "definitions": {
            "app": {
                "type": ["object"],
                "definitions": {
                    "id": {"type": ["string"]},
                    "setup": {"type": ["string"], "description": "nested string"}
                },
                "properties": {
                    "id": {"$ref": "#/definitions/app/definitions/id"},
                    "setup": {"$ref": "#/definitions/app/definitions/setup"}
                },
                "links": [
                    {
                        "href": "/apps",
                        "method": "GET",
                        "rel": "instances",
                        "targetSchema": {"type": ["array"], "items": {"$ref": "#/definitions/app"}}
                    },
                    {
                        "href": "/app-setups",
                        "method": "POST",
                        "rel": "create",
                        "targetSchema": {"$ref": "#/definitions/app-setup"}
                    }
                ]
            },
            "app-setup": {
                "type": ["object"],
                "properties": {
                    "id": {"type": ["string"], "format": "uuid"},
                    "status": {"type": ["string"]}
                }
            }
        }
    }))
    .unwrap();

    let output = ProviderGenerator::new(doc, GeneratorConfig::default())
        .build()
        .unwrap();
    let apps = service(&output, "apps");
    let schemas = &apps.components.schemas;

    let create = &apps.paths["/app-setups"]["post"];
    assert_eq!(
        create.responses["200"].content["application/json"].schema,
        json!({"$ref": "#/components/schemas/app_setup_2"})
    );
    assert_eq!(schemas["app_setup_2"]["type"], "object");
    assert_eq!(schemas["app_setup_2"]["x-stackQL-primaryIdentifier"], "id");

    assert_eq!(
        schemas["app_setup"],
        json!({"type": "string", "description": "nested string"})
    );
    assert_eq!(
        schemas["app"]["properties"]["setup"],
        json!({"$ref": "#/components/schemas/app_setup"})
    );
}

#[test]
fn test_components_equal_after_merging_are_emitted_once() {
    let resource = |key: &str| {
        json!({
            "type": ["object"],
            "definitions": {"name": {"type": ["string"]}},
            "properties": {"name": {"$ref": format!("#/definitions/{}/definitions/name", key)}},
            "links": [{"href": format!("/{}s", key), "method": "GET", "rel": "instances"}]
        })
    };
    let doc = load(json!({
        "definitions": {"left": resource("left"), "right": resource("right")}
    }))
    .unwrap();
    let mut config = GeneratorConfig::default();
    config
        .service_overrides
        .insert("right".to_string(), "lefts".to_string());

    let output = ProviderGenerator::new(doc, config).build().unwrap();
    let lefts = service(&output, "lefts");

    let names: Vec<&str> = lefts.components.schemas.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["left", "left_name", "error"]);

    let right = &lefts.paths["/rights"]["get"];
    assert_eq!(
        right.responses["200"].content["application/json"].schema,
        json!({"$ref": "#/components/schemas/left"})
    );
}
