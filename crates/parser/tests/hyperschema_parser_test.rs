//! Integration test for the Hyper-Schema parser

use hyperschema_stackql_common::GeneratorError;
use hyperschema_stackql_parser::{extract, parse_schema_file, HyperSchemaParser, ServiceNamer};
use std::io::Write;

const HEROKU_STYLE_SCHEMA: &str = r##"{
    "$schema": "http://interagent.github.io/interagent-hyper-schema",
    "type": ["object"],
    "title": "Heroku Platform API",
    "description": "The platform API empowers developers to automate, extend and combine Heroku with other services.",
    "definitions": {
        "add-on": {
            "description": "Add-ons represent add-ons that have been provisioned and attached to one or more apps.",
            "type": ["object"],
            "definitions": {
                "id": {"type": ["string"], "format": "uuid"},
                "name": {"type": ["string"]},
                "identity": {
                    "anyOf": [
                        {"$ref": "#/definitions/add-on/definitions/id"},
                        {"$ref": "#/definitions/add-on/definitions/name"}
                    ]
                }
            },
            "links": [
                {
                    "href": "/addons/{(%23%2Fdefinitions%2Fadd-on%2Fdefinitions%2Fidentity)}",
                    "method": "GET",
                    "rel": "self",
                    "title": "Info"
                }
            ],
            "properties": {
                "id": {"$ref": "#/definitions/add-on/definitions/id"},
                "app": {"$ref": "#/definitions/app"}
            }
        },
        "app": {
            "type": ["object"],
            "definitions": {
                "id": {"type": ["string"], "format": "uuid"},
                "alias": {"$ref": "#/definitions/app/definitions/id"}
            },
            "links": [
                {"href": "/apps", "method": "GET", "rel": "instances", "title": "List"},
                {"href": "/apps", "method": "POST", "rel": "create", "title": "Create"}
            ],
            "properties": {
                "id": {"$ref": "#/definitions/app/definitions/alias"},
                "owner": {"$ref": "#/definitions/app"}
            }
        },
        "region": {
            "type": ["object"],
            "properties": {"name": {"type": ["string"]}}
        },
        "user-preferences": {
            "type": ["object"],
            "links": [
                {"href": "/users/~/preferences", "method": "GET", "rel": "self"}
            ]
        }
    }
}"##;

#[test]
fn test_parse_heroku_style_schema() {
    let doc = HyperSchemaParser::from_json(HEROKU_STYLE_SCHEMA)
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(doc.title(), Some("Heroku Platform API"));
    assert!(doc.description().unwrap().starts_with("The platform API"));

    let keys: Vec<&str> = doc.top_level().map(|d| d.key.as_str()).collect();
    assert_eq!(keys, vec!["add-on", "app", "region", "user-preferences"]);

    let addon = doc.resource("add-on").unwrap();
    assert_eq!(addon.links.len(), 1);
    assert_eq!(addon.links[0].rel, "self");
    assert_eq!(addon.definitions.len(), 3);
    assert!(doc.definition("#/definitions/add-on/definitions/identity").is_some());
}

#[test]
fn test_alias_references_resolve_to_concrete_nodes() {
    let doc = HyperSchemaParser::from_json(HEROKU_STYLE_SCHEMA)
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(
        doc.resolve_ref("#/definitions/app/definitions/alias").unwrap(),
        "#/definitions/app/definitions/id"
    );
    assert_eq!(doc.resolve_ref("#/definitions/app").unwrap(), "#/definitions/app");
}

#[test]
fn test_extract_resources_in_source_order() {
    let doc = HyperSchemaParser::from_json(HEROKU_STYLE_SCHEMA)
        .unwrap()
        .load()
        .unwrap();
    let units = extract(&doc, &ServiceNamer::new());

    let services: Vec<(&str, &str)> = units
        .iter()
        .map(|u| (u.key.as_str(), u.service.as_str()))
        .collect();
    assert_eq!(
        services,
        vec![
            ("add-on", "add-ons"),
            ("app", "apps"),
            ("user-preferences", "user-preferences")
        ]
    );
    assert_eq!(units[1].links.len(), 2);
    assert_eq!(units[2].index, 2);
}

#[test]
fn test_families_preset() {
    let doc = HyperSchemaParser::from_json(HEROKU_STYLE_SCHEMA)
        .unwrap()
        .load()
        .unwrap();
    let units = extract(&doc, &ServiceNamer::new().with_families());

    assert_eq!(units[0].service, "addons");
    assert_eq!(units[1].service, "apps");
}

#[test]
fn test_parse_schema_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(HEROKU_STYLE_SCHEMA.as_bytes()).unwrap();

    let (doc, units) = parse_schema_file(file.path(), &ServiceNamer::new()).unwrap();
    assert_eq!(doc.top_level().count(), 4);
    assert_eq!(units.len(), 3);
}

#[test]
fn test_dangling_reference_is_reported() {
    let schema = r##"{
        "definitions": {
            "app": {
                "properties": {"stack": {"$ref": "#/definitions/stack/definitions/id"}},
                "links": [{"href": "/apps", "rel": "instances"}]
            }
        }
    }"##;

    let err = HyperSchemaParser::from_json(schema).unwrap().load().unwrap_err();
    match err {
        GeneratorError::SchemaResolution { pointer, reason } => {
            assert_eq!(pointer, "#/definitions/stack/definitions/id");
            assert!(reason.contains("#/definitions/app/properties/stack"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_invalid_json() {
    let result = HyperSchemaParser::from_json("{not json");
    assert!(result.is_err());
}
