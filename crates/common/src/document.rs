//! Emitted documents: per-service OpenAPI specs and the provider manifest

use crate::{OperationSpec, SqlVerb};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAPI 3.0 document for one service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDocument {
    /// Service name, also the output file stem
    #[serde(skip)]
    pub name: String,

    pub openapi: String,

    pub info: Info,

    pub servers: Vec<Server>,

    /// path template -> lowercase HTTP method -> operation
    pub paths: IndexMap<String, IndexMap<String, OperationSpec>>,

    pub components: Components,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

impl ServiceDocument {
    /// Iterate operations in document order
    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.paths.values().flat_map(|item| item.values())
    }

    /// Number of operations in this document
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(IndexMap::len).sum()
    }
}

/// API metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,
}

/// Server information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

/// Reusable components of a service document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Components {
    pub schemas: IndexMap<String, Value>,

    #[serde(rename = "securitySchemes", skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,

    #[serde(rename = "x-stackQL-resources")]
    pub resources: IndexMap<String, StackqlResource>,
}

/// HTTP security scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,

    pub scheme: String,

    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
}

/// `{"$ref": ...}` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefObject {
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl RefObject {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Resource entry of the `x-stackQL-resources` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackqlResource {
    pub id: String,
    pub name: String,
    pub title: String,
    pub methods: IndexMap<String, ResourceMethod>,

    #[serde(rename = "sqlVerbs")]
    pub sql_verbs: SqlVerbRefs,
}

/// Method entry pointing back at its operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMethod {
    pub operation: RefObject,
    pub response: MethodResponse,
}

/// Which response the query engine reads rows from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResponse {
    #[serde(rename = "mediaType")]
    pub media_type: String,

    #[serde(rename = "openAPIDocKey")]
    pub open_api_doc_key: String,
}

/// Method references bucketed by SQL verb
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlVerbRefs {
    pub select: Vec<RefObject>,
    pub insert: Vec<RefObject>,
    pub update: Vec<RefObject>,
    pub delete: Vec<RefObject>,
    pub exec: Vec<RefObject>,
}

impl SqlVerbRefs {
    pub fn push(&mut self, verb: SqlVerb, reference: RefObject) {
        match verb {
            SqlVerb::Select => self.select.push(reference),
            SqlVerb::Insert => self.insert.push(reference),
            SqlVerb::Update => self.update.push(reference),
            SqlVerb::Delete => self.delete.push(reference),
            SqlVerb::Exec => self.exec.push(reference),
        }
    }

    pub fn get(&self, verb: SqlVerb) -> &[RefObject] {
        match verb {
            SqlVerb::Select => &self.select,
            SqlVerb::Insert => &self.insert,
            SqlVerb::Update => &self.update,
            SqlVerb::Delete => &self.delete,
            SqlVerb::Exec => &self.exec,
        }
    }
}

/// Top-level provider index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderManifest {
    pub name: String,
    pub version: String,
    pub services: Vec<ManifestService>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ProviderConfigBlock>,
}

/// One service listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestService {
    pub name: String,

    /// Document path relative to the manifest
    pub file: String,
}

/// Provider-level configuration read by the query engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfigBlock {
    pub auth: crate::AuthConfig,
}
