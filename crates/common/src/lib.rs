//! Common types and utilities for the Hyper-Schema StackQL generator
//!
//! This crate contains the intermediate representation shared by the parser,
//! the generator and the CLI: synthesized operations, their StackQL extension
//! block, the emitted service documents and provider manifest, plus the error
//! taxonomy and generator configuration.

pub mod config;
pub mod document;

pub use config::{AuthConfig, GeneratorConfig, OperationIdStyle};
pub use document::{
    Components, Info, ManifestService, MethodResponse, ProviderConfigBlock, ProviderManifest,
    RefObject, ResourceMethod, SecurityScheme, Server, ServiceDocument, SqlVerbRefs,
    StackqlResource,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during provider generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A `$ref` or pointer that does not land on a concrete schema node
    #[error("Schema resolution error at {pointer}: {reason}")]
    SchemaResolution { pointer: String, reason: String },

    /// Two links map to the same operationId within one service
    #[error("Duplicate operationId '{operation_id}' in service '{service}': {first} conflicts with {second}")]
    DuplicateOperation {
        service: String,
        operation_id: String,
        first: LinkSource,
        second: LinkSource,
    },

    /// A link could not be mapped to a SQL verb
    #[error("Cannot map link rel '{rel}' with method '{method}' of resource '{resource}' to a SQL verb")]
    Annotation {
        resource: String,
        rel: String,
        method: String,
    },

    /// No resources were extracted, so there is nothing to publish
    #[error("Provider has no services: no resource with links was found")]
    EmptyProvider,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Identifies the schema link an operation was synthesized from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSource {
    pub resource: String,
    pub rel: String,
    pub method: String,
    pub href: String,
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} link rel={} ({} {})",
            self.resource,
            self.rel,
            self.method.to_uppercase(),
            self.href
        )
    }
}

/// SQL verb used by the query engine to route a statement to an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlVerb {
    Select,
    Insert,
    Update,
    Delete,
    Exec,
}

impl SqlVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlVerb::Select => "SELECT",
            SqlVerb::Insert => "INSERT",
            SqlVerb::Update => "UPDATE",
            SqlVerb::Delete => "DELETE",
            SqlVerb::Exec => "EXEC",
        }
    }
}

impl fmt::Display for SqlVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific annotation attached to every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionBlock {
    #[serde(rename = "x-stackQL-resource")]
    pub resource: String,

    #[serde(rename = "x-stackQL-method")]
    pub method: String,

    #[serde(rename = "x-stackQL-verb")]
    pub verb: SqlVerb,

    #[serde(rename = "x-stackQL-id")]
    pub id: String,
}

/// Primitive schema types allowed for path parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveType {
    /// Map a JSON Schema type name to a primitive, if it is one
    pub fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveType::String),
            "integer" => Some(PrimitiveType::Integer),
            "number" => Some(PrimitiveType::Number),
            "boolean" => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

/// Schema of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub schema_type: PrimitiveType,
}

/// Operation parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub schema: ParameterSchema,
}

/// Media type entry of a request body or response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Value,
}

/// Request body of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

/// Response of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Where an operation lives and what it needs, kept out of the emitted YAML
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContext {
    /// OpenAPI path template (e.g. "/apps/{app_identity}")
    pub path: String,

    /// Lowercase HTTP method used as the path-item key
    pub http_method: String,

    /// Definition key of the owning resource
    pub resource: String,

    /// Service the owning resource is grouped into
    pub service: String,

    /// Name used for `x-stackQL-method` (rel, or title slug)
    pub method_name: String,

    /// Link this operation was synthesized from
    pub link: LinkSource,

    /// (resource index, link index) in declaration order
    pub order: (usize, usize),

    /// Component schemas this operation references, transitively
    pub components: IndexMap<String, Value>,

    /// Components used as the success response body
    pub response_components: Vec<String>,
}

/// OpenAPI operation synthesized from one link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "operationId")]
    pub operation_id: String,

    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    pub responses: IndexMap<String, Response>,

    #[serde(flatten)]
    pub extension: Option<ExtensionBlock>,

    #[serde(skip)]
    pub context: OperationContext,
}

impl OperationSpec {
    /// Names of path parameters, in declaration order
    pub fn path_parameter_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.as_str())
            .collect()
    }
}
