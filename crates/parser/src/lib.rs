//! Hyper-Schema parsing for StackQL provider generation
//!
//! This crate loads a JSON Hyper-Schema document into a resolved
//! `SchemaDocument` and extracts the resources that carry operations.
//!
//! ## Parsing Strategy
//!
//! The Heroku Platform API schema is one document whose top-level
//! `definitions` are resources. Each resource lists `links`, and each link is
//! one HTTP operation:
//! - `definitions::*` become arena nodes keyed by JSON pointer
//! - every `$ref` is resolved once during load
//! - resources with links become `ResourceUnit`s, named after their service
//!
//! Links are mapped to SQL verbs:
//! - GET → SELECT
//! - POST with a CRUD rel → INSERT, other POSTs → EXEC
//! - PATCH, PUT → UPDATE
//! - DELETE → DELETE

pub mod extractor;
pub mod hyperschema;
mod naming;
mod operation_mapper;
mod type_mapper;

pub use extractor::{extract, ResourceUnit};
pub use hyperschema::{Definition, HyperSchemaParser, LinkDescriptor, SchemaDocument};
pub use naming::{pluralize, sanitize_name, slugify, title_case, ServiceNamer};
pub use operation_mapper::{VerbMapper, CRUD_RELS};
pub use type_mapper::TypeMapper;

use hyperschema_stackql_common::Result;
use std::path::Path;

/// Load a schema file and extract its resources
///
/// # Arguments
/// * `path` - Path to the Hyper-Schema JSON document
/// * `namer` - Service naming rules
///
/// # Returns
/// * The resolved document and its resources in declaration order
pub fn parse_schema_file(
    path: &Path,
    namer: &ServiceNamer,
) -> Result<(SchemaDocument, Vec<ResourceUnit>)> {
    let doc = HyperSchemaParser::from_file(path)?.load()?;
    let units = extract(&doc, namer);
    Ok((doc, units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_missing_file() {
        let result = parse_schema_file(Path::new("/nonexistent/schema.json"), &ServiceNamer::new());
        assert!(result.is_err());
    }
}
