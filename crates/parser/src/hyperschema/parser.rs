//! Hyper-Schema file parser

use super::types::SchemaDocument;
use hyperschema_stackql_common::{GeneratorError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// JSON Hyper-Schema parser
///
/// Reads a hypermedia schema from a file, string or bytes. Acquiring the
/// schema (downloading, cloning) is left to the caller.
pub struct HyperSchemaParser {
    /// Raw schema document
    raw: Value,
}

impl HyperSchemaParser {
    /// Load a schema from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = HyperSchemaParser::from_file("heroku-schema.json")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read schema file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a schema from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse schema JSON: {}", e)))?;

        Ok(Self::from_value(raw))
    }

    /// Parse a schema from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: Value = serde_json::from_slice(bytes)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse schema JSON: {}", e)))?;

        Ok(Self::from_value(raw))
    }

    /// Wrap an already parsed document
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// Resolve the document into a `SchemaDocument`
    pub fn load(self) -> Result<SchemaDocument> {
        super::loader::load(self.raw)
    }

    /// Get reference to the raw document
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
