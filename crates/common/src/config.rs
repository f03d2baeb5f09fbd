//! Generator configuration loaded from YAML files
//!
//! Every field has a Heroku default, so a config file only needs to list the
//! values it changes. CLI flags are applied on top of whatever is loaded here.

use crate::{GeneratorError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one generator run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Provider identifier (e.g., "heroku")
    pub provider: String,

    /// Provider version, used in the output path and document info
    pub version: String,

    /// Title prefix for service documents (e.g., "Heroku Platform API")
    pub title: String,

    /// Base URL of the described API
    pub server_url: String,

    /// Authentication block for the manifest and security scheme
    pub auth: Option<AuthConfig>,

    /// Resource key -> service name, applied after the built-in tables
    pub service_overrides: IndexMap<String, String>,

    /// Group related resources into families (team-app -> apps)
    pub families: bool,

    /// How operationIds and method names are derived
    pub operation_id_style: OperationIdStyle,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "heroku".to_string(),
            version: "v0".to_string(),
            title: "Heroku Platform API".to_string(),
            server_url: "https://api.heroku.com".to_string(),
            auth: Some(AuthConfig::default()),
            service_overrides: IndexMap::new(),
            families: false,
            operation_id_style: OperationIdStyle::Rel,
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub auth_type: String,

    /// Environment variable holding the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentialsenvvar: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: "bearer".to_string(),
            credentialsenvvar: Some("HEROKU_API_TOKEN".to_string()),
        }
    }
}

/// Source of the operationId prefix and `x-stackQL-method` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationIdStyle {
    /// `{rel}-{resource}`
    #[default]
    Rel,

    /// `{title}-{resource}`, falling back to rel for untitled links.
    /// Needed for schemas that reuse a rel within one resource.
    Title,
}

impl GeneratorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Parse(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            GeneratorError::Parse(format!("Failed to parse config YAML from {:?}: {}", path, e))
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Name of the security scheme in service documents
    pub fn security_scheme_name(&self) -> String {
        format!("{}Auth", self.provider)
    }
}
