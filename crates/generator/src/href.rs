//! Link href templates
//!
//! Heroku hrefs name their placeholders with an encoded JSON pointer:
//! `/apps/{(%23%2Fdefinitions%2Fapp%2Fdefinitions%2Fidentity)}`. Plain
//! `{name}` placeholders are accepted too.

use hyperschema_stackql_parser::sanitize_name;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\(([^)]+)\)\}|\{([^{}()]+)\}").expect("invalid placeholder regex")
});

/// Where a placeholder's type comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderSource {
    /// `{name}`: the resource property of the same name
    Property(String),

    /// `{(#/definitions/...)}`: the pointed-to schema
    Pointer(String),
}

/// One path placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Parameter name as it appears in the rewritten path
    pub name: String,

    pub source: PlaceholderSource,
}

/// Parsed href
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefTemplate {
    /// OpenAPI path with `{name}` placeholders
    pub path: String,

    /// Distinct placeholders in order of first appearance
    pub placeholders: Vec<Placeholder>,
}

impl HrefTemplate {
    /// Decode an href and rewrite its placeholders to OpenAPI form
    pub fn parse(href: &str) -> Self {
        let decoded = percent_decode_str(href).decode_utf8_lossy();
        let mut placeholders: Vec<Placeholder> = Vec::new();

        let path = PLACEHOLDER_RE.replace_all(&decoded, |caps: &Captures| {
            let placeholder = if let Some(pointer) = caps.get(1) {
                Placeholder {
                    name: pointer_param_name(pointer.as_str()),
                    source: PlaceholderSource::Pointer(pointer.as_str().to_string()),
                }
            } else {
                let name = caps.get(2).map_or("", |m| m.as_str()).trim();
                Placeholder {
                    name: name.to_string(),
                    source: PlaceholderSource::Property(name.to_string()),
                }
            };

            let rendered = format!("{{{}}}", placeholder.name);
            if !placeholders.iter().any(|p| p.name == placeholder.name) {
                placeholders.push(placeholder);
            }
            rendered
        });

        Self {
            path: path.into_owned(),
            placeholders,
        }
    }
}

/// Parameter name for a pointer placeholder: `{resource}_{last segment}`
fn pointer_param_name(pointer: &str) -> String {
    let segments: Vec<&str> = pointer.split('/').collect();
    let base = segments
        .last()
        .copied()
        .unwrap_or(pointer)
        .replace(['(', ')'], "");
    let context = if segments.len() > 2 {
        segments[2].to_string()
    } else {
        base.clone()
    };

    sanitize_name(&format!("{}_{}", context, base))
}
