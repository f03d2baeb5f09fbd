//! Resource extraction
//!
//! A resource is a direct child of the top-level `definitions` with at least
//! one link. Resources keep the order they are declared in the schema.

use crate::hyperschema::{LinkDescriptor, SchemaDocument};
use crate::naming::ServiceNamer;
use serde::Serialize;
use tracing::debug;

/// A definition together with its operations and service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUnit {
    /// Definition key (e.g. "app", "add-on-attachment")
    pub key: String,

    /// Pointer of the definition
    pub pointer: String,

    /// Service the resource is grouped into (e.g. "apps")
    pub service: String,

    /// Links in declaration order
    pub links: Vec<LinkDescriptor>,

    /// Declaration index among extracted resources
    pub index: usize,
}

/// Extract resources in source order
pub fn extract(doc: &SchemaDocument, namer: &ServiceNamer) -> Vec<ResourceUnit> {
    let units: Vec<ResourceUnit> = doc
        .top_level()
        .filter(|definition| !definition.links.is_empty())
        .enumerate()
        .map(|(index, definition)| ResourceUnit {
            key: definition.key.clone(),
            pointer: definition.pointer.clone(),
            service: namer.service_name(&definition.key),
            links: definition.links.clone(),
            index,
        })
        .collect();

    for unit in &units {
        debug!(
            resource = %unit.key,
            service = %unit.service,
            links = unit.links.len(),
            "Extracted resource"
        );
    }

    units
}
