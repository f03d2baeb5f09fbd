//! StackQL extension injection

use crate::components::{primary_identifier, PRIMARY_IDENTIFIER_EXTENSION};
use hyperschema_stackql_common::{ExtensionBlock, GeneratorError, OperationSpec, Result};
use hyperschema_stackql_parser::{LinkDescriptor, ResourceUnit, VerbMapper};
use serde_json::Value;

/// Attach the `x-stackQL-*` block to a synthesized operation
///
/// Response components are marked with `x-stackQL-primaryIdentifier` when
/// they have an `id` or `*_id` property.
pub fn annotate(
    mut spec: OperationSpec,
    unit: &ResourceUnit,
    link: &LinkDescriptor,
) -> Result<OperationSpec> {
    let verb = VerbMapper::classify(&link.method, &link.rel).ok_or_else(|| {
        GeneratorError::Annotation {
            resource: unit.key.clone(),
            rel: link.rel.clone(),
            method: link.method.clone(),
        }
    })?;

    let method = if spec.context.method_name.is_empty() {
        link.rel.clone()
    } else {
        spec.context.method_name.clone()
    };

    spec.extension = Some(ExtensionBlock {
        resource: unit.key.clone(),
        id: format!("{}.{}", unit.key, method),
        method,
        verb,
    });

    for name in &spec.context.response_components {
        if let Some(schema) = spec.context.components.get_mut(name) {
            if let Some(identifier) = primary_identifier(schema) {
                if let Value::Object(object) = schema {
                    object.insert(
                        PRIMARY_IDENTIFIER_EXTENSION.to_string(),
                        Value::String(identifier),
                    );
                }
            }
        }
    }

    Ok(spec)
}
