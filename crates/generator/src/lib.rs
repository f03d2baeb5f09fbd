//! OpenAPI service document and provider manifest generation for StackQL
//!
//! This crate turns a resolved Hyper-Schema document into a StackQL provider:
//! one OpenAPI 3.0 document per service plus a `provider.yaml` manifest.
//!
//! The pipeline runs in fixed stages:
//! - synthesize one operation per link
//! - annotate each operation with its `x-stackQL-*` block
//! - group operations into service documents
//! - build the manifest, render everything, then write

mod annotator;
mod components;
mod grouper;
mod href;
mod manifest;
mod synthesizer;
mod writer;

pub use annotator::annotate;
pub use components::{component_name, ComponentCollector, ComponentNames};
pub use grouper::group;
pub use href::{HrefTemplate, Placeholder, PlaceholderSource};
pub use manifest::build as build_manifest;
pub use synthesizer::{method_name, synthesize};
pub use writer::{render, write_all, FsSink, OutputSink, RenderedFile, MANIFEST_FILE};

#[cfg(test)]
pub use writer::MockOutputSink;

use hyperschema_stackql_common::{
    GeneratorConfig, GeneratorError, ProviderManifest, Result, ServiceDocument,
};
use hyperschema_stackql_parser::{extract, HyperSchemaParser, SchemaDocument, ServiceNamer};
use std::path::Path;
use tracing::{debug, info};

/// Everything a provider consists of, before rendering
#[derive(Debug, Clone)]
pub struct ProviderOutput {
    pub manifest: ProviderManifest,

    /// Service documents, sorted by service name
    pub documents: Vec<ServiceDocument>,
}

impl ProviderOutput {
    /// Total number of operations across all services
    pub fn operation_count(&self) -> usize {
        self.documents.iter().map(ServiceDocument::operation_count).sum()
    }

    /// Render every file of the provider tree
    pub fn render(&self) -> Result<Vec<RenderedFile>> {
        writer::render(self)
    }
}

/// Provider generator
///
/// Runs the whole pipeline over one schema document:
/// - services/<service>.yaml (OpenAPI 3.0 with `x-stackQL-*` extensions)
/// - provider.yaml (manifest)
pub struct ProviderGenerator {
    doc: SchemaDocument,
    config: GeneratorConfig,
}

impl ProviderGenerator {
    pub fn new(doc: SchemaDocument, config: GeneratorConfig) -> Self {
        Self { doc, config }
    }

    /// Build service documents and the manifest in memory
    pub fn build(&self) -> Result<ProviderOutput> {
        let namer = ServiceNamer::from_config(&self.config);
        let units = extract(&self.doc, &namer);
        if units.is_empty() {
            return Err(GeneratorError::EmptyProvider);
        }
        info!(resources = units.len(), "Extracted resources");

        let mut names = ComponentNames::new();
        let mut specs = Vec::new();
        for unit in &units {
            let synthesized = synthesizer::synthesize(&self.doc, unit, &self.config, &mut names)?;
            for (spec, link) in synthesized.into_iter().zip(&unit.links) {
                specs.push(annotator::annotate(spec, unit, link)?);
            }
        }
        info!(operations = specs.len(), "Synthesized operations");

        let mut documents = grouper::group(&units, specs, &self.config)?;
        let description = self.doc.description().map(String::from);
        for document in &mut documents {
            document.info.description = description.clone();
        }

        let manifest = manifest::build(&documents, &self.config)?;
        debug!(services = manifest.services.len(), "Built manifest");

        Ok(ProviderOutput {
            manifest,
            documents,
        })
    }

    /// Build, render and hand every file to a sink
    ///
    /// Nothing reaches the sink unless the whole provider renders.
    pub fn write_to(&self, sink: &dyn OutputSink) -> Result<ProviderOutput> {
        let output = self.build()?;
        let files = output.render()?;
        writer::write_all(&files, sink)?;

        info!(
            files = files.len(),
            services = output.documents.len(),
            operations = output.operation_count(),
            "Wrote provider"
        );
        Ok(output)
    }

    /// Write the provider tree under a directory
    ///
    /// Files land in `<output_dir>/<name>/<version>/`.
    pub fn generate_to_directory(&self, output_dir: &Path) -> Result<ProviderOutput> {
        self.write_to(&FsSink::new(output_dir))
    }
}

/// Generate a provider from a schema file (convenience function)
pub fn generate_provider(
    schema_path: &Path,
    config: GeneratorConfig,
    output_dir: &Path,
) -> Result<ProviderOutput> {
    let doc = HyperSchemaParser::from_file(schema_path)?.load()?;
    ProviderGenerator::new(doc, config).generate_to_directory(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperschema_stackql_parser::hyperschema::load;
    use serde_json::json;

    #[test]
    fn test_build_without_resources() {
        let doc = load(json!({"definitions": {"region": {"type": ["object"]}}})).unwrap();
        let generator = ProviderGenerator::new(doc, GeneratorConfig::default());

        let err = generator.build().unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyProvider));
    }

    #[test]
    fn test_failed_build_never_writes() {
        let doc = load(json!({
            "definitions": {
                "app": {"links": [{"href": "/apps", "method": "", "rel": "instances"}]}
            }
        }))
        .unwrap();
        let generator = ProviderGenerator::new(doc, GeneratorConfig::default());

        let mut sink = MockOutputSink::new();
        sink.expect_write().times(0);

        let err = generator.write_to(&sink).unwrap_err();
        assert!(matches!(err, GeneratorError::Annotation { .. }));
    }

    #[test]
    fn test_schema_description_lands_in_info() {
        let doc = load(json!({
            "description": "The platform API empowers developers.",
            "definitions": {"app": {"links": [{"href": "/apps", "rel": "instances"}]}}
        }))
        .unwrap();
        let output = ProviderGenerator::new(doc, GeneratorConfig::default())
            .build()
            .unwrap();

        assert_eq!(
            output.documents[0].info.description.as_deref(),
            Some("The platform API empowers developers.")
        );
        assert_eq!(output.documents[0].info.title, "Heroku Platform API - Apps");
        assert_eq!(output.operation_count(), 1);
    }
}
