//! Rendering and writing of the provider tree
//!
//! Everything is rendered to strings first. Files are only handed to an
//! [`OutputSink`] once every document has rendered, so a failing build never
//! leaves a half-written provider behind.

use crate::manifest::SERVICES_DIR;
use crate::ProviderOutput;
use hyperschema_stackql_common::{GeneratorError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest file name
pub const MANIFEST_FILE: &str = "provider.yaml";

/// A rendered file, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Destination for rendered files
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink {
    /// Write one file; `path` is relative to the sink's root
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes files under a directory, creating parents as needed
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl OutputSink for FsSink {
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GeneratorError::Generation(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(&target, contents).map_err(|e| {
            GeneratorError::Generation(format!("Failed to write {}: {}", target.display(), e))
        })?;

        debug!(path = %target.display(), bytes = contents.len(), "Wrote file");
        Ok(())
    }
}

/// Render the manifest and every service document
///
/// Paths are `<name>/<version>/provider.yaml` and
/// `<name>/<version>/services/<service>.yaml`.
pub fn render(output: &ProviderOutput) -> Result<Vec<RenderedFile>> {
    let base = PathBuf::from(&output.manifest.name).join(&output.manifest.version);

    let mut files = Vec::with_capacity(output.documents.len() + 1);
    files.push(RenderedFile {
        path: base.join(MANIFEST_FILE),
        contents: serde_yaml::to_string(&output.manifest)?,
    });

    for document in &output.documents {
        files.push(RenderedFile {
            path: base
                .join(SERVICES_DIR)
                .join(format!("{}.yaml", document.name)),
            contents: serde_yaml::to_string(document)?,
        });
    }

    Ok(files)
}

/// Hand rendered files to a sink, in order
pub fn write_all(files: &[RenderedFile], sink: &dyn OutputSink) -> Result<()> {
    for file in files {
        sink.write(&file.path, &file.contents)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn files() -> Vec<RenderedFile> {
        vec![
            RenderedFile {
                path: PathBuf::from("heroku/v0/provider.yaml"),
                contents: "name: heroku\n".to_string(),
            },
            RenderedFile {
                path: PathBuf::from("heroku/v0/services/apps.yaml"),
                contents: "openapi: 3.0.0\n".to_string(),
            },
        ]
    }

    #[test]
    fn test_fs_sink_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let sink = FsSink::new(temp.path());

        write_all(&files(), &sink).unwrap();

        let manifest = temp.path().join("heroku/v0/provider.yaml");
        let service = temp.path().join("heroku/v0/services/apps.yaml");
        assert_eq!(fs::read_to_string(manifest).unwrap(), "name: heroku\n");
        assert_eq!(fs::read_to_string(service).unwrap(), "openapi: 3.0.0\n");
    }

    #[test]
    fn test_write_all_stops_at_first_failure() {
        let mut sink = MockOutputSink::new();
        sink.expect_write()
            .with(eq(Path::new("heroku/v0/provider.yaml")), eq("name: heroku\n"))
            .times(1)
            .returning(|_, _| Err(GeneratorError::Generation("disk full".to_string())));

        let err = write_all(&files(), &sink).unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }
}
