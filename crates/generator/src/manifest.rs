//! Provider manifest (`provider.yaml`)

use hyperschema_stackql_common::{
    GeneratorConfig, GeneratorError, ManifestService, ProviderConfigBlock, ProviderManifest,
    Result, ServiceDocument,
};

/// Directory service documents are written to, relative to the manifest
pub const SERVICES_DIR: &str = "services";

/// Index the service documents, in the order given
pub fn build(documents: &[ServiceDocument], config: &GeneratorConfig) -> Result<ProviderManifest> {
    if documents.is_empty() {
        return Err(GeneratorError::EmptyProvider);
    }

    let services = documents
        .iter()
        .map(|document| ManifestService {
            name: document.name.clone(),
            file: format!("{}/{}.yaml", SERVICES_DIR, document.name),
        })
        .collect();

    Ok(ProviderManifest {
        name: config.provider.clone(),
        version: config.version.clone(),
        services,
        config: config
            .auth
            .clone()
            .map(|auth| ProviderConfigBlock { auth }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperschema_stackql_common::{Components, Info};
    use indexmap::IndexMap;

    fn document(name: &str) -> ServiceDocument {
        ServiceDocument {
            name: name.to_string(),
            openapi: "3.0.0".to_string(),
            info: Info {
                title: name.to_string(),
                description: None,
                version: "v0".to_string(),
            },
            servers: vec![],
            paths: IndexMap::new(),
            components: Components::default(),
            security: vec![],
        }
    }

    #[test]
    fn test_manifest_lists_services_in_order() {
        let config = GeneratorConfig::default();
        let manifest = build(&[document("addons"), document("apps")], &config).unwrap();

        assert_eq!(manifest.name, "heroku");
        assert_eq!(manifest.version, "v0");
        let files: Vec<&str> = manifest.services.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, vec!["services/addons.yaml", "services/apps.yaml"]);

        let auth = manifest.config.unwrap().auth;
        assert_eq!(auth.auth_type, "bearer");
        assert_eq!(auth.credentialsenvvar.as_deref(), Some("HEROKU_API_TOKEN"));
    }

    #[test]
    fn test_manifest_without_auth() {
        let config = GeneratorConfig {
            auth: None,
            ..Default::default()
        };
        let manifest = build(&[document("apps")], &config).unwrap();
        assert!(manifest.config.is_none());
    }

    #[test]
    fn test_empty_provider() {
        let err = build(&[], &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyProvider));
    }
}
