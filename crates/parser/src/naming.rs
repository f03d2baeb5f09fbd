//! Service naming and identifier helpers
//!
//! A resource's service is the plural of its definition key. The plural rule
//! appends "s", or "es" after a trailing "s"; irregular Heroku resource names
//! are listed explicitly.

use hyperschema_stackql_common::GeneratorConfig;
use indexmap::IndexMap;

/// Heroku resources the plural rule gets wrong
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("account-delinquency", "account-delinquencies"),
    ("team-delinquency", "team-delinquencies"),
    ("add-on-region-capability", "add-on-region-capabilities"),
    ("space-topology", "space-topologies"),
    ("filter-apps", "filter-apps"),
    ("user-preferences", "user-preferences"),
    ("peering-info", "peering-info"),
];

/// Heroku resource families, one service per family
const HEROKU_FAMILIES: &[(&str, &str)] = &[
    ("app", "apps"),
    ("team-app", "apps"),
    ("app-feature", "apps"),
    ("app-setup", "apps"),
    ("app-transfer", "apps"),
    ("app-webhook", "apps"),
    ("app-webhook-delivery", "apps"),
    ("app-webhook-event", "apps"),
    ("add-on", "addons"),
    ("add-on-attachment", "addons"),
    ("add-on-service", "addons"),
    ("add-on-config", "addons"),
    ("add-on-action", "addons"),
    ("allowed-add-on-service", "addons"),
    ("plan", "addons"),
    ("build", "builds"),
    ("buildpack-installation", "builds"),
    ("config-var", "config_vars"),
    ("dyno", "dynos"),
    ("dyno-size", "dynos"),
    ("formation", "dynos"),
    ("log-drain", "logging"),
    ("log-session", "logging"),
    ("release", "releases"),
    ("slug", "releases"),
    ("oci-image", "releases"),
    ("account", "accounts"),
    ("account-feature", "accounts"),
    ("team", "teams"),
    ("team-member", "teams"),
    ("team-invitation", "teams"),
    ("team-feature", "teams"),
    ("collaborator", "collaborators"),
    ("team-app-collaborator", "collaborators"),
    ("domain", "domains"),
    ("sni-endpoint", "domains"),
    ("key", "keys"),
    ("oauth-authorization", "oauth"),
    ("oauth-client", "oauth"),
    ("oauth-token", "oauth"),
    ("oauth-grant", "oauth"),
    ("pipeline", "pipelines"),
    ("pipeline-coupling", "pipelines"),
    ("pipeline-promotion", "pipelines"),
    ("pipeline-release", "pipelines"),
    ("pipeline-deployment", "pipelines"),
    ("region", "platform"),
    ("stack", "platform"),
    ("space", "spaces"),
    ("vpn-connection", "networking"),
    ("peering", "networking"),
];

/// Maps resource keys to service names
#[derive(Debug, Clone)]
pub struct ServiceNamer {
    overrides: IndexMap<String, String>,
}

impl Default for ServiceNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceNamer {
    /// Plural rule plus the irregular Heroku table
    pub fn new() -> Self {
        Self {
            overrides: IRREGULAR_PLURALS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Plural rule only
    pub fn plain() -> Self {
        Self {
            overrides: IndexMap::new(),
        }
    }

    /// Add the Heroku family table
    pub fn with_families(mut self) -> Self {
        for (key, service) in HEROKU_FAMILIES {
            self.overrides.insert(key.to_string(), service.to_string());
        }
        self
    }

    /// Add explicit overrides; these win over every built-in table
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, service) in overrides {
            self.overrides.insert(key.clone(), service.clone());
        }
        self
    }

    /// Namer matching a generator configuration
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let namer = Self::new();
        let namer = if config.families {
            namer.with_families()
        } else {
            namer
        };
        namer.with_overrides(&config.service_overrides)
    }

    /// Service name for a resource key
    ///
    /// # Examples
    /// ```
    /// use hyperschema_stackql_parser::ServiceNamer;
    ///
    /// let namer = ServiceNamer::new();
    /// assert_eq!(namer.service_name("app"), "apps");
    /// assert_eq!(namer.service_name("addon-attachment"), "addon-attachments");
    /// assert_eq!(namer.service_name("space-topology"), "space-topologies");
    /// ```
    pub fn service_name(&self, key: &str) -> String {
        self.overrides
            .get(key)
            .cloned()
            .unwrap_or_else(|| pluralize(key))
    }
}

/// Append "s", or "es" when the word already ends in "s"
pub fn pluralize(key: &str) -> String {
    if key.ends_with('s') {
        format!("{}es", key)
    } else {
        format!("{}s", key)
    }
}

/// Lowercase, hyphen-separated identifier (operationIds)
pub fn slugify(s: &str) -> String {
    let mut result = String::new();
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
        } else if !result.is_empty() && !result.ends_with('-') {
            result.push('-');
        }
    }
    result.trim_matches('-').to_string()
}

/// Convert a name to snake_case (component and parameter names)
pub fn sanitize_name(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let should_add_underscore = i > 0
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase()));

            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_alphanumeric() {
            result.push(ch);
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }

    result.trim_matches('_').to_string()
}

/// Title-case a hyphenated or snake_case name ("team-app" -> "Team App")
pub fn title_case(s: &str) -> String {
    s.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
