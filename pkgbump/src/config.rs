use crate::error::{Error, Result};
use pkgbump_core::Selection;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MANIFEST: &str = "package.json";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Which registry version a dependency is bumped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The `latest` dist-tag
    #[default]
    Latest,
    /// The highest version ever published
    Greatest,
}

/// Options for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// Manifest to read and rewrite (default `package.json`)
    pub manifest_path: PathBuf,
    /// Name globs; a leading `!` negates (default: everything)
    pub patterns: Vec<String>,
    /// Maximum registry lookups in flight (default 8)
    pub concurrency: usize,
    pub mode: Mode,
    /// Resolve and report, but never write the manifest
    pub dry_run: bool,
    /// Report every considered entry, not just updated ones
    pub show_all: bool,
    /// Per-lookup timeout (default 30s)
    pub timeout: Duration,
    pub registry: RegistryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            patterns: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            mode: Mode::default(),
            dry_run: false,
            show_all: false,
            timeout: DEFAULT_TIMEOUT,
            registry: RegistryConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }
        self.registry.validate()
    }

    /// Compile the name patterns
    pub fn selection(&self) -> Result<Selection> {
        Ok(Selection::new(self.patterns.as_slice())?)
    }
}

/// Registry credential attached as the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `_authToken`
    Bearer(String),
    /// `_auth`, already base64 encoded
    Basic(String),
}

impl Credential {
    pub fn header_value(&self) -> String {
        match self {
            Credential::Bearer(token) => format!("Bearer {token}"),
            Credential::Basic(auth) => format!("Basic {auth}"),
        }
    }
}

// Keep secrets out of logs and debug output
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
            Credential::Basic(_) => f.write_str("Basic(***)"),
        }
    }
}

/// Where packages are looked up and with which credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Endpoint for unscoped packages and unconfigured scopes
    pub default_registry: String,
    /// `@scope` -> endpoint
    pub scopes: HashMap<String, String>,
    /// `//host/path/` -> credential
    pub credentials: HashMap<String, Credential>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            scopes: HashMap::new(),
            credentials: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    pub fn set_default_registry(&mut self, url: &str) {
        self.default_registry = normalize_endpoint(url);
    }

    /// Scopes are stored lowercased, matching the lookup names they route
    pub fn set_scope_registry(&mut self, scope: &str, url: &str) {
        self.scopes.insert(scope.to_lowercase(), normalize_endpoint(url));
    }

    /// Register a credential for every endpoint under `prefix`, given as a
    /// URL or in `//host/path/` form
    pub fn set_credential(&mut self, prefix: &str, credential: Credential) {
        let key = nerf_dart(prefix).unwrap_or_else(|| normalize_endpoint(prefix));
        self.credentials.insert(key, credential);
    }

    /// Endpoint serving `name`; `@scope/pkg` may route to a scope registry
    pub fn endpoint_for(&self, name: &str) -> &str {
        name.strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
            .and_then(|(scope, _)| self.scopes.get(&format!("@{scope}")))
            .map_or(self.default_registry.as_str(), String::as_str)
    }

    /// Credential for `endpoint`, matched on the longest configured prefix
    pub fn credential_for(&self, endpoint: &str) -> Option<&Credential> {
        let nerf = nerf_dart(endpoint)?;
        self.credentials
            .iter()
            .filter(|(prefix, _)| nerf.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, credential)| credential)
    }

    pub fn validate(&self) -> Result<()> {
        std::iter::once(&self.default_registry)
            .chain(self.scopes.values())
            .try_for_each(|endpoint| {
                let url = Url::parse(endpoint)
                    .map_err(|e| Error::Config(format!("invalid registry URL {endpoint:?}: {e}")))?;
                match url.scheme() {
                    "http" | "https" => Ok(()),
                    other => Err(Error::Config(format!(
                        "registry URL {endpoint:?} has unsupported scheme {other:?}"
                    ))),
                }
            })
    }
}

/// Ensure an endpoint ends with `/` so package names can be appended
pub fn normalize_endpoint(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Scheme-less `//host[:port]/path/` form of a registry URL, the key npm
/// uses for per-registry settings
pub fn nerf_dart(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = parsed.path();
    let slash = if path.ends_with('/') { "" } else { "/" };
    Some(format!("//{host}{port}{path}{slash}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.manifest_path, PathBuf::from("package.json"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.mode, Mode::Latest);
        assert!(!config.dry_run);
        assert!(!config.show_all);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            concurrency: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.registry.set_default_registry("not a url");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.registry.set_scope_registry("@corp", "ftp://corp.example/");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_pattern_surfaces_as_pattern_error() {
        let config = Config {
            patterns: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(matches!(config.selection(), Err(Error::Pattern(_))));
    }

    #[test]
    fn test_endpoint_routing_by_scope() {
        let mut registry = RegistryConfig::default();
        registry.set_scope_registry("@corp", "https://npm.corp.example/api");

        assert_eq!(registry.endpoint_for("left-pad"), DEFAULT_REGISTRY);
        assert_eq!(registry.endpoint_for("@corp/tool"), "https://npm.corp.example/api/");
        assert_eq!(registry.endpoint_for("@other/tool"), DEFAULT_REGISTRY);
        assert_eq!(registry.endpoint_for("@corp"), DEFAULT_REGISTRY);
    }

    #[test]
    fn test_scope_registry_is_case_insensitive() {
        let mut registry = RegistryConfig::default();
        registry.set_scope_registry("@Corp", "https://npm.corp.example/");
        assert_eq!(registry.endpoint_for("@corp/ui"), "https://npm.corp.example/");
    }

    #[test]
    fn test_credential_longest_prefix_wins() {
        let mut registry = RegistryConfig::default();
        registry.set_credential("//npm.corp.example/", Credential::Basic("b64".to_string()));
        registry.set_credential(
            "https://npm.corp.example/api/",
            Credential::Bearer("token".to_string()),
        );

        assert_eq!(
            registry.credential_for("https://npm.corp.example/api/"),
            Some(&Credential::Bearer("token".to_string()))
        );
        assert_eq!(
            registry.credential_for("https://npm.corp.example/other/"),
            Some(&Credential::Basic("b64".to_string()))
        );
        assert_eq!(registry.credential_for(DEFAULT_REGISTRY), None);
    }

    #[test]
    fn test_nerf_dart() {
        assert_eq!(
            nerf_dart("https://registry.npmjs.org/").as_deref(),
            Some("//registry.npmjs.org/")
        );
        assert_eq!(
            nerf_dart("http://127.0.0.1:4873/npm").as_deref(),
            Some("//127.0.0.1:4873/npm/")
        );
        assert_eq!(nerf_dart("//no-scheme/"), None);
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let credential = Credential::Bearer("s3cret".to_string());
        assert_eq!(format!("{credential:?}"), "Bearer(***)");
        assert_eq!(credential.header_value(), "Bearer s3cret");
    }
}
