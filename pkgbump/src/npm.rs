use crate::config::{Mode, RegistryConfig};
use crate::error::{self, Error, ResolveError};
use pkgbump_core::Version;
use pkgbump_core::version::{greatest, parse_version};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Abbreviated ("corgi") metadata first, full packument as fallback
const ACCEPT_METADATA: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// The parts of a packument needed to pick a resolution target
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, IgnoredAny>,
}

/// Client for npm-compatible registries
pub struct NpmClient {
    client: reqwest::Client,
    registry: Arc<RegistryConfig>,
    mode: Mode,
}

impl NpmClient {
    /// Build a client whose every request carries the user agent and is
    /// bounded by `timeout`
    pub fn new(registry: RegistryConfig, mode: Mode, timeout: Duration) -> error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pkgbump/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            registry: Arc::new(registry),
            mode,
        })
    }

    /// Endpoint and metadata URL for `name`. Names are lowercased and the
    /// scope separator is escaped, as the registry expects.
    pub fn package_url(&self, name: &str) -> (&str, String) {
        let name = name.to_lowercase();
        let endpoint = self.registry.endpoint_for(&name);
        let escaped = if name.starts_with('@') {
            name.replacen('/', "%2F", 1)
        } else {
            name
        };
        (endpoint, format!("{endpoint}{escaped}"))
    }

    /// Resolve `name` to its target version for the configured mode
    pub async fn resolve(&self, name: &str) -> Result<Version, ResolveError> {
        let packument = self.fetch(name).await?;
        resolution_target(&packument, self.mode)
    }

    async fn fetch(&self, name: &str) -> Result<Packument, ResolveError> {
        let (endpoint, url) = self.package_url(name);
        tracing::debug!(package = name, %url, "fetching metadata");

        let mut request = self.client.get(&url).header(ACCEPT, ACCEPT_METADATA);
        if let Some(credential) = self.registry.credential_for(endpoint) {
            request = request.header(AUTHORIZATION, credential.header_value());
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound {
                registry: endpoint.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ResolveError::Network(format!(
                "registry request failed with status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

fn resolution_target(packument: &Packument, mode: Mode) -> Result<Version, ResolveError> {
    match mode {
        Mode::Latest => {
            let latest = packument
                .dist_tags
                .get("latest")
                .ok_or(ResolveError::MissingTarget("latest"))?;
            parse_version(latest).map_err(|e| ResolveError::InvalidMetadata(e.to_string()))
        }
        Mode::Greatest => greatest(packument.versions.keys().map(String::as_str))
            .ok_or(ResolveError::MissingTarget("valid")),
    }
}

// Cheap to clone: the HTTP client and registry settings are shared
impl Clone for NpmClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            registry: Arc::clone(&self.registry),
            mode: self.mode,
        }
    }
}
