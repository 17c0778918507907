use pkgbump::{Config, Mode};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a temporary project directory
pub struct TempProject {
    pub dir: TempDir,
}

impl TempProject {
    /// Create a new temporary project
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    /// Create a project whose package.json has the given content
    pub fn with_manifest(content: &str) -> Self {
        let project = Self::new();
        project.create_file("package.json", content);
        project
    }

    /// Get the path to the project directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file in the project with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) {
        let file_path = self.dir.path().join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Get the absolute path to a file in the project
    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.file_path("package.json")
    }

    /// Current content of package.json
    pub fn manifest(&self) -> String {
        fs::read_to_string(self.manifest_path()).expect("Failed to read package.json")
    }

    /// Run configuration for this project against `registry`
    pub fn config(&self, registry: &MockServer) -> Config {
        let mut config = Config {
            manifest_path: self.manifest_path(),
            mode: Mode::Latest,
            ..Config::default()
        };
        config.registry.set_default_registry(&registry.uri());
        config
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A hand-formatted manifest: odd indentation, key order, and unrelated
/// fields that must survive a rewrite untouched
pub fn sample_package_json() -> &'static str {
    r#"{
   "name":    "sample-app",
   "version": "0.3.1",
   "scripts": { "build": "tsc -p .",   "test": "node --test" },
   "dependencies": {
      "left-pad":  "^1.2.0",
      "is-odd":    "git+https://example/repo.git",
      "@corp/ui":  "~2.0.0"
   },
   "devDependencies": {
      "typescript": "^5.4.0",
      "left-pad":   "1.2.0"
   }
}
"#
}

/// Registry response for `name` whose `latest` tag is `latest`; mount it
/// with the expected number of calls
pub fn package_mock(name: &str, latest: &str, versions: &[&str]) -> Mock {
    let escaped = if name.starts_with('@') {
        name.replacen('/', "%2F", 1)
    } else {
        name.to_string()
    };
    let versions: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| ((*v).to_string(), json!({ "version": v })))
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/{escaped}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": name,
            "dist-tags": { "latest": latest },
            "versions": versions
        })))
}
