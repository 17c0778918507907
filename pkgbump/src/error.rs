use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the run-level [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single registry lookup failed
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Registry answered 404
    #[error("package not found in registry {registry}")]
    NotFound { registry: String },

    /// Transport error, timeout, or a non-success status
    #[error("network failure: {0}")]
    Network(String),

    /// Registry metadata has no usable resolution target
    #[error("no {0} version published")]
    MissingTarget(&'static str),

    /// Registry metadata could not be decoded
    #[error("invalid registry metadata: {0}")]
    InvalidMetadata(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ResolveError::InvalidMetadata(e.to_string())
        } else if e.is_timeout() {
            ResolveError::Network(format!("request timed out: {e}"))
        } else {
            ResolveError::Network(e.to_string())
        }
    }
}

/// Errors that abort a run. Every variant is raised before the manifest is
/// written.
#[derive(Debug, Error)]
pub enum Error {
    /// Manifest file does not exist
    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// Manifest is not well-formed JSON
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    /// Name pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// One or more registry lookups failed
    #[error("{}", format_failures(.0))]
    Resolution(Vec<(String, ResolveError)>),

    /// The pinned version was not found verbatim inside its specifier
    #[error("Cannot rewrite {name}: {source}")]
    Substitution {
        name: String,
        source: pkgbump_core::VersionError,
    },

    /// A patch query did not resolve to exactly one node
    #[error("Expected exactly one \"{section}\" entry for {name}, found {found}")]
    AmbiguousOrMissingNode {
        section: String,
        name: String,
        found: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_failures(failures: &[(String, ResolveError)]) -> String {
    let mut msg = format!("Failed to resolve {} package(s):", failures.len());
    for (name, e) in failures {
        msg.push_str(&format!("\n  {name}: {e}"));
    }
    msg
}
