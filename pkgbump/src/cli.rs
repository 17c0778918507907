use crate::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_MANIFEST, Mode};
use crate::error::Result;
use crate::npmrc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bump outdated npm dependencies in package.json
#[derive(Parser, Debug, Clone)]
#[command(name = "pkgbump")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Only check packages matching these globs; prefix with ! to exclude
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Manifest to update
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Maximum concurrent registry requests
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Upgrade to the greatest published version instead of the latest tag
    #[arg(short, long)]
    pub greatest: bool,

    /// Show what would change without writing the manifest
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Include dependencies that are already up to date
    #[arg(short, long)]
    pub all: bool,

    /// Default registry URL (overrides .npmrc)
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Directory holding the manifest, where a project `.npmrc` may live
    pub fn project_dir(&self) -> &Path {
        match self.file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Build and validate the run configuration
    pub fn to_config(&self) -> Result<Config> {
        let mut registry = npmrc::load(self.project_dir())?;
        if let Some(url) = &self.registry {
            registry.set_default_registry(url);
        }

        let config = Config {
            manifest_path: self.file.clone(),
            patterns: self.patterns.clone(),
            concurrency: self.concurrency,
            mode: if self.greatest {
                Mode::Greatest
            } else {
                Mode::Latest
            },
            dry_run: self.dry_run,
            show_all: self.all,
            timeout: Duration::from_secs(self.timeout),
            registry,
        };
        config.validate()?;
        Ok(config)
    }
}
