pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod npm;
pub mod npmrc;
pub mod patcher;
pub mod planner;
pub mod resolver;

pub use config::{Config, Credential, Mode, RegistryConfig};
pub use error::{Error, ResolveError, Result};
pub use manifest::{DependencyEntry, ManifestDocument, Section};
pub use pkgbump_core::{EntryState, ReportRow, Selection, TableRenderer, UpdateSeverity, Version};

use npm::NpmClient;
use patcher::ManifestPatcher;
use planner::UpdatePlanner;
use resolver::{Resolutions, VersionResolver};
use serde::Serialize;
use std::fs;

/// What one run found and did
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Report rows: `updated` entries, or every considered entry with
    /// `show_all`
    pub rows: Vec<ReportRow>,
    /// Whether any entry reached `updated`
    pub has_updates: bool,
    /// Whether the manifest was rewritten
    pub written: bool,
    pub dry_run: bool,
}

/// Check and update the manifest described by `config`
pub async fn run(config: &Config) -> Result<RunOutcome> {
    run_with_progress(config, |_, _| {}).await
}

/// Like [`run`], reporting `(completed, total)` registry lookups to
/// `progress`
pub async fn run_with_progress<P>(config: &Config, progress: P) -> Result<RunOutcome>
where
    P: Fn(usize, usize) + Send + Sync + 'static,
{
    config.validate()?;
    let planner = UpdatePlanner::new(config.selection()?);

    let mut document = ManifestDocument::read(&config.manifest_path)?;
    planner.classify(&mut document.entries);

    let names = UpdatePlanner::lookups(&document.entries);
    tracing::info!(
        manifest = %config.manifest_path.display(),
        entries = document.entries.len(),
        lookups = names.len(),
        mode = ?config.mode,
        "checking dependencies"
    );

    let resolutions = if names.is_empty() {
        Resolutions::new()
    } else {
        let client = NpmClient::new(config.registry.clone(), config.mode, config.timeout)?;
        VersionResolver::new(client, config.concurrency)
            .resolve_all(&names, progress)
            .await
    };

    let has_updates = planner.merge(&mut document.entries, resolutions)?;
    let replaced = ManifestPatcher::apply(&mut document.tree, &document.entries)?;

    let written = replaced > 0 && !config.dry_run;
    if written {
        fs::write(&config.manifest_path, document.render())?;
        tracing::info!(
            manifest = %config.manifest_path.display(),
            replaced,
            "manifest updated"
        );
    } else if replaced > 0 {
        tracing::info!(replaced, "dry run, manifest left unchanged");
    }

    let rows = document
        .entries
        .iter()
        .filter(|e| match e.state {
            EntryState::Updated => true,
            EntryState::Ignored => false,
            _ => config.show_all,
        })
        .map(DependencyEntry::report_row)
        .collect();

    Ok(RunOutcome {
        rows,
        has_updates,
        written,
        dry_run: config.dry_run,
    })
}
