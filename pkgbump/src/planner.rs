use crate::error::{Error, ResolveError, Result};
use crate::manifest::DependencyEntry;
use crate::resolver::Resolutions;
use pkgbump_core::version::{precedence, substitute};
use pkgbump_core::{EntryState, Selection, Version};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Moves entries `todo -> ignored | skipped | check` before lookup and
/// `check -> kept | updated | error` once every lookup has finished
pub struct UpdatePlanner {
    selection: Selection,
}

impl UpdatePlanner {
    pub fn new(selection: Selection) -> Self {
        Self { selection }
    }

    /// Apply the name selection, then sort selected entries into those that
    /// need a lookup and those whose specifier cannot be bumped.
    pub fn classify(&self, entries: &mut [DependencyEntry]) {
        for entry in entries.iter_mut() {
            if entry.state != EntryState::Todo {
                continue;
            }
            entry.state = if !self.selection.is_selected(&entry.name) {
                EntryState::Ignored
            } else if entry.specifier.pinned().is_some() {
                EntryState::Check
            } else {
                tracing::debug!(
                    package = %entry.name,
                    specifier = %entry.original_specifier,
                    "specifier is not a pinned version, skipping"
                );
                EntryState::Skipped
            };
        }
    }

    /// Unique registry names of every entry waiting for a lookup, sorted
    pub fn lookups(entries: &[DependencyEntry]) -> Vec<String> {
        entries
            .iter()
            .filter(|e| e.state == EntryState::Check)
            .map(DependencyEntry::lookup_name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Settle every `check` entry from the finished lookups.
    ///
    /// Returns whether anything reached `updated`. Any failed lookup or
    /// failed substitution is returned as an error after all entries have
    /// been settled, so the inventory still shows which entries failed.
    pub fn merge(&self, entries: &mut [DependencyEntry], resolutions: Resolutions) -> Result<bool> {
        let mut resolved: HashMap<String, Version> = HashMap::new();
        let mut failures: Vec<(String, ResolveError)> = Vec::new();
        for (name, result) in resolutions {
            match result {
                Ok(version) => {
                    resolved.insert(name, version);
                }
                Err(e) => failures.push((name, e)),
            }
        }
        for name in Self::lookups(entries) {
            if !resolved.contains_key(&name) && !failures.iter().any(|(n, _)| *n == name) {
                failures.push((name, ResolveError::Network("no lookup result".to_string())));
            }
        }
        failures.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut substitution_error = None;
        let mut has_updates = false;

        for entry in entries.iter_mut() {
            if entry.state != EntryState::Check {
                continue;
            }
            let name = entry.lookup_name();

            let Some(target) = resolved.get(&name) else {
                entry.state = EntryState::Error;
                entry.error = failures
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, e)| e.to_string());
                continue;
            };
            entry.resolved_version = Some(target.clone());

            let (Some(pinned), Some(raw)) = (entry.specifier.pinned(), entry.specifier.raw())
            else {
                entry.state = EntryState::Skipped;
                continue;
            };

            if precedence(target, pinned) != Ordering::Greater {
                entry.state = EntryState::Kept;
                continue;
            }

            match substitute(&entry.original_specifier, raw, &target.to_string()) {
                Ok(new_specifier) => {
                    tracing::debug!(
                        package = %entry.name,
                        section = %entry.section,
                        from = %entry.original_specifier,
                        to = %new_specifier,
                        "update available"
                    );
                    entry.new_specifier = new_specifier;
                    entry.state = EntryState::Updated;
                    has_updates = true;
                }
                Err(source) => {
                    entry.state = EntryState::Error;
                    entry.error = Some(source.to_string());
                    substitution_error.get_or_insert(Error::Substitution {
                        name: entry.name.clone(),
                        source,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::Resolution(failures));
        }
        if let Some(e) = substitution_error {
            return Err(e);
        }
        Ok(has_updates)
    }
}
