use crate::error::{Error, Result};
use crate::manifest::{DependencyEntry, DependencyQuery, Span, SyntaxTree};
use pkgbump_core::{EntryState, VersionError};
use pkgbump_core::version::substitute;

/// A validated replacement, not yet applied
struct Patch {
    span: Span,
    text: String,
}

pub struct ManifestPatcher;

impl ManifestPatcher {
    /// Rewrite the specifier of every `updated` entry and return how many
    /// were replaced.
    ///
    /// Each entry must match exactly one string node in its own section.
    /// All entries are checked before the first edit, so on error the tree
    /// is untouched.
    pub fn apply(tree: &mut SyntaxTree, entries: &[DependencyEntry]) -> Result<usize> {
        let patches = entries
            .iter()
            .filter(|e| e.state == EntryState::Updated)
            .map(|entry| Self::plan(tree, entry))
            .collect::<Result<Vec<_>>>()?;

        let count = patches.len();
        for patch in patches {
            tree.replace(patch.span, patch.text);
        }
        Ok(count)
    }

    fn plan(tree: &SyntaxTree, entry: &DependencyEntry) -> Result<Patch> {
        let section = entry.section.key();
        let substitution_error = |source: VersionError| Error::Substitution {
            name: entry.name.clone(),
            source,
        };

        let (Some(pinned), Some(resolved)) = (entry.pinned_version(), &entry.resolved_version)
        else {
            return Err(Error::AmbiguousOrMissingNode {
                section: section.to_string(),
                name: entry.name.clone(),
                found: 0,
            });
        };
        let resolved = resolved.to_string();
        let new_specifier =
            substitute(&entry.original_specifier, pinned, &resolved).map_err(substitution_error)?;

        let nodes = tree.select(DependencyQuery {
            section,
            name: &entry.name,
        });
        let [node] = nodes.as_slice() else {
            return Err(Error::AmbiguousOrMissingNode {
                section: section.to_string(),
                name: entry.name.clone(),
                found: nodes.len(),
            });
        };

        // Edit just the version digits when the literal is written without
        // escapes; otherwise re-encode the whole string token.
        let token = &tree.source()[node.span.clone()];
        let inner = &token[1..token.len() - 1];
        let patch = match inner.find(pinned) {
            Some(offset) if inner == entry.original_specifier => {
                let start = node.span.start + 1 + offset;
                Patch {
                    span: start..start + pinned.len(),
                    text: resolved,
                }
            }
            _ => Patch {
                span: node.span.clone(),
                text: serde_json::Value::String(new_specifier).to_string(),
            },
        };

        tracing::debug!(
            package = %entry.name,
            section,
            span = ?patch.span,
            "patching specifier"
        );
        Ok(patch)
    }
}
