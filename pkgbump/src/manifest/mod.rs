pub mod tree;

pub use tree::{DependencyQuery, Node, NodeKind, Span, SyntaxTree};

use crate::error::{Error, Result};
use pkgbump_core::{EntryState, ReportRow, Specifier, UpdateSeverity, Version};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Dependency sections, in the order the inventory is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Dependencies,
    OptionalDependencies,
    PeerDependencies,
    DevDependencies,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Dependencies,
        Section::OptionalDependencies,
        Section::PeerDependencies,
        Section::DevDependencies,
    ];

    /// Key of the section in package.json
    pub fn key(self) -> &'static str {
        match self {
            Section::Dependencies => "dependencies",
            Section::OptionalDependencies => "optionalDependencies",
            Section::PeerDependencies => "peerDependencies",
            Section::DevDependencies => "devDependencies",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One dependency as declared in one section
#[derive(Debug, Clone)]
pub struct DependencyEntry {
    pub name: String,
    pub section: Section,
    /// Version range exactly as written
    pub original_specifier: String,
    /// Parsed form of `original_specifier`
    pub specifier: Specifier,
    /// Registry resolution target, set after lookup
    pub resolved_version: Option<Version>,
    /// Specifier to write back; equals `original_specifier` unless updated
    pub new_specifier: String,
    pub state: EntryState,
    /// Failure message when `state` is `Error`
    pub error: Option<String>,
}

impl DependencyEntry {
    pub fn new(name: impl Into<String>, section: Section, specifier: impl Into<String>) -> Self {
        let original_specifier = specifier.into();
        Self {
            name: name.into(),
            section,
            specifier: Specifier::parse(&original_specifier),
            new_specifier: original_specifier.clone(),
            original_specifier,
            resolved_version: None,
            state: EntryState::Todo,
            error: None,
        }
    }

    /// Bare version text extracted from the specifier
    pub fn pinned_version(&self) -> Option<&str> {
        self.specifier.raw()
    }

    /// Name as sent to the registry, which is case-insensitive
    pub fn lookup_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn report_row(&self) -> ReportRow {
        let severity = match (self.specifier.pinned(), &self.resolved_version) {
            (Some(from), Some(to)) if self.state == EntryState::Updated => {
                UpdateSeverity::between(from, to)
            }
            _ => None,
        };
        ReportRow {
            name: self.name.clone(),
            section: self.section.key().to_string(),
            old_specifier: self.original_specifier.clone(),
            new_specifier: self.new_specifier.clone(),
            state: self.state,
            severity,
        }
    }
}

/// A parsed manifest, owned by exactly one run
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    /// Ordered by section, then declaration order
    pub entries: Vec<DependencyEntry>,
    pub tree: SyntaxTree,
}

impl ManifestDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        let body = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;
        let Some(root) = value.as_object() else {
            return Err(Error::Parse("manifest root is not an object".to_string()));
        };

        let tree = SyntaxTree::parse(raw)
            .map_err(|e| Error::Parse(format!("{} at byte {}", e.message, e.offset)))?;

        let mut entries = Vec::new();
        for section in Section::ALL {
            let Some(deps) = root.get(section.key()) else {
                continue;
            };
            let Some(deps) = deps.as_object() else {
                tracing::debug!(section = section.key(), "section is not an object, skipping");
                continue;
            };
            for (name, spec) in deps {
                match spec.as_str() {
                    Some(spec) => entries.push(DependencyEntry::new(name.as_str(), section, spec)),
                    None => {
                        tracing::debug!(section = section.key(), name = %name, "non-string specifier, skipping");
                    }
                }
            }
        }

        Ok(Self { entries, tree })
    }

    /// Read and parse the manifest at `path`
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ManifestNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let raw = String::from_utf8(bytes).map_err(|e| Error::Parse(e.to_string()))?;
        Self::parse(&raw)
    }

    /// The document as text, with any patches applied
    pub fn render(&self) -> String {
        self.tree.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"{
  "name": "demo",
  "devDependencies": {
    "typescript": "^5.0.0",
    "left-pad": "1.2.0"
  },
  "dependencies": {
    "left-pad": "^1.2.0",
    "is-odd": "git+https://example/repo.git",
    "express": "~4.18.0"
  },
  "peerDependencies": {
    "react": ">=17"
  },
  "optionalDependencies": {
    "fsevents": "^2.3.0"
  },
  "bundleDependencies": ["left-pad"]
}
"#;

    fn keys(doc: &ManifestDocument) -> Vec<(Section, &str)> {
        doc.entries
            .iter()
            .map(|e| (e.section, e.name.as_str()))
            .collect()
    }

    #[test]
    fn test_inventory_order_is_section_then_declaration() {
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        assert_eq!(
            keys(&doc),
            vec![
                (Section::Dependencies, "left-pad"),
                (Section::Dependencies, "is-odd"),
                (Section::Dependencies, "express"),
                (Section::OptionalDependencies, "fsevents"),
                (Section::PeerDependencies, "react"),
                (Section::DevDependencies, "typescript"),
                (Section::DevDependencies, "left-pad"),
            ]
        );
    }

    #[test]
    fn test_entries_start_as_todo_with_pinned_versions() {
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        let left_pad = &doc.entries[0];
        assert_eq!(left_pad.state, EntryState::Todo);
        assert_eq!(left_pad.original_specifier, "^1.2.0");
        assert_eq!(left_pad.new_specifier, "^1.2.0");
        assert_eq!(left_pad.pinned_version(), Some("1.2.0"));

        let is_odd = &doc.entries[1];
        assert_eq!(is_odd.pinned_version(), None);

        let react = &doc.entries[4];
        assert_eq!(react.pinned_version(), None);
    }

    #[test]
    fn test_non_string_values_are_not_dependencies() {
        let doc = ManifestDocument::parse(
            r#"{"dependencies": {"a": "1.0.0", "b": {"version": "1.0.0"}, "c": 3}, "devDependencies": []}"#,
        )
        .unwrap();
        assert_eq!(keys(&doc), vec![(Section::Dependencies, "a")]);
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        assert!(matches!(
            ManifestDocument::parse("{\"dependencies\": {"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            ManifestDocument::parse("[\"not\", \"an\", \"object\"]"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_render_round_trips_untouched_document() {
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        assert_eq!(doc.render(), MANIFEST);
    }

    #[test]
    fn test_read_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        assert!(matches!(
            ManifestDocument::read(&path),
            Err(Error::ManifestNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_read_non_utf8_manifest_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, b"{\"dependencies\": {\"a\": \"^1.0.0\xff\"}}").unwrap();
        assert!(matches!(ManifestDocument::read(&path), Err(Error::Parse(_))));
    }

    #[test]
    fn test_read_manifest_from_disk() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{MANIFEST}")?;
        file.flush()?;

        let doc = ManifestDocument::read(file.path())?;
        assert_eq!(doc.entries.len(), 7);
        Ok(())
    }

    #[test]
    fn test_report_row_carries_severity_only_when_updated() {
        let mut entry = DependencyEntry::new("left-pad", Section::Dependencies, "^1.2.0");
        entry.resolved_version = Some(Version::parse("2.0.0").unwrap());
        assert_eq!(entry.report_row().severity, None);

        entry.state = EntryState::Updated;
        entry.new_specifier = "^2.0.0".to_string();
        let row = entry.report_row();
        assert_eq!(row.severity, Some(UpdateSeverity::Major));
        assert_eq!(row.section, "dependencies");
        assert_eq!(row.new_specifier, "^2.0.0");
    }
}
