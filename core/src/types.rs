use crate::version::Version;
use serde::Serialize;
use std::fmt;

/// Where a dependency entry stands in the update pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Filtered out by the name patterns
    Ignored,
    /// Selected, not yet classified
    Todo,
    /// Specifier is not a simple pinned form
    Skipped,
    /// Waiting for a registry lookup
    Check,
    /// Registry target is not newer
    Kept,
    /// Registry target is newer; the manifest will be rewritten
    Updated,
    /// Lookup or substitution failed
    Error,
}

impl EntryState {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryState::Ignored => "ignored",
            EntryState::Todo => "todo",
            EntryState::Skipped => "skipped",
            EntryState::Check => "check",
            EntryState::Kept => "kept",
            EntryState::Updated => "updated",
            EntryState::Error => "error",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSeverity {
    Major,
    Minor,
    Patch,
}

impl UpdateSeverity {
    /// Classify the jump from `from` to `to`; `None` when `to` is not ahead
    /// on major/minor/patch (pre-release-only bumps count as patch).
    pub fn between(from: &Version, to: &Version) -> Option<Self> {
        if to.major != from.major {
            return (to.major > from.major).then_some(UpdateSeverity::Major);
        }
        if to.minor != from.minor {
            return (to.minor > from.minor).then_some(UpdateSeverity::Minor);
        }
        if to.patch != from.patch {
            return (to.patch > from.patch).then_some(UpdateSeverity::Patch);
        }
        (to.pre != from.pre).then_some(UpdateSeverity::Patch)
    }
}

/// One line of the run report handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub section: String,
    pub old_specifier: String,
    pub new_specifier: String,
    pub state: EntryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<UpdateSeverity>,
}
