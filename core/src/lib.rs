pub mod output;
pub mod selection;
pub mod types;
pub mod version;

// Re-export commonly used types at crate root
pub use output::TableRenderer;
pub use selection::Selection;
pub use types::{EntryState, ReportRow, UpdateSeverity};
pub use version::{Operator, Specifier, Version, VersionError};
