use crate::types::{EntryState, ReportRow, UpdateSeverity};
use colored::Colorize;

/// Renders the run report in a table format
pub struct TableRenderer {
    show_colors: bool,
}

impl TableRenderer {
    pub fn new(show_colors: bool) -> Self {
        Self { show_colors }
    }

    /// Render report rows; an empty report means nothing was updated
    pub fn render(&self, rows: &[ReportRow]) {
        if rows.is_empty() {
            println!("All dependencies are up to date!");
            return;
        }

        let (max_name, max_from, max_to) = Self::column_widths(rows);
        for row in rows {
            println!("{}", self.format_row(row, max_name, max_from, max_to));
        }
    }

    /// Widest name, old and new specifier, counted in chars to match `format!` padding
    pub fn column_widths(rows: &[ReportRow]) -> (usize, usize, usize) {
        let name = rows.iter().map(|r| r.name.chars().count()).max();
        let from = rows.iter().map(|r| r.old_specifier.chars().count()).max();
        let to = rows.iter().map(|r| r.new_specifier.chars().count()).max();
        (name.unwrap_or(0), from.unwrap_or(0), to.unwrap_or(0))
    }

    /// Format one row: `name  old → new  section [state]`
    pub fn format_row(
        &self,
        row: &ReportRow,
        name_width: usize,
        from_width: usize,
        to_width: usize,
    ) -> String {
        let to = format!("{:<to_width$}", row.new_specifier);
        let to = if row.state == EntryState::Updated {
            self.colorize_severity(&to, row.severity)
        } else {
            to
        };

        let state = if row.state == EntryState::Updated {
            String::new()
        } else if self.show_colors {
            format!("  [{}]", row.state).dimmed().to_string()
        } else {
            format!("  [{}]", row.state)
        };

        format!(
            "  {:<name_width$}  {:>from_width$} → {to}  {}{state}",
            row.name, row.old_specifier, row.section,
        )
    }

    /// Color a string by update severity (no-op without colors)
    pub fn colorize_severity(&self, text: &str, severity: Option<UpdateSeverity>) -> String {
        if !self.show_colors {
            return text.to_string();
        }
        match severity {
            Some(UpdateSeverity::Major) => text.red().to_string(),
            Some(UpdateSeverity::Minor) => text.yellow().to_string(),
            Some(UpdateSeverity::Patch) => text.green().to_string(),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: EntryState) -> ReportRow {
        ReportRow {
            name: "left-pad".to_string(),
            section: "dependencies".to_string(),
            old_specifier: "^1.2.0".to_string(),
            new_specifier: "^1.3.0".to_string(),
            state,
            severity: Some(UpdateSeverity::Minor),
        }
    }

    #[test]
    fn test_format_updated_row() {
        let renderer = TableRenderer::new(false);
        let line = renderer.format_row(&row(EntryState::Updated), 10, 6, 6);
        assert_eq!(line, "  left-pad    ^1.2.0 → ^1.3.0  dependencies");
    }

    #[test]
    fn test_format_other_states_show_state() {
        let renderer = TableRenderer::new(false);
        let line = renderer.format_row(&row(EntryState::Skipped), 8, 6, 6);
        assert!(line.ends_with("dependencies  [skipped]"), "{line}");
    }

    #[test]
    fn test_non_ascii_names_stay_aligned() {
        let renderer = TableRenderer::new(false);
        let mut wide = row(EntryState::Updated);
        wide.name = "pâté-utils".to_string();
        let rows = vec![wide, row(EntryState::Updated)];

        let (name, from, to) = TableRenderer::column_widths(&rows);
        assert_eq!(name, 10);

        let arrows: Vec<usize> = rows
            .iter()
            .map(|r| {
                let line = renderer.format_row(r, name, from, to);
                line.chars().position(|c| c == '→').unwrap()
            })
            .collect();
        assert_eq!(arrows[0], arrows[1]);
    }
}
