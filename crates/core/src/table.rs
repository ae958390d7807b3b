//! Fixed-width text rendering of tables.
//!
//! Each column is as wide as its longest cell; cells are left-justified and
//! joined with a separator. Rows shorter than the widest row are padded with
//! empty cells.

use crate::types::Table;

/// Default column separator.
pub const DEFAULT_SEPARATOR: &str = " | ";

/// Formatter that renders tables as aligned plain text.
#[derive(Debug, Clone)]
pub struct TableFormatter {
    /// String placed between columns.
    separator: String,
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl TableFormatter {
    /// Create a formatter with the default `" | "` separator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of every column, in characters.
    pub fn column_widths(table: &Table) -> Vec<usize> {
        let mut widths = vec![0; table.column_count()];
        for row in &table.rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }
        widths
    }

    /// Render one table as aligned lines, one per row.
    pub fn format_table(&self, table: &Table) -> Vec<String> {
        let widths = Self::column_widths(table);

        table
            .rows
            .iter()
            .map(|row| {
                widths
                    .iter()
                    .enumerate()
                    .map(|(idx, &width)| {
                        let cell = row.get(idx).map(String::as_str).unwrap_or("");
                        format!("{:<width$}", cell, width = width)
                    })
                    .collect::<Vec<_>>()
                    .join(&self.separator)
            })
            .collect()
    }

    /// Render a list of tables, each introduced by a `--- Table i ---` header.
    ///
    /// # Example output
    /// ```text
    ///
    /// --- Table 1 ---
    /// Name  | Qty
    /// Apple | 3
    /// ```
    pub fn format_tables(&self, tables: &[Table]) -> String {
        if tables.is_empty() {
            return String::new();
        }

        let mut lines = Vec::new();
        for (i, table) in tables.iter().enumerate() {
            lines.push(format!("\n--- Table {} ---", i + 1));
            if table.is_empty() {
                lines.push("(Empty table)".to_string());
                continue;
            }
            lines.extend(self.format_table(table));
        }

        lines.join("\n")
    }
}
