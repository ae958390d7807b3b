//! Table detection from positioned text.
//!
//! Spans are grouped into rows by their vertical position. A run of
//! consecutive rows that each have at least `min_columns` cells becomes a
//! table, provided the run is long enough and its cells are short (long
//! cells mean the "columns" are really prose).

use extract_core::Table;

/// A piece of text with a horizontal extent and a vertical position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub x0: f32,
    pub x1: f32,
    pub y: f32,
    pub text: String,
}

/// Tuning knobs for [`TableDetector`].
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum consecutive rows for a table.
    pub min_rows: usize,
    /// Minimum cells in a row for it to count as a table row.
    pub min_columns: usize,
    /// Spans whose `y` differ by at most this much share a row.
    pub y_tolerance: f32,
    /// Maximum average cell length, in characters.
    pub max_avg_cell_chars: usize,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            y_tolerance: 3.0,
            max_avg_cell_chars: 40,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    pub fn new(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Find tables among the spans of one page.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut run: Vec<Vec<String>> = Vec::new();

        for row in self.group_rows(spans) {
            if row.len() >= self.config.min_columns {
                run.push(row);
            } else {
                self.flush_run(&mut run, &mut tables);
            }
        }
        self.flush_run(&mut run, &mut tables);

        tables
    }

    fn group_rows(&self, spans: &[TextSpan]) -> Vec<Vec<String>> {
        let mut sorted: Vec<&TextSpan> = spans.iter().collect();
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x0.total_cmp(&b.x0)));

        let mut rows: Vec<Vec<&TextSpan>> = Vec::new();
        let mut row_y = f32::NEG_INFINITY;
        for span in sorted {
            match rows.last_mut() {
                Some(row) if span.y - row_y <= self.config.y_tolerance => row.push(span),
                _ => {
                    row_y = span.y;
                    rows.push(vec![span]);
                }
            }
        }

        rows.into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
                row.iter()
                    .map(|s| s.text.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .collect()
    }

    fn flush_run(&self, run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
        if run.len() >= self.config.min_rows && self.cells_are_short(run) {
            tables.push(Table::new(std::mem::take(run)));
        } else {
            run.clear();
        }
    }

    fn cells_are_short(&self, rows: &[Vec<String>]) -> bool {
        let (chars, cells) = rows
            .iter()
            .flatten()
            .fold((0usize, 0usize), |(chars, cells), cell| {
                (chars + cell.chars().count(), cells + 1)
            });
        cells > 0 && chars / cells <= self.config.max_avg_cell_chars
    }
}
