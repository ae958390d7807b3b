//! Plain-text extraction reports.
//!
//! A report is a header block with counts, one section per page or slide,
//! and a trailing error list.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::table::TableFormatter;
use crate::types::{ExtractionResult, PageRecord, SlideRecord, UnitRecord};

const HEADER_RULE_WIDTH: usize = 50;
const SECTION_RULE_WIDTH: usize = 30;

/// A record that knows how to lay itself out in a report.
pub trait ReportUnit: UnitRecord + Sized {
    /// First line of the report.
    const TITLE: &'static str;

    /// Section heading prefix (`PAGE`, `SLIDE`).
    const LABEL: &'static str;

    /// Count lines shown in the header after the method line.
    fn count_lines(result: &ExtractionResult<Self>) -> Vec<String>;

    /// Blocks written after the table block (notes, image counts).
    fn extra_blocks(&self, _out: &mut String) {}
}

impl ReportUnit for PageRecord {
    const TITLE: &'static str = "PDF Text Extraction Results";
    const LABEL: &'static str = "PAGE";

    fn count_lines(result: &ExtractionResult<Self>) -> Vec<String> {
        vec![format!("Total Pages: {}", result.total_units)]
    }
}

impl ReportUnit for SlideRecord {
    const TITLE: &'static str = "PowerPoint Text Extraction Results";
    const LABEL: &'static str = "SLIDE";

    fn count_lines(result: &ExtractionResult<Self>) -> Vec<String> {
        vec![
            format!("Total Slides: {}", result.total_units),
            format!("Slides Processed: {}", result.units_processed()),
        ]
    }

    fn extra_blocks(&self, out: &mut String) {
        if !self.notes.is_empty() {
            out.push_str("NOTES:\n");
            out.push_str(&self.notes);
            out.push_str("\n\n");
        }
        if !self.images.is_empty() {
            out.push_str(&format!("IMAGES FOUND: {}\n\n", self.images.len()));
        }
    }
}

/// Render a full report for an extraction result.
pub fn render_report<U: ReportUnit>(result: &ExtractionResult<U>, formatter: &TableFormatter) -> String {
    let mut out = String::new();

    out.push_str(U::TITLE);
    out.push('\n');
    out.push_str(&format!("File: {}\n", result.file_path.display()));
    out.push_str(&format!("Extraction Method: {}\n", result.method));
    for line in U::count_lines(result) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("Tables Found: {}\n", result.tables_found));
    out.push_str(&"=".repeat(HEADER_RULE_WIDTH));
    out.push_str("\n\n");

    for unit in &result.units {
        out.push_str(&format!("{} {}\n", U::LABEL, unit.number()));
        out.push_str(&"-".repeat(SECTION_RULE_WIDTH));
        out.push('\n');

        if !unit.text().is_empty() {
            out.push_str("TEXT CONTENT:\n");
            out.push_str(unit.text());
            out.push_str("\n\n");
        }

        if !unit.tables().is_empty() {
            out.push_str("TABLES:\n");
            out.push_str(&formatter.format_tables(unit.tables()));
            out.push_str("\n\n");
        }

        unit.extra_blocks(&mut out);
    }

    if !result.errors.is_empty() {
        out.push_str("ERRORS:\n");
        for error in &result.errors {
            out.push_str(&format!("- {}\n", error));
        }
    }

    out
}

/// Render a report and write it to `path`.
pub fn write_report<U: ReportUnit>(result: &ExtractionResult<U>, path: &Path) -> Result<()> {
    let report = render_report(result, &TableFormatter::new());
    fs::write(path, report)?;
    log::info!("Extracted content saved to: {}", path.display());
    Ok(())
}
