//! Domain types for representing extracted document content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How the text of a page or slide was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Text objects read directly from the document.
    #[default]
    Native,
    /// Text recognized from a rasterized image.
    Ocr,
    /// Both native text and OCR output contributed (slides only).
    Mixed,
}

impl ExtractionMethod {
    /// Pick the method for a unit given which sources produced text.
    pub fn from_sources(native: bool, ocr: bool) -> Self {
        match (native, ocr) {
            (true, true) => Self::Mixed,
            (false, true) => Self::Ocr,
            _ => Self::Native,
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Ocr => f.write_str("ocr"),
            Self::Mixed => f.write_str("native+ocr"),
        }
    }
}

/// A table as an ordered list of rows of cell strings.
///
/// Rows may have different lengths; consumers treat missing cells as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in top-to-bottom order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// A table without rows carries no content and is discarded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl From<Vec<Vec<String>>> for Table {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

/// A single extracted PDF page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number.
    pub number: usize,

    /// Extracted text (native or OCR).
    pub text: String,

    /// Non-empty tables detected on the page.
    pub tables: Vec<Table>,

    /// Which path produced the text.
    pub method: ExtractionMethod,

    /// Whether OCR ran for this page.
    pub ocr_used: bool,
}

impl PageRecord {
    /// Create an empty page record with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

/// An image embedded in a slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageBlob {
    /// Package part the image was loaded from (e.g. `ppt/media/image1.png`).
    pub part_name: String,

    /// Raw image bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ImageBlob {
    /// File extension of the image part, lowercased.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.part_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

/// A single extracted slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub number: usize,

    /// Concatenated text of the slide's shapes.
    pub text: String,

    /// Non-empty tables found on the slide.
    pub tables: Vec<Table>,

    /// Speaker notes text.
    pub notes: String,

    /// Images found on the slide.
    pub images: Vec<ImageBlob>,

    /// Which sources produced the text.
    pub method: ExtractionMethod,

    /// Whether OCR produced text for any picture on the slide.
    pub ocr_used: bool,

    /// Whether the text was rewritten by the language model.
    pub llm_formatted: bool,
}

impl SlideRecord {
    /// Create an empty slide record with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

/// Common view over page and slide records.
pub trait UnitRecord {
    /// 1-based unit number.
    fn number(&self) -> usize;

    /// Extracted text.
    fn text(&self) -> &str;

    /// Tables found in the unit.
    fn tables(&self) -> &[Table];
}

impl UnitRecord for PageRecord {
    fn number(&self) -> usize {
        self.number
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tables(&self) -> &[Table] {
        &self.tables
    }
}

impl UnitRecord for SlideRecord {
    fn number(&self) -> usize {
        self.number
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tables(&self) -> &[Table] {
        &self.tables
    }
}

/// Result of one extraction run over a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult<U> {
    /// Path of the source document.
    pub file_path: PathBuf,

    /// Processed pages or slides, in processing order.
    pub units: Vec<U>,

    /// Number of pages or slides in the document.
    pub total_units: usize,

    /// Backend or format that produced the result.
    pub method: String,

    /// Number of non-empty tables across all units.
    pub tables_found: usize,

    /// Unit-level failures encountered along the way.
    pub errors: Vec<String>,
}

/// Result of a PDF extraction.
pub type PdfExtraction = ExtractionResult<PageRecord>;

/// Result of a presentation extraction.
pub type SlideExtraction = ExtractionResult<SlideRecord>;

impl<U: UnitRecord> ExtractionResult<U> {
    /// Create an empty result for the given file.
    pub fn new(file_path: impl Into<PathBuf>, method: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            units: Vec::new(),
            total_units: 0,
            method: method.into(),
            tables_found: 0,
            errors: Vec::new(),
        }
    }

    /// Append a unit, adding its tables to the running count.
    pub fn push_unit(&mut self, unit: U) {
        self.tables_found += unit.tables().len();
        self.units.push(unit);
    }

    /// Record a unit-level failure.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Number of units actually processed.
    pub fn units_processed(&self) -> usize {
        self.units.len()
    }

    /// Whether any unit carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.units.iter().any(|u| !u.text().trim().is_empty())
    }
}
