//! PDF backend abstraction.
//!
//! The extractor only talks to [`PdfBackend`] and [`LoadedPdf`], so the
//! concrete parsing libraries stay behind this seam and tests can swap in
//! in-memory documents.

use std::path::Path;

use extract_core::{Result, Table};

/// How text blocks of a page are ordered before joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextLayout {
    /// Content-stream order as reported by the backend.
    Plain,
    /// Blocks sorted top-to-bottom, then left-to-right.
    #[default]
    ColumnAware,
}

/// A PDF parsing library able to open documents.
pub trait PdfBackend {
    /// Short name, used as the extraction method tag.
    fn name(&self) -> &'static str;

    /// Open a document.
    fn open(&self, path: &Path) -> Result<Box<dyn LoadedPdf>>;
}

/// An opened document. Page indices are 0-based.
pub trait LoadedPdf {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of a page. Backends without geometry ignore `layout`.
    fn page_text(&self, index: usize, layout: TextLayout) -> Result<String>;

    /// Tables detected on a page.
    fn page_tables(&self, index: usize) -> Result<Vec<Table>>;
}
