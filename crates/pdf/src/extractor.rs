//! Two-pass PDF extraction.
//!
//! The primary backend runs over every page. When no page yields text the
//! whole document is processed again with the secondary backend and that
//! result replaces the first one.

use std::path::Path;

use extract_core::{
    ConfigFile, Error, ExtractionMethod, PageRecord, PdfExtraction, Recognizer, Result,
    TesseractEngine, TextNormalizer,
};

use crate::backend::{LoadedPdf, PdfBackend, TextLayout};
use crate::lopdf_backend::LopdfBackend;
use crate::mupdf_backend::MupdfBackend;
use crate::render::{PageRasterizer, PdftoppmRasterizer};

/// Options for a PDF extraction run.
#[derive(Debug, Clone, Copy)]
pub struct PdfOptions {
    /// Run OCR on pages without native text.
    pub use_ocr: bool,
    /// Detect tables on every page.
    pub preserve_tables: bool,
    /// Order text blocks top-to-bottom, left-to-right.
    pub multi_column: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            use_ocr: true,
            preserve_tables: true,
            multi_column: true,
        }
    }
}

/// PDF extractor with a primary and a secondary backend.
pub struct PdfExtractor {
    primary: Box<dyn PdfBackend>,
    secondary: Box<dyn PdfBackend>,
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn Recognizer>,
    normalizer: TextNormalizer,
    options: PdfOptions,
}

impl PdfExtractor {
    /// Extractor using lopdf, then MuPDF, with pdftoppm and tesseract for OCR.
    pub fn new(options: PdfOptions) -> Self {
        Self {
            primary: Box::new(LopdfBackend::new()),
            secondary: Box::new(MupdfBackend::new()),
            rasterizer: Box::new(PdftoppmRasterizer::default()),
            recognizer: Box::new(TesseractEngine::new(None, ConfigFile::default())),
            normalizer: TextNormalizer::new(),
            options,
        }
    }

    pub fn with_backends(mut self, primary: Box<dyn PdfBackend>, secondary: Box<dyn PdfBackend>) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Extract text and tables from every page of a PDF.
    ///
    /// Fails only when the file is missing or neither backend can open it;
    /// page-level problems end up in the result's error list.
    pub fn extract(&self, path: &Path) -> Result<PdfExtraction> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let mut open_errors = Vec::new();

        let primary = match self.run_pass(self.primary.as_ref(), path, &mut open_errors) {
            Some(result) if result.has_text() => return Ok(with_open_errors(result, open_errors)),
            other => other,
        };

        log::info!(
            "No text found with {}, retrying with {}",
            self.primary.name(),
            self.secondary.name()
        );

        match (self.run_pass(self.secondary.as_ref(), path, &mut open_errors), primary) {
            (Some(result), _) | (None, Some(result)) => Ok(with_open_errors(result, open_errors)),
            (None, None) => Err(Error::PdfError(open_errors.join("; "))),
        }
    }

    /// One full pass with a backend. `None` when the document can't be opened.
    fn run_pass(
        &self,
        backend: &dyn PdfBackend,
        path: &Path,
        open_errors: &mut Vec<String>,
    ) -> Option<PdfExtraction> {
        let doc = match backend.open(path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("{} could not open {}: {}", backend.name(), path.display(), e);
                open_errors.push(format!("{} could not open document: {}", backend.name(), e));
                return None;
            }
        };

        let mut result = PdfExtraction::new(path, backend.name());
        result.total_units = doc.page_count();
        log::info!("Processing {} pages with {}", result.total_units, backend.name());

        for index in 0..doc.page_count() {
            let page = self.process_page(doc.as_ref(), path, index, &mut result.errors);
            result.push_unit(page);
        }

        Some(result)
    }

    fn process_page(
        &self,
        doc: &dyn LoadedPdf,
        path: &Path,
        index: usize,
        errors: &mut Vec<String>,
    ) -> PageRecord {
        let number = index + 1;
        let mut page = PageRecord::new(number);

        let layout = if self.options.multi_column {
            TextLayout::ColumnAware
        } else {
            TextLayout::Plain
        };

        match doc.page_text(index, layout) {
            Ok(text) => page.text = self.normalizer.clean(&text),
            Err(e) => {
                log::warn!("Text extraction failed on page {}: {}", number, e);
                errors.push(format!("Text extraction failed on page {}: {}", number, e));
            }
        }

        if page.text.trim().is_empty() && self.options.use_ocr {
            match self.ocr_page(path, number) {
                Ok(text) => {
                    page.text = text;
                    page.method = ExtractionMethod::Ocr;
                    page.ocr_used = true;
                }
                Err(message) => {
                    log::warn!("{}", message);
                    errors.push(message);
                }
            }
        }

        if self.options.preserve_tables {
            match doc.page_tables(index) {
                Ok(tables) => page.tables = tables.into_iter().filter(|t| !t.is_empty()).collect(),
                Err(e) => {
                    log::warn!("Table extraction failed on page {}: {}", number, e);
                    errors.push(format!("Table extraction failed on page {}: {}", number, e));
                }
            }
        }

        log::debug!(
            "Page {}: {} chars, {} tables, method {}",
            number,
            page.text.len(),
            page.tables.len(),
            page.method
        );
        page
    }

    fn ocr_page(&self, path: &Path, number: usize) -> std::result::Result<String, String> {
        let rendered = self
            .rasterizer
            .render(path, number)
            .map_err(|e| format!("Rasterization failed on page {}: {}", number, e))?;

        self.recognizer
            .recognize_file(&rendered.path)
            .map_err(|e| format!("OCR failed on page {}: {}", number, e))
    }
}

/// Put errors from backends that failed to open ahead of the pass errors.
fn with_open_errors(mut result: PdfExtraction, mut open_errors: Vec<String>) -> PdfExtraction {
    open_errors.append(&mut result.errors);
    result.errors = open_errors;
    result
}
