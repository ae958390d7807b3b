//! Secondary backend built on MuPDF structured text.
//!
//! Pages are read into [`TextBlock`]s when the document is opened; the
//! block geometry drives column-aware ordering and table detection.

use std::path::Path;

use mupdf::{Document, TextPageFlags};

use extract_core::{Error, Result, Table};

use crate::backend::{LoadedPdf, PdfBackend, TextLayout};
use crate::layout::{join_blocks, TextBlock};
use crate::tables::{TableDetector, TextSpan};

#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn LoadedPdf>> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::PdfError("invalid path encoding".into()))?;

        let document = Document::open(path_str).map_err(|e| Error::PdfError(e.to_string()))?;

        let mut pages: Vec<std::result::Result<Vec<TextBlock>, String>> = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| Error::PdfError(e.to_string()))?
        {
            pages.push(page_result.map_err(|e| e.to_string()).and_then(|page| {
                let text_page = page
                    .to_text_page(TextPageFlags::empty())
                    .map_err(|e| e.to_string())?;

                Ok(text_page
                    .blocks()
                    .map(|block| {
                        let bounds = block.bounds();
                        let text = block
                            .lines()
                            .map(|line| {
                                line.chars()
                                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                                    .collect::<String>()
                            })
                            .collect::<Vec<_>>()
                            .join("\n");
                        TextBlock::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1, text)
                    })
                    .collect())
            }));
        }

        log::debug!("mupdf opened {} ({} pages)", path.display(), pages.len());
        Ok(Box::new(MupdfDocument {
            pages,
            detector: TableDetector::default(),
        }))
    }
}

struct MupdfDocument {
    /// Blocks per page, or the error that prevented reading the page.
    pages: Vec<std::result::Result<Vec<TextBlock>, String>>,
    detector: TableDetector,
}

impl MupdfDocument {
    fn blocks(&self, index: usize) -> Result<&[TextBlock]> {
        match self.pages.get(index) {
            Some(Ok(blocks)) => Ok(blocks),
            Some(Err(e)) => Err(Error::ExtractionError(e.clone())),
            None => Err(Error::ExtractionError(format!(
                "page index {} out of range",
                index
            ))),
        }
    }
}

impl LoadedPdf for MupdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize, layout: TextLayout) -> Result<String> {
        Ok(join_blocks(self.blocks(index)?, layout))
    }

    fn page_tables(&self, index: usize) -> Result<Vec<Table>> {
        let spans: Vec<TextSpan> = self
            .blocks(index)?
            .iter()
            .map(|b| TextSpan {
                x0: b.x0,
                x1: b.x1,
                y: b.y0,
                text: b.text.replace('\n', " "),
            })
            .collect();
        Ok(self.detector.detect(&spans))
    }
}
