//! PDF text and table extraction.
//!
//! [`PdfExtractor`] runs a full pass with `lopdf`, falls back to a MuPDF
//! pass when the document yields no text, and OCRs pages that have no
//! native text.

pub mod backend;
pub mod extractor;
pub mod layout;
pub mod lopdf_backend;
pub mod mupdf_backend;
pub mod render;
pub mod tables;

pub use backend::{LoadedPdf, PdfBackend, TextLayout};
pub use extractor::{PdfExtractor, PdfOptions};
pub use lopdf_backend::LopdfBackend;
pub use mupdf_backend::MupdfBackend;
pub use render::{PageRasterizer, PdftoppmRasterizer, RenderedPage, DEFAULT_DPI};
pub use tables::{TableDetector, TableDetectorConfig, TextSpan};
