//! Shared result model, text normalization, table rendering, reports,
//! configuration and OCR for the PDF and PowerPoint extractors.

pub mod config;
pub mod error;
pub mod normalize;
pub mod ocr;
pub mod report;
pub mod table;
pub mod types;

pub use config::{load_config, load_from_path, ConfigFile, LlmConfig, OcrConfig};
pub use error::{Error, Result};
pub use normalize::{join_sections, TextNormalizer};
pub use ocr::{is_ocr_extension, Recognizer, TesseractEngine};
pub use report::{render_report, write_report, ReportUnit};
pub use table::TableFormatter;
pub use types::{
    ExtractionMethod, ExtractionResult, ImageBlob, PageRecord, PdfExtraction, SlideExtraction,
    SlideRecord, Table, UnitRecord,
};
