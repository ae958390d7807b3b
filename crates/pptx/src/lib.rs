//! PowerPoint (PPTX) extraction.
//!
//! PPTX files are ZIP archives of XML parts. [`PresentationExtractor`] walks
//! the shape tree of each selected slide, OCRs embedded pictures, optionally
//! rewrites slide text through a chat-completion model, and
//! [`TableExporter`] writes the slide tables to an XLSX workbook.

pub mod extractor;
pub mod llm;
pub mod parser;
pub mod selection;
pub mod shapes;
pub mod xlsx;

#[cfg(test)]
mod fixture;

pub use extractor::{PptxOptions, PresentationExtractor};
pub use llm::{ChatCompletionFormatter, ChatSettings, TextFormatter};
pub use parser::{PptxPackage, Relationship};
pub use selection::{parse_slide_list, prompt_slide_selection, resolve_selection};
pub use shapes::{parse_shapes, Shape};
pub use xlsx::{sanitize_sheet_name, table_sheet_name, TableExporter, WorkbookWriter};
