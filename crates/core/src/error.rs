//! Error types for document extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting PDF or PowerPoint content.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// A PDF backend could not open or read the document.
    #[error("PDF error: {0}")]
    PdfError(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Failed to extract content from a page, slide or shape.
    #[error("Text extraction error: {0}")]
    ExtractionError(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (PPTX input, XLSX output).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// The OCR engine could not be run or returned a failure.
    #[error("OCR error: {0}")]
    OcrError(String),

    /// A page could not be rasterized.
    #[error("Render error: {0}")]
    RenderError(String),

    /// The language-model request failed.
    #[error("LLM error: {0}")]
    LlmError(String),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to write the table workbook.
    #[error("Export error: {0}")]
    ExportError(String),
}
