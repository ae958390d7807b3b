//! Extract text and tables from PDF files, with OCR for scanned pages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use extract_cli::{
    default_output, ensure_extension, init_logging, load_settings, ocr_engine, print_summary,
    resolve_dpi,
};
use extract_core::write_report;
use extract_pdf::{PdfExtractor, PdfOptions, PdftoppmRasterizer};

/// Extract text and tables from a PDF, with OCR fallback for scanned pages.
#[derive(Parser, Debug)]
#[command(name = "pdf-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file
    input: PathBuf,

    /// Output text file (default: <name>_extracted.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable OCR for pages without text
    #[arg(long)]
    no_ocr: bool,

    /// Skip table detection
    #[arg(long)]
    no_tables: bool,

    /// Read text in plain content order instead of column-aware order
    #[arg(long)]
    no_multicolumn: bool,

    /// Path to the tesseract executable
    #[arg(long)]
    tesseract_path: Option<PathBuf>,

    /// Rasterization resolution for OCR
    #[arg(long)]
    dpi: Option<u32>,

    /// Config file (default: .docextract.toml, then the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    ensure_extension(&args.input, "pdf")?;
    let config = load_settings(args.config.as_deref())?;
    let dpi = resolve_dpi(args.dpi, &config);

    let options = PdfOptions {
        use_ocr: !args.no_ocr,
        preserve_tables: !args.no_tables,
        multi_column: !args.no_multicolumn,
    };
    let mut extractor =
        PdfExtractor::new(options).with_rasterizer(Box::new(PdftoppmRasterizer::new(dpi)));
    if let Some(engine) = ocr_engine(options.use_ocr, args.tesseract_path.as_deref(), &config) {
        log::debug!("OCR enabled at {} DPI", dpi);
        extractor = extractor.with_recognizer(Box::new(engine));
    }

    let result = extractor
        .extract(&args.input)
        .with_context(|| format!("Failed to extract {}", args.input.display()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "_extracted.txt"));
    write_report(&result, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_summary(&result, "Pages", &[("Output file", output.as_path())]);
    Ok(())
}
