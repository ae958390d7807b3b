//! Extract text, notes, image text and tables from PowerPoint files.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use extract_cli::{
    default_output, ensure_extension, init_logging, llm_settings, load_settings, ocr_engine,
    print_summary,
};
use extract_core::{write_report, ConfigFile};
use extract_pptx::{
    prompt_slide_selection, ChatCompletionFormatter, PptxOptions, PresentationExtractor,
    TableExporter,
};

/// Extract text and tables from a PowerPoint (.pptx) presentation.
#[derive(Parser, Debug)]
#[command(name = "pptx-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Output text file (default: <name>_extracted.txt)
    #[arg(short = 'o', long)]
    output_text: Option<PathBuf>,

    /// Output Excel workbook for tables (default: <name>_tables.xlsx)
    #[arg(short = 'e', long)]
    output_excel: Option<PathBuf>,

    /// Slide numbers to extract, 1-based (default: all)
    #[arg(long, num_args = 1..)]
    slides: Option<Vec<usize>>,

    /// Choose slides interactively
    #[arg(long)]
    interactive: bool,

    /// Disable OCR on images
    #[arg(long)]
    no_ocr: bool,

    /// Disable LLM formatting
    #[arg(long)]
    no_llm: bool,

    /// Path to the tesseract executable
    #[arg(long)]
    tesseract_path: Option<PathBuf>,

    /// OpenAI API key (default: OPENAI_API_KEY, then the config file)
    #[arg(long)]
    openai_key: Option<String>,

    /// Chat model used for formatting
    #[arg(long)]
    model: Option<String>,

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

    ensure_extension(&args.input, "pptx")?;
    let config = load_settings(args.config.as_deref())?;
    let extractor = build_extractor(&args, &config)?;

    let mut slides = args.slides.clone();
    if args.interactive && slides.is_none() {
        let total = extractor
            .slide_count(&args.input)
            .with_context(|| format!("Failed to open {}", args.input.display()))?;
        let stdin = io::stdin();
        slides = prompt_slide_selection(&mut stdin.lock(), &mut io::stdout(), total)?;
    }

    let result = extractor
        .extract(&args.input, slides.as_deref())
        .with_context(|| format!("Failed to extract {}", args.input.display()))?;

    let text_path = args
        .output_text
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "_extracted.txt"));
    write_report(&result, &text_path)
        .with_context(|| format!("Failed to write {}", text_path.display()))?;

    let excel_path = args
        .output_excel
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "_tables.xlsx"));
    let sheets = TableExporter::export(&result, &excel_path)
        .with_context(|| format!("Failed to write {}", excel_path.display()))?;

    let mut outputs = vec![("Text output", text_path.as_path())];
    if sheets > 0 {
        outputs.push(("Excel output", excel_path.as_path()));
    }
    print_summary(&result, "Slides", &outputs);
    Ok(())
}

fn build_extractor(args: &Args, config: &ConfigFile) -> Result<PresentationExtractor> {
    let options = PptxOptions {
        use_ocr: !args.no_ocr,
        use_llm: !args.no_llm,
    };
    let mut extractor = PresentationExtractor::new(options);

    let llm = llm_settings(
        options.use_llm,
        args.openai_key.as_deref(),
        args.model.as_deref(),
        config,
    );
    if let Some((key, settings)) = llm {
        log::debug!("Using API key from {}", key.source);
        let formatter = ChatCompletionFormatter::new(key.value, settings)?;
        log::info!("LLM formatting enabled (model {})", formatter.settings().model);
        extractor = extractor.with_formatter(Box::new(formatter));
    }

    if let Some(engine) = ocr_engine(options.use_ocr, args.tesseract_path.as_deref(), config) {
        extractor = extractor.with_recognizer(Box::new(engine));
    }

    Ok(extractor)
}
