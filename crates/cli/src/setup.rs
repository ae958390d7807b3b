//! Interactive setup of `.docextract.toml`.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use extract_cli::{ask, confirm, init_logging};
use extract_core::config::LOCAL_CONFIG_FILE;
use extract_core::{ConfigFile, LlmConfig, OcrConfig};

/// Write a .docextract.toml with an API key and tesseract location.
#[derive(Parser, Debug)]
#[command(name = "extract-setup")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    writeln!(output, "{}", "=".repeat(60))?;
    writeln!(output, "Document extractor setup")?;
    writeln!(output, "{}", "=".repeat(60))?;

    let path = Path::new(LOCAL_CONFIG_FILE);
    if path.exists()
        && !confirm(&mut input, &mut output, &format!("\n{} already exists. Overwrite?", LOCAL_CONFIG_FILE))?
    {
        writeln!(output, "Setup cancelled.")?;
        return Ok(());
    }

    let Some(config) = collect(&mut input, &mut output)? else {
        writeln!(output, "Setup cancelled.")?;
        return Ok(());
    };

    config
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(output, "\nConfiguration saved to {}", path.display())?;
    writeln!(output, "Keep this file out of version control.")?;
    Ok(())
}

/// Ask for the settings. `None` means the user backed out.
fn collect<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<ConfigFile>> {
    writeln!(output, "\nAn OpenAI API key enables LLM formatting of slide text.")?;
    writeln!(output, "Get one from https://platform.openai.com/api-keys")?;
    let api_key = ask(input, output, "\nOpenAI API key (leave empty to skip): ")?;

    if !api_key.is_empty()
        && !api_key.starts_with("sk-")
        && !confirm(input, output, "Warning: API key doesn't start with 'sk-'. Continue anyway?")?
    {
        return Ok(None);
    }

    let tesseract = ask(
        input,
        output,
        "Tesseract executable path (leave empty to auto-detect): ",
    )?;

    Ok(Some(build_config(api_key, tesseract)))
}

fn build_config(api_key: String, tesseract: String) -> ConfigFile {
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    let api_key = non_empty(api_key);
    let tesseract_path = non_empty(tesseract);

    ConfigFile {
        ocr: tesseract_path.map(|path| OcrConfig {
            tesseract_path: Some(path),
            dpi: None,
        }),
        llm: api_key.map(|key| LlmConfig {
            api_key: Some(key),
            ..LlmConfig::default()
        }),
    }
}
