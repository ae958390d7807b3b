//! Helpers shared by the `pdf-extract`, `pptx-extract` and `extract-setup`
//! binaries.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use extract_core::config::{resolve_api_key, Resolved};
use extract_core::{
    load_config, load_from_path, ConfigFile, Error, ExtractionResult, TesseractEngine, UnitRecord,
};
use extract_pdf::DEFAULT_DPI;
use extract_pptx::ChatSettings;

/// Initialize logging. `RUST_LOG` wins over the default filter.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Load the config from an explicit path, or cascade the usual locations.
pub fn load_settings(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(load_config()),
    }
}

/// Reject inputs whose extension is not `expected` (case-insensitive).
pub fn ensure_extension(path: &Path, expected: &str) -> extract_core::Result<()> {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(expected));
    if matches {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(format!(
            "{} (expected a .{} file)",
            path.display(),
            expected
        )))
    }
}

/// Rasterization DPI: `--dpi`, then `[ocr] dpi`, then the default.
pub fn resolve_dpi(explicit: Option<u32>, config: &ConfigFile) -> u32 {
    explicit.or(config.dpi()).unwrap_or(DEFAULT_DPI)
}

/// Tesseract engine for image OCR, unless OCR is switched off.
pub fn ocr_engine(enabled: bool, explicit: Option<&Path>, config: &ConfigFile) -> Option<TesseractEngine> {
    enabled.then(|| TesseractEngine::new(explicit.map(Path::to_path_buf), config.clone()))
}

/// API key and chat settings for LLM formatting.
///
/// `None` when formatting is switched off or no key can be found; the key
/// lookup is skipped entirely in the first case.
pub fn llm_settings(
    enabled: bool,
    explicit_key: Option<&str>,
    model: Option<&str>,
    config: &ConfigFile,
) -> Option<(Resolved, ChatSettings)> {
    if !enabled {
        return None;
    }
    let Some(key) = resolve_api_key(explicit_key, config) else {
        log::warn!("No OpenAI API key found. LLM formatting disabled.");
        return None;
    };

    let mut settings = ChatSettings::from_config(&config.llm());
    if let Some(model) = model {
        settings = settings.with_model(model);
    }
    Some((key, settings))
}

/// `<stem><suffix>` in the current directory.
pub fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{}{}", stem, suffix))
}

/// Print the end-of-run summary to stdout.
pub fn print_summary<U: UnitRecord>(
    result: &ExtractionResult<U>,
    unit_label: &str,
    outputs: &[(&str, &Path)],
) {
    println!();
    println!("{}", "=".repeat(60));
    println!("EXTRACTION COMPLETE");
    println!("{}", "=".repeat(60));
    println!("File: {}", result.file_path.display());
    println!(
        "{} processed: {}/{}",
        unit_label,
        result.units_processed(),
        result.total_units
    );
    println!("Tables found: {}", result.tables_found);
    for (label, path) in outputs {
        println!("{}: {}", label, path.display());
    }
    if !result.errors.is_empty() {
        println!("Errors encountered: {}", result.errors.len());
        for error in &result.errors {
            println!("  - {}", error);
        }
    }
}

/// Ask a yes/no question; only `y`/`yes` count as yes.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    write!(output, "{} (y/n): ", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Ask for a free-form value, trimmed.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_default_output_uses_stem() {
        assert_eq!(
            default_output(Path::new("/data/in/report.v2.pdf"), "_extracted.txt"),
            PathBuf::from("report.v2_extracted.txt")
        );
        assert_eq!(
            default_output(Path::new("deck.pptx"), "_tables.xlsx"),
            PathBuf::from("deck_tables.xlsx")
        );
    }

    fn config_with(dpi: Option<u32>, model: Option<&str>) -> ConfigFile {
        ConfigFile {
            ocr: Some(extract_core::OcrConfig {
                tesseract_path: None,
                dpi,
            }),
            llm: Some(extract_core::LlmConfig {
                model: model.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_ensure_extension() {
        assert!(ensure_extension(Path::new("deck.PPTX"), "pptx").is_ok());
        assert!(matches!(
            ensure_extension(Path::new("deck.ppt"), "pptx"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(ensure_extension(Path::new("README"), "pdf").is_err());
    }

    #[test]
    fn test_explicit_dpi_beats_config() {
        let config = config_with(Some(300), None);
        assert_eq!(resolve_dpi(Some(200), &config), 200);
        assert_eq!(resolve_dpi(None, &config), 300);
        assert_eq!(resolve_dpi(None, &ConfigFile::default()), DEFAULT_DPI);
    }

    #[test]
    fn test_llm_disabled_skips_key_lookup() {
        let config = config_with(None, Some("gpt-4o-mini"));
        assert!(llm_settings(false, Some("sk-explicit"), None, &config).is_none());
    }

    #[test]
    fn test_llm_settings_model_precedence() {
        let config = config_with(None, Some("gpt-4o-mini"));

        let (key, settings) = llm_settings(true, Some("sk-explicit"), None, &config).unwrap();
        assert_eq!(key.value, "sk-explicit");
        assert_eq!(settings.model, "gpt-4o-mini");

        let (_, settings) = llm_settings(true, Some("sk-explicit"), Some("gpt-4o"), &config).unwrap();
        assert_eq!(settings.model, "gpt-4o");
    }

    #[test]
    fn test_ocr_engine_switch() {
        let config = ConfigFile::default();
        assert!(ocr_engine(false, None, &config).is_none());
        assert!(ocr_engine(true, Some(Path::new("/opt/tess")), &config).is_some());
    }

    #[test]
    fn test_load_settings_explicit_missing() {
        assert!(load_settings(Some(Path::new("/no/such/config.toml"))).is_err());
    }

    #[test]
    fn test_load_settings_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ocr]\ndpi = 300\n[llm]\nmodel = \"gpt-4o-mini\"\n").unwrap();

        let config = load_settings(Some(&path)).unwrap();
        assert_eq!(config.dpi(), Some(300));
        assert_eq!(config.llm().model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_load_settings_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ocr\n").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        assert!(confirm(&mut Cursor::new("Yes\n"), &mut out, "Overwrite?").unwrap());
        assert!(!confirm(&mut Cursor::new("n\n"), &mut out, "Overwrite?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut out, "Overwrite?").unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Overwrite? (y/n): "));
    }

    #[test]
    fn test_ask_trims() {
        let mut out = Vec::new();
        let answer = ask(&mut Cursor::new("  sk-abc \n"), &mut out, "Key: ").unwrap();
        assert_eq!(answer, "sk-abc");
    }
}
