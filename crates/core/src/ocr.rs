//! OCR through an external tesseract executable.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::config::{resolve_tesseract_path, ConfigFile};
use crate::error::{Error, Result};
use crate::normalize::TextNormalizer;

/// Picture extensions tesseract can read.
pub const OCR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Executable name used when no install location is known.
const DEFAULT_TESSERACT: &str = "tesseract";

/// Page segmentation mode: a single uniform block of text.
const PAGE_SEG_MODE: &str = "6";

/// Whether an image with this extension can be sent to OCR.
pub fn is_ocr_extension(extension: &str) -> bool {
    OCR_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}

/// Something that turns an image into text.
pub trait Recognizer {
    /// Recognize the text in an image file.
    fn recognize_file(&self, path: &Path) -> Result<String>;

    /// Recognize the text in an in-memory image.
    ///
    /// The bytes are written to a temporary file with the given extension
    /// so the engine can detect the format.
    fn recognize_bytes(&self, data: &[u8], extension: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("docextract-ocr-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        self.recognize_file(file.path())
    }
}

/// Runs `tesseract <image> stdout --psm 6`.
#[derive(Debug)]
pub struct TesseractEngine {
    explicit: Option<PathBuf>,
    config: ConfigFile,
    resolved: OnceLock<PathBuf>,
    normalizer: TextNormalizer,
}

impl TesseractEngine {
    /// Create an engine. The executable is located on first use.
    pub fn new(explicit: Option<PathBuf>, config: ConfigFile) -> Self {
        Self {
            explicit,
            config,
            resolved: OnceLock::new(),
            normalizer: TextNormalizer::new(),
        }
    }

    /// Path of the tesseract executable, resolved once and cached.
    pub fn executable(&self) -> &Path {
        self.resolved.get_or_init(|| {
            match resolve_tesseract_path(self.explicit.as_deref(), &self.config) {
                Some(resolved) => {
                    log::debug!("Using tesseract from {}: {}", resolved.source, resolved.value);
                    PathBuf::from(resolved.value)
                }
                None => {
                    log::warn!(
                        "Tesseract not found in common locations, relying on '{}' being on PATH",
                        DEFAULT_TESSERACT
                    );
                    PathBuf::from(DEFAULT_TESSERACT)
                }
            }
        })
    }
}

impl Recognizer for TesseractEngine {
    fn recognize_file(&self, path: &Path) -> Result<String> {
        let executable = self.executable();
        let output = Command::new(executable)
            .arg(path)
            .arg("stdout")
            .arg("--psm")
            .arg(PAGE_SEG_MODE)
            .output()
            .map_err(|e| {
                Error::OcrError(format!("failed to run {}: {}", executable.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::OcrError(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.normalizer.clean(&stdout))
    }
}
