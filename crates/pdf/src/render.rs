//! Page rasterization for OCR.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use extract_core::{Error, Result};

/// Default render resolution (2x the 72 dpi PDF user space).
pub const DEFAULT_DPI: u32 = 144;

/// A rendered page image. The file lives as long as this value.
#[derive(Debug)]
pub struct RenderedPage {
    _dir: TempDir,
    pub path: PathBuf,
}

impl RenderedPage {
    /// Wrap an image inside a temporary directory that owns it.
    pub fn new(dir: TempDir, path: PathBuf) -> Self {
        Self { _dir: dir, path }
    }
}

/// Something that turns a PDF page into an image file.
pub trait PageRasterizer {
    /// Render a 1-based page number.
    fn render(&self, pdf_path: &Path, page_number: usize) -> Result<RenderedPage>;
}

/// Renders pages with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_DPI,
        }
    }
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            ..Self::default()
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn render(&self, pdf_path: &Path, page_number: usize) -> Result<RenderedPage> {
        let dir = tempfile::Builder::new().prefix("docextract-page-").tempdir()?;
        let prefix = dir.path().join("page");

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                Error::RenderError(format!(
                    "failed to invoke {}; is poppler-utils installed? ({})",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RenderError(format!(
                "pdftoppm failed with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // -singlefile writes `<prefix>.png`
        let path = prefix.with_extension("png");
        if !path.exists() {
            return Err(Error::RenderError(format!(
                "expected rendered image not found: {}",
                path.display()
            )));
        }

        Ok(RenderedPage::new(dir, path))
    }
}
