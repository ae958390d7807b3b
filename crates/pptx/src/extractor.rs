//! Slide-by-slide presentation extraction.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use extract_core::{
    is_ocr_extension, join_sections, Error, ExtractionMethod, ImageBlob, Recognizer, Result,
    SlideExtraction, SlideRecord, Table, TextNormalizer,
};

use crate::llm::TextFormatter;
use crate::parser::{resolve_part_path, PptxPackage, Relationship};
use crate::selection::resolve_selection;
use crate::shapes::{notes_text, parse_shapes, Shape};

/// Options for a presentation extraction run.
#[derive(Debug, Clone, Copy)]
pub struct PptxOptions {
    /// OCR pictures through the configured recognizer.
    pub use_ocr: bool,
    /// Rewrite slide text through the configured formatter.
    pub use_llm: bool,
}

impl Default for PptxOptions {
    fn default() -> Self {
        Self {
            use_ocr: true,
            use_llm: true,
        }
    }
}

/// Extracts text, tables, notes and images from PPTX files.
pub struct PresentationExtractor {
    recognizer: Option<Box<dyn Recognizer>>,
    formatter: Option<Box<dyn TextFormatter>>,
    normalizer: TextNormalizer,
    options: PptxOptions,
}

impl PresentationExtractor {
    pub fn new(options: PptxOptions) -> Self {
        Self {
            recognizer: None,
            formatter: None,
            normalizer: TextNormalizer::new(),
            options,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_formatter(mut self, formatter: Box<dyn TextFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Number of slides in a presentation file.
    pub fn slide_count(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Ok(PptxPackage::open(path)?.slide_parts()?.len())
    }

    /// Extract the selected slides (1-based) of a presentation file;
    /// `None` selects every slide.
    pub fn extract(&self, path: &Path, slides: Option<&[usize]>) -> Result<SlideExtraction> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        log::info!("Processing PowerPoint: {}", path.display());
        let file = File::open(path)?;
        self.extract_from_reader(file, path, slides)
    }

    /// Extract from an already opened package; `file_path` is only recorded.
    pub fn extract_from_reader<R: Read + Seek>(
        &self,
        reader: R,
        file_path: &Path,
        slides: Option<&[usize]>,
    ) -> Result<SlideExtraction> {
        let mut package = PptxPackage::from_reader(reader)?;
        let parts = package.slide_parts()?;

        let mut result = SlideExtraction::new(file_path, "pptx");
        result.total_units = parts.len();

        for number in resolve_selection(slides, parts.len()) {
            log::info!("Processing slide {}/{}", number, result.total_units);
            let part = &parts[number - 1];

            let mut slide_errors = Vec::new();
            match self.process_slide(&mut package, part, number, &mut slide_errors) {
                Ok(slide) => result.push_unit(slide),
                Err(e) => {
                    log::error!("Error processing slide {}: {}", number, e);
                    slide_errors.push(format!("Slide {}: {}", number, e));
                }
            }
            result.errors.extend(slide_errors);
        }

        Ok(result)
    }

    fn process_slide<R: Read + Seek>(
        &self,
        package: &mut PptxPackage<R>,
        part: &str,
        number: usize,
        errors: &mut Vec<String>,
    ) -> Result<SlideRecord> {
        let xml = package.read_xml(part)?;
        let rels = package.relationships(part)?;
        let shapes = parse_shapes(&xml)?;

        let mut slide = SlideRecord::new(number);
        let mut text_parts: Vec<String> = Vec::new();
        let mut native = false;

        for shape in &shapes {
            match shape {
                Shape::Text { .. } | Shape::Group { .. } => {
                    let text = shape.text(&self.normalizer);
                    if !text.is_empty() {
                        text_parts.push(text);
                        native = true;
                    }
                }
                Shape::Table { rows } => {
                    let table = Table::new(rows.clone());
                    if !table.is_empty() {
                        slide.tables.push(table);
                    }
                }
                Shape::Picture { name, embed } => {
                    match self.load_picture(package, part, &rels, embed.as_deref()) {
                        Ok(Some(image)) => {
                            if let Some(text) = self.ocr_picture(&image, number, errors) {
                                text_parts.push(format!("[Image OCR]: {}", text));
                                slide.ocr_used = true;
                            }
                            slide.images.push(image);
                        }
                        Ok(None) => log::debug!("Picture '{}' on slide {} has no embedded image", name, number),
                        Err(e) => {
                            log::warn!("Error extracting image '{}' on slide {}: {}", name, number, e);
                            errors.push(format!("Slide {}: image '{}': {}", number, name, e));
                        }
                    }
                }
                Shape::Other => {}
            }
        }

        slide.text = join_sections(&text_parts);
        slide.method = ExtractionMethod::from_sources(native, slide.ocr_used);

        match self.load_notes(package, part, &rels) {
            Ok(notes) => slide.notes = notes,
            Err(e) => {
                log::warn!("Error reading notes of slide {}: {}", number, e);
                errors.push(format!("Slide {}: notes: {}", number, e));
            }
        }

        self.apply_formatting(&mut slide);
        Ok(slide)
    }

    fn load_picture<R: Read + Seek>(
        &self,
        package: &mut PptxPackage<R>,
        part: &str,
        rels: &[Relationship],
        embed: Option<&str>,
    ) -> Result<Option<ImageBlob>> {
        let Some(embed) = embed else {
            return Ok(None);
        };
        let rel = rels
            .iter()
            .find(|r| r.id == embed)
            .ok_or_else(|| Error::CorruptedFile(format!("missing image relationship {}", embed)))?;
        if rel.external {
            return Ok(None);
        }

        let part_name = resolve_part_path(part, &rel.target);
        let data = package.read_binary(&part_name)?;
        Ok(Some(ImageBlob { part_name, data }))
    }

    /// OCR text for a picture, if OCR is on and produced anything.
    fn ocr_picture(&self, image: &ImageBlob, number: usize, errors: &mut Vec<String>) -> Option<String> {
        if !self.options.use_ocr {
            return None;
        }
        let recognizer = self.recognizer.as_ref()?;

        let extension = image.extension().unwrap_or_default();
        if !is_ocr_extension(&extension) {
            log::debug!("Skipping OCR for {} (unsupported format)", image.part_name);
            return None;
        }

        match recognizer.recognize_bytes(&image.data, &extension) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                log::warn!("OCR failed on image {}: {}", image.part_name, e);
                errors.push(format!("Slide {}: OCR failed on image {}: {}", number, image.part_name, e));
                None
            }
        }
    }

    fn load_notes<R: Read + Seek>(
        &self,
        package: &mut PptxPackage<R>,
        part: &str,
        rels: &[Relationship],
    ) -> Result<String> {
        let Some(rel) = rels.iter().find(|r| r.is_kind("notesSlide")) else {
            return Ok(String::new());
        };
        let xml = package.read_xml(&resolve_part_path(part, &rel.target))?;
        notes_text(&xml, &self.normalizer)
    }

    /// Single best-effort rewrite; on failure the extracted text stays.
    fn apply_formatting(&self, slide: &mut SlideRecord) {
        if !self.options.use_llm || slide.text.trim().is_empty() {
            return;
        }
        let Some(formatter) = self.formatter.as_ref() else {
            return;
        };

        log::info!("Applying LLM formatting to slide {}", slide.number);
        match formatter.format_text(&slide.text) {
            Ok(text) => {
                slide.text = text;
                slide.llm_formatted = true;
            }
            Err(e) => log::warn!("LLM formatting failed for slide {}: {}", slide.number, e),
        }
    }
}
