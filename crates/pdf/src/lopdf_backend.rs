//! Primary backend built on `lopdf`.
//!
//! Page text comes from `Document::extract_text`. Tables need positions, so
//! the page content stream is walked and every shown string becomes a span
//! at its text-space origin.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use extract_core::{Error, Result, Table};

use crate::backend::{LoadedPdf, PdfBackend, TextLayout};
use crate::tables::{TableDetector, TextSpan};

/// Approximate glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn LoadedPdf>> {
        let doc = Document::load(path).map_err(|e| Error::PdfError(e.to_string()))?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        log::debug!("lopdf opened {} ({} pages)", path.display(), pages.len());
        Ok(Box::new(LopdfDocument {
            doc,
            pages,
            detector: TableDetector::default(),
        }))
    }
}

struct LopdfDocument {
    doc: Document,
    /// 1-based page numbers and page objects, in page-tree order.
    pages: Vec<(u32, ObjectId)>,
    detector: TableDetector,
}

impl LopdfDocument {
    fn page(&self, index: usize) -> Result<(u32, ObjectId)> {
        self.pages
            .get(index)
            .copied()
            .ok_or_else(|| Error::ExtractionError(format!("page index {} out of range", index)))
    }

    fn page_spans(&self, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::ExtractionError(e.to_string()))?;
        let content = Content::decode(&data).map_err(|e| Error::ExtractionError(e.to_string()))?;

        let fonts: BTreeMap<Vec<u8>, &Dictionary> = match self.doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                log::debug!("No fonts for page {:?}: {}", page_id, e);
                BTreeMap::new()
            }
        };

        let mut walker = TextWalker::default();
        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => walker.begin(),
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        walker.font = name.clone();
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        walker.font_size = size;
                    }
                }
                "TL" => walker.leading = operands.first().and_then(number).unwrap_or(0.0),
                "Td" | "TD" => {
                    let tx = operands.first().and_then(number).unwrap_or(0.0);
                    let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                    if op.operator == "TD" {
                        walker.leading = -ty;
                    }
                    walker.move_line(tx, ty);
                }
                "Tm" => {
                    let m: Vec<f32> = operands.iter().filter_map(number).collect();
                    if let [a, b, c, d, e, f] = m[..] {
                        walker.set_matrix([a, b, c, d, e, f]);
                    }
                }
                "T*" => walker.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode(&fonts, &walker.font, bytes);
                        walker.show(text);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let text: String = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(self.decode(&fonts, &walker.font, bytes)),
                                // Large negative kerning is a word gap
                                other => number(other).filter(|n| *n < -200.0).map(|_| " ".to_string()),
                            })
                            .collect();
                        walker.show(text);
                    }
                }
                "'" | "\"" => {
                    walker.next_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(idx) {
                        let text = self.decode(&fonts, &walker.font, bytes);
                        walker.show(text);
                    }
                }
                _ => {}
            }
        }

        Ok(walker.into_spans())
    }

    fn decode(&self, fonts: &BTreeMap<Vec<u8>, &Dictionary>, font: &[u8], bytes: &[u8]) -> String {
        fonts
            .get(font)
            .and_then(|dict| dict.get_font_encoding(&self.doc).ok())
            .and_then(|enc| Document::decode_text(&enc, bytes).ok())
            .unwrap_or_else(|| decode_plain(bytes))
    }
}

impl LoadedPdf for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize, _layout: TextLayout) -> Result<String> {
        let (number, _) = self.page(index)?;
        self.doc
            .extract_text(&[number])
            .map_err(|e| Error::ExtractionError(e.to_string()))
    }

    fn page_tables(&self, index: usize) -> Result<Vec<Table>> {
        let (_, page_id) = self.page(index)?;
        Ok(self.detector.detect(&self.page_spans(page_id)?))
    }
}

/// A shown string and the font size it was shown at.
struct Shown {
    span: TextSpan,
    size: f32,
}

/// Text-state tracking for a content stream, ignoring the CTM.
struct TextWalker {
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    line: [f32; 6],
    matrix: [f32; 6],
    shown: Vec<Shown>,
}

impl Default for TextWalker {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            line: IDENTITY,
            matrix: IDENTITY,
            shown: Vec::new(),
        }
    }
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl TextWalker {
    fn begin(&mut self) {
        self.line = IDENTITY;
        self.matrix = IDENTITY;
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.line = m;
        self.matrix = m;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.matrix = self.line;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        let size = self.font_size * self.matrix[3].abs().max(self.matrix[0].abs());
        let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH;
        let x0 = self.matrix[4];
        // Advance along the baseline so a following string starts after this one
        self.matrix[4] += width;

        if text.trim().is_empty() {
            return;
        }
        self.shown.push(Shown {
            span: TextSpan {
                x0,
                x1: x0 + width,
                // Page space grows upward; spans are ordered top to bottom
                y: -self.matrix[5],
                text,
            },
            size,
        });
    }

    /// Spans with strings on the same baseline merged when they nearly touch.
    fn into_spans(mut self) -> Vec<TextSpan> {
        self.shown
            .sort_by(|a, b| a.span.y.total_cmp(&b.span.y).then(a.span.x0.total_cmp(&b.span.x0)));

        let mut merged: Vec<Shown> = Vec::new();
        for next in self.shown {
            if let Some(last) = merged.last_mut() {
                let same_line = (next.span.y - last.span.y).abs() <= 0.5;
                let gap = next.span.x0 - last.span.x1;
                if same_line && gap < last.size {
                    if gap > last.size * 0.15 && !next.span.text.starts_with(' ') {
                        last.span.text.push(' ');
                    }
                    last.span.text.push_str(&next.span.text);
                    last.span.x1 = last.span.x1.max(next.span.x1);
                    continue;
                }
            }
            merged.push(next);
        }

        merged
            .into_iter()
            .map(|mut shown| {
                shown.span.text = shown.span.text.trim().to_string();
                shown.span
            })
            .collect()
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Fallback for strings without a usable font encoding: UTF-16BE with a
/// byte-order mark, otherwise Latin-1.
fn decode_plain(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
