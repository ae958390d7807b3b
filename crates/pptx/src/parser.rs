//! PPTX package access: ZIP parts, relationships and slide order.

use extract_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// A relationship from one package part to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// Whether the target lives outside the package (e.g. a hyperlink).
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with `/<kind>`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(kind)
    }
}

/// An opened PPTX package.
pub struct PptxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl PptxPackage<File> {
    /// Open a PPTX file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> PptxPackage<R> {
    /// Open a PPTX package from a reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    /// Part names of all slides, in presentation order.
    ///
    /// Order comes from the slide id list in `presentation.xml`; when that is
    /// missing the slide relationships are sorted by number.
    pub fn slide_parts(&mut self) -> Result<Vec<String>> {
        if !self.has_part(PRESENTATION_RELS) {
            return Err(Error::PptxParseError(
                "missing presentation relationships".to_string(),
            ));
        }
        let rels = self.relationships(PRESENTATION_PART)?;

        let slide_rels: HashMap<&str, &Relationship> = rels
            .iter()
            .filter(|r| r.is_kind("slide"))
            .map(|r| (r.id.as_str(), r))
            .collect();

        let ordered_ids = match self.read_xml(PRESENTATION_PART) {
            Ok(xml) => slide_id_list(&xml)?,
            Err(e) => {
                log::warn!("Could not read {}: {}", PRESENTATION_PART, e);
                Vec::new()
            }
        };

        let ordered: Vec<String> = ordered_ids
            .iter()
            .filter_map(|id| slide_rels.get(id.as_str()))
            .map(|r| resolve_part_path(PRESENTATION_PART, &r.target))
            .collect();

        if !ordered.is_empty() {
            return Ok(ordered);
        }

        // Fall back to the numbering of relationship ids or targets
        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .values()
            .map(|r| {
                let order = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_part_path(PRESENTATION_PART, &r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Relationships of a part. A part without a `.rels` file has none.
    pub fn relationships(&mut self, part: &str) -> Result<Vec<Relationship>> {
        let rels_path = rels_path_for(part);
        if !self.has_part(&rels_path) {
            return Ok(Vec::new());
        }
        let content = self.read_xml(&rels_path)?;
        parse_relationships(&content)
    }

    /// Whether the package contains a part.
    pub fn has_part(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Read a part as UTF-8 text.
    pub fn read_xml(&mut self, path: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a part as raw bytes (media).
    pub fn read_binary(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(data)
    }
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
///
/// Absolute targets (`/ppt/media/a.png`) are package-rooted; relative ones
/// are resolved against the source part's directory, honouring `..`.
pub fn resolve_part_path(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Parse a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut relationships = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids from `<p:sldIdLst>`, in order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() != b"id" && local_name(attr.key.as_ref()) == b"id" {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract the local name from a potentially namespaced XML name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::PptxBuilder;
    use std::io::Cursor;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_resolve_part_path() {
        assert_eq!(
            resolve_part_path("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_part_path("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_part_path("ppt/slides/slide1.xml", "/ppt/media/image9.jpeg"),
            "ppt/media/image9.jpeg"
        );
        assert_eq!(
            resolve_part_path("ppt/slides/slide1.xml", "./../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 3);
        assert!(rels[0].is_kind("slideLayout"));
        assert!(!rels[0].is_kind("slide"));
        assert!(rels[1].is_kind("image"));
        assert_eq!(rels[1].target, "../media/image1.png");
        assert!(rels[2].external);
    }

    #[test]
    fn test_slide_order_follows_slide_id_list() {
        // Relationship ids deliberately disagree with presentation order.
        let data = PptxBuilder::new()
            .slide_order(&["slide3", "slide1", "slide2"])
            .slide("slide1", "<p:sp/>")
            .slide("slide2", "<p:sp/>")
            .slide("slide3", "<p:sp/>")
            .build();

        let mut package = PptxPackage::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(
            package.slide_parts().unwrap(),
            vec![
                "ppt/slides/slide3.xml",
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml"
            ]
        );
    }

    #[test]
    fn test_slide_order_falls_back_to_numbers() {
        let data = PptxBuilder::new()
            .without_slide_id_list()
            .slide("slide10", "<p:sp/>")
            .slide("slide2", "<p:sp/>")
            .build();

        let mut package = PptxPackage::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(
            package.slide_parts().unwrap(),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide10.xml"]
        );
    }

    #[test]
    fn test_not_a_zip() {
        let result = PptxPackage::from_reader(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result.err(), Some(Error::ZipError(_))));
    }

    #[test]
    fn test_read_binary_and_missing_part() {
        let data = PptxBuilder::new()
            .slide("slide1", "<p:sp/>")
            .media("image1.png", &[1, 2, 3])
            .build();

        let mut package = PptxPackage::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(package.read_binary("ppt/media/image1.png").unwrap(), vec![1, 2, 3]);
        assert!(package.read_binary("ppt/media/missing.png").is_err());
        assert!(package
            .relationships("ppt/slides/slide1.xml")
            .unwrap()
            .is_empty());
    }
}
