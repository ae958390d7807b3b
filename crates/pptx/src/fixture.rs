//! In-memory PPTX packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

struct SlidePart {
    name: String,
    body: String,
    rels: Vec<(String, String, String)>,
    notes: Option<String>,
}

/// Builds a minimal PPTX archive.
///
/// Slide bodies are the children of `<p:spTree>`; namespaces `p`, `a`, `r`
/// and `mc` are declared on the slide root.
pub struct PptxBuilder {
    slides: Vec<SlidePart>,
    order: Option<Vec<String>>,
    slide_id_list: bool,
    media: Vec<(String, Vec<u8>)>,
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            order: None,
            slide_id_list: true,
            media: Vec::new(),
        }
    }

    /// Add a slide part `ppt/slides/<name>.xml`.
    pub fn slide(mut self, name: &str, body: &str) -> Self {
        self.slides.push(SlidePart {
            name: name.to_string(),
            body: body.to_string(),
            rels: Vec::new(),
            notes: None,
        });
        self
    }

    /// Add a relationship from the most recently added slide.
    pub fn slide_rel(mut self, id: &str, kind: &str, target: &str) -> Self {
        if let Some(slide) = self.slides.last_mut() {
            slide
                .rels
                .push((id.to_string(), kind.to_string(), target.to_string()));
        }
        self
    }

    /// Attach speaker notes (body placeholder text) to the last slide.
    pub fn notes(mut self, text: &str) -> Self {
        if let Some(slide) = self.slides.last_mut() {
            slide.notes = Some(text.to_string());
        }
        self
    }

    /// Add a media part `ppt/media/<name>`.
    pub fn media(mut self, name: &str, data: &[u8]) -> Self {
        self.media.push((name.to_string(), data.to_vec()));
        self
    }

    /// Presentation order by slide name.
    pub fn slide_order(mut self, names: &[&str]) -> Self {
        self.order = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Omit `<p:sldIdLst>` from `presentation.xml`.
    pub fn without_slide_id_list(mut self) -> Self {
        self.slide_id_list = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        put(
            &mut zip,
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.as_bytes(),
        );

        let mut pres_rels = String::new();
        for (idx, slide) in self.slides.iter().enumerate() {
            pres_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/{}.xml"/>"#,
                idx + 1,
                REL_NS,
                slide.name
            ));
        }
        put(&mut zip, "ppt/_rels/presentation.xml.rels", relationships(&pres_rels).as_bytes());

        let mut id_list = String::new();
        if self.slide_id_list {
            let order: Vec<String> = self
                .order
                .clone()
                .unwrap_or_else(|| self.slides.iter().map(|s| s.name.clone()).collect());
            id_list.push_str("<p:sldIdLst>");
            for (n, name) in order.iter().enumerate() {
                if let Some(idx) = self.slides.iter().position(|s| &s.name == name) {
                    id_list.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n, idx + 1));
                }
            }
            id_list.push_str("</p:sldIdLst>");
        }
        put(
            &mut zip,
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="{}">{}</p:presentation>"#,
                REL_NS, id_list
            )
            .as_bytes(),
        );

        for (idx, slide) in self.slides.iter().enumerate() {
            put(
                &mut zip,
                &format!("ppt/slides/{}.xml", slide.name),
                slide_xml("p:sld", &slide.body).as_bytes(),
            );

            let mut rels: String = slide
                .rels
                .iter()
                .map(|(id, kind, target)| {
                    format!(
                        r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
                        id, REL_NS, kind, target
                    )
                })
                .collect();

            if let Some(notes) = &slide.notes {
                let notes_name = format!("notesSlide{}.xml", idx + 1);
                rels.push_str(&format!(
                    r#"<Relationship Id="rIdNotes" Type="{}/notesSlide" Target="../notesSlides/{}"/>"#,
                    REL_NS, notes_name
                ));
                let body = format!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    notes
                );
                put(
                    &mut zip,
                    &format!("ppt/notesSlides/{}", notes_name),
                    slide_xml("p:notes", &body).as_bytes(),
                );
            }

            if !rels.is_empty() {
                put(
                    &mut zip,
                    &format!("ppt/slides/_rels/{}.xml.rels", slide.name),
                    relationships(&rels).as_bytes(),
                );
            }
        }

        for (name, data) in &self.media {
            put(&mut zip, &format!("ppt/media/{}", name), data.as_slice());
        }

        zip.finish().unwrap().into_inner()
    }
}

fn relationships(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        inner
    )
}

fn slide_xml(root: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><{root} xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{rel}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><p:cSld><p:spTree>{body}</p:spTree></p:cSld></{root}>"#,
        root = root,
        rel = REL_NS,
        body = body
    )
}

/// A text box with one paragraph per entry.
pub fn text_box(name: &str, paragraphs: &[&str]) -> String {
    let paras: String = paragraphs
        .iter()
        .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="10" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
        name, paras
    )
}

/// A table graphic frame.
pub fn table_frame(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| format!("<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>", c))
                .collect();
            format!(r#"<a:tr h="370840">{}</a:tr>"#, cells)
        })
        .collect();
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="20" name="Table 1"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid/>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        rows
    )
}

/// A picture referencing an image relationship.
pub fn picture(name: &str, embed: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="30" name="{}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
        name, embed
    )
}

/// A group containing the given shapes.
pub fn group(children: &[String]) -> String {
    format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="40" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
        children.concat()
    )
}
