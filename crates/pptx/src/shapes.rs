//! Slide shape tree parsing.
//!
//! Turns the `<p:spTree>` of a slide (or notes slide) into a list of
//! [`Shape`]s in document order. Groups keep their children; content
//! inside `mc:AlternateContent` is skipped.

use extract_core::{Error, Result, TextNormalizer};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::parser::local_name;

/// A shape on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A shape with a text frame.
    Text {
        name: String,
        paragraphs: Vec<String>,
        /// Placeholder type (`title`, `body`, ...) if the shape is a placeholder.
        placeholder: Option<String>,
    },
    /// A graphic frame holding a table; cells are trimmed.
    Table { rows: Vec<Vec<String>> },
    /// A picture and the relationship id of its image.
    Picture { name: String, embed: Option<String> },
    /// A group of shapes.
    Group { children: Vec<Shape> },
    /// Connectors, charts, shapes without text frames.
    Other,
}

impl Shape {
    /// Text of a text frame, or of every text frame inside a group.
    pub fn text(&self, normalizer: &TextNormalizer) -> String {
        match self {
            Shape::Text { paragraphs, .. } => normalizer.join_paragraphs(paragraphs),
            Shape::Group { children } => children
                .iter()
                .map(|child| child.text(normalizer))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Parse the shapes of a slide part.
pub fn parse_shapes(xml: &str) -> Result<Vec<Shape>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut parser = ShapeTreeParser::new();
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::XmlError(format!(
                "Error parsing slide at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) => {
                if local_name(e.name().as_ref()) == b"AlternateContent" {
                    skip_depth = 1;
                    continue;
                }
                parser.start(e, false);
            }
            Event::Empty(ref e) => parser.start(e, true),
            Event::Text(ref e) => {
                if parser.in_run_text {
                    let text = e.unescape().unwrap_or_default();
                    parser.push_text(&text);
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                parser.end(local_name(name.as_ref()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.finish())
}

/// Text of the notes body placeholder in a notes slide part.
pub fn notes_text(xml: &str, normalizer: &TextNormalizer) -> Result<String> {
    let shapes = parse_shapes(xml)?;
    Ok(shapes
        .iter()
        .filter(|s| matches!(s, Shape::Text { placeholder: Some(ph), .. } if ph == "body"))
        .map(|s| s.text(normalizer))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// A shape element being read.
enum Leaf {
    Text {
        name: String,
        paragraphs: Vec<String>,
        placeholder: Option<String>,
        has_body: bool,
    },
    Frame {
        rows: Vec<Vec<String>>,
        row: Vec<String>,
        cell: Vec<String>,
        has_table: bool,
    },
    Picture {
        name: String,
        embed: Option<String>,
    },
    Other,
}

impl Leaf {
    fn for_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"sp" => Some(Leaf::Text {
                name: String::new(),
                paragraphs: Vec::new(),
                placeholder: None,
                has_body: false,
            }),
            b"graphicFrame" => Some(Leaf::Frame {
                rows: Vec::new(),
                row: Vec::new(),
                cell: Vec::new(),
                has_table: false,
            }),
            b"pic" => Some(Leaf::Picture {
                name: String::new(),
                embed: None,
            }),
            b"cxnSp" | b"contentPart" => Some(Leaf::Other),
            _ => None,
        }
    }

    fn into_shape(self) -> Shape {
        match self {
            Leaf::Text {
                name,
                paragraphs,
                placeholder,
                has_body: true,
            } => Shape::Text {
                name,
                paragraphs,
                placeholder,
            },
            Leaf::Frame {
                rows,
                has_table: true,
                ..
            } => Shape::Table { rows },
            Leaf::Picture { name, embed } => Shape::Picture { name, embed },
            _ => Shape::Other,
        }
    }
}

struct OpenLeaf {
    tag: Vec<u8>,
    /// Same-named elements opened inside the leaf.
    nesting: usize,
    leaf: Leaf,
}

struct ShapeTreeParser {
    /// Shapes collected per open group; the first entry is the tree root.
    groups: Vec<Vec<Shape>>,
    open: Option<OpenLeaf>,
    paragraph: Option<String>,
    in_run_text: bool,
}

impl ShapeTreeParser {
    fn new() -> Self {
        Self {
            groups: vec![Vec::new()],
            open: None,
            paragraph: None,
            in_run_text: false,
        }
    }

    fn start(&mut self, e: &BytesStart, is_empty: bool) {
        let name = e.name();
        let tag = local_name(name.as_ref());

        let Some(open) = self.open.as_mut() else {
            if tag == b"grpSp" && !is_empty {
                self.groups.push(Vec::new());
            } else if let Some(leaf) = Leaf::for_tag(tag) {
                if is_empty {
                    self.push(leaf.into_shape());
                } else {
                    self.open = Some(OpenLeaf {
                        tag: tag.to_vec(),
                        nesting: 0,
                        leaf,
                    });
                }
            }
            return;
        };

        if tag == open.tag.as_slice() && !is_empty {
            open.nesting += 1;
        }

        match (&mut open.leaf, tag) {
            (Leaf::Text { placeholder, .. }, b"ph") => {
                *placeholder = Some(attr(e, b"type").unwrap_or_else(|| "obj".to_string()));
            }
            (Leaf::Text { has_body, .. }, b"txBody") => *has_body = true,
            (Leaf::Text { name, .. }, b"cNvPr") | (Leaf::Picture { name, .. }, b"cNvPr") => {
                *name = attr(e, b"name").unwrap_or_default();
            }
            (Leaf::Picture { embed, .. }, b"blip") => *embed = attr(e, b"embed"),
            (Leaf::Frame { has_table, .. }, b"tbl") => *has_table = true,
            // Self-closing rows and cells get no End event
            (Leaf::Frame { rows, row, .. }, b"tr") => {
                if is_empty {
                    rows.push(Vec::new());
                } else {
                    row.clear();
                }
            }
            (Leaf::Frame { row, cell, .. }, b"tc") => {
                if is_empty {
                    row.push(String::new());
                } else {
                    cell.clear();
                }
            }
            _ => {}
        }

        match tag {
            b"p" if !is_empty => self.paragraph = Some(String::new()),
            b"t" if !is_empty => self.in_run_text = true,
            b"br" => self.push_text("\n"),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn end(&mut self, tag: &[u8]) {
        let Some(open) = self.open.as_mut() else {
            if tag == b"grpSp" && self.groups.len() > 1 {
                let children = self.groups.pop().unwrap_or_default();
                self.push(Shape::Group { children });
            }
            return;
        };

        if tag == open.tag.as_slice() {
            if open.nesting == 0 {
                if let Some(open) = self.open.take() {
                    self.push(open.leaf.into_shape());
                }
                self.paragraph = None;
                self.in_run_text = false;
                return;
            }
            open.nesting -= 1;
        }

        match (&mut open.leaf, tag) {
            (_, b"t") => self.in_run_text = false,
            (Leaf::Text { paragraphs, .. }, b"p") => {
                if let Some(text) = self.paragraph.take() {
                    paragraphs.push(text);
                }
            }
            (Leaf::Frame { cell, .. }, b"p") => {
                if let Some(text) = self.paragraph.take() {
                    cell.push(text);
                }
            }
            (Leaf::Frame { row, cell, .. }, b"tc") => {
                row.push(cell.join("\n").trim().to_string());
                cell.clear();
            }
            (Leaf::Frame { rows, row, .. }, b"tr") => rows.push(std::mem::take(row)),
            _ => {}
        }
    }

    fn push(&mut self, shape: Shape) {
        if let Some(group) = self.groups.last_mut() {
            group.push(shape);
        }
    }

    fn finish(mut self) -> Vec<Shape> {
        // Close groups left open by truncated markup
        while self.groups.len() > 1 {
            let children = self.groups.pop().unwrap_or_default();
            self.push(Shape::Group { children });
        }
        self.groups.pop().unwrap_or_default()
    }
}

/// Value of an attribute by local name, unescaped.
fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
