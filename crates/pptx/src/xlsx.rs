//! Table export to an `.xlsx` workbook, one worksheet per table.
//!
//! Only the SpreadsheetML parts needed for plain string cells are written:
//! content types, package and workbook relationships, the workbook, a
//! minimal stylesheet and the worksheets.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use extract_core::{Error, Result, SlideExtraction, Table};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Excel's limit on worksheet name length.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Characters Excel rejects in worksheet names.
const INVALID_SHEET_CHARS: &[char] = &['\\', '/', '?', '*', '[', ']', ':', '\''];

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Replace invalid characters with `_`, then cut to 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_CHARS)
        .collect()
}

/// Worksheet name for the `index`-th (1-based) table of a slide.
pub fn table_sheet_name(slide_number: usize, index: usize) -> String {
    sanitize_sheet_name(&format!("Slide{}_Table{}", slide_number, index))
}

/// 1-based column number to letters (1 -> A, 27 -> AA).
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

/// Escape XML special characters in attribute values.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Drop characters XML 1.0 cannot carry; vertical tabs become newlines.
fn xml_safe(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\u{000B}' => Some('\n'),
            '\t' | '\n' | '\r' => Some(c),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

fn xml_err(e: quick_xml::Error) -> Error {
    Error::XmlError(e.to_string())
}

fn zip_err(e: zip::result::ZipError) -> Error {
    Error::ZipError(e.to_string())
}

/// Collects named tables and writes them as an xlsx package.
#[derive(Debug, Default)]
pub struct WorkbookWriter {
    sheets: Vec<(String, Table)>,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet. The name is sanitized; duplicate names are rejected.
    pub fn add_sheet(&mut self, name: &str, table: Table) -> Result<()> {
        let name = sanitize_sheet_name(name);
        if self
            .sheets
            .iter()
            .any(|(existing, _)| existing.to_lowercase() == name.to_lowercase())
        {
            return Err(Error::ExportError(format!("duplicate worksheet name '{}'", name)));
        }
        self.sheets.push((name, table));
        Ok(())
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Write the workbook to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)?;
        Ok(())
    }

    /// Write the workbook package to any seekable writer.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut put = |name: &str, data: &[u8]| -> Result<()> {
            zip.start_file(name, options).map_err(zip_err)?;
            zip.write_all(data)?;
            Ok(())
        };

        put("[Content_Types].xml", self.content_types_xml().as_bytes())?;
        put("_rels/.rels", package_rels_xml().as_bytes())?;
        put("xl/workbook.xml", self.workbook_xml().as_bytes())?;
        put("xl/_rels/workbook.xml.rels", self.workbook_rels_xml().as_bytes())?;
        put("xl/styles.xml", STYLES_XML.as_bytes())?;
        for (idx, (_, table)) in self.sheets.iter().enumerate() {
            let sheet = sheet_xml(table)?;
            put(&format!("xl/worksheets/sheet{}.xml", idx + 1), &sheet)?;
        }

        zip.finish().map_err(zip_err)
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                idx
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<workbook xmlns="{}" xmlns:r="{}">"#, MAIN_NS, REL_NS));
        xml.push_str("<sheets>");
        for (idx, (name, _)) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(name),
                idx + 1,
                idx + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, PKG_REL_NS));
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                idx, REL_NS, idx
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1,
            REL_NS
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

fn package_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        PKG_REL_NS, REL_NS
    )
}

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Worksheet part with every non-empty cell as an inline string.
fn sheet_xml(table: &Table) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_err)?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", MAIN_NS));
    writer.write_event(Event::Start(worksheet)).map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("sheetData")))
        .map_err(xml_err)?;

    for (row_idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row_number = (row_idx + 1).to_string();

        let mut row_start = BytesStart::new("row");
        row_start.push_attribute(("r", row_number.as_str()));
        writer.write_event(Event::Start(row_start)).map_err(xml_err)?;

        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_to_letters(col_idx as u32 + 1), row_number);

            let mut c = BytesStart::new("c");
            c.push_attribute(("r", cell_ref.as_str()));
            c.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(c)).map_err(xml_err)?;
            writer
                .write_event(Event::Start(BytesStart::new("is")))
                .map_err(xml_err)?;

            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            writer.write_event(Event::Start(t)).map_err(xml_err)?;
            let text = xml_safe(cell);
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new("t")))
                .map_err(xml_err)?;

            writer
                .write_event(Event::End(BytesEnd::new("is")))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new("c")))
                .map_err(xml_err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("row")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("sheetData")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("worksheet")))
        .map_err(xml_err)?;

    Ok(writer.into_inner())
}

/// Exports every slide table of an extraction to a workbook.
pub struct TableExporter;

impl TableExporter {
    /// Build the workbook for a presentation result.
    pub fn workbook(result: &SlideExtraction) -> Result<WorkbookWriter> {
        let mut workbook = WorkbookWriter::new();
        for slide in &result.units {
            for (i, table) in slide.tables.iter().enumerate() {
                workbook.add_sheet(&table_sheet_name(slide.number, i + 1), table.clone())?;
            }
        }
        Ok(workbook)
    }

    /// Write all tables to `path`. Returns the number of tables written;
    /// nothing is written when there are none.
    pub fn export(result: &SlideExtraction, path: &Path) -> Result<usize> {
        let workbook = Self::workbook(result)?;
        if workbook.sheet_count() == 0 {
            log::warn!("No tables found to export.");
            return Ok(0);
        }

        workbook.save(path)?;
        log::info!(
            "Exported {} tables to: {}",
            workbook.sheet_count(),
            path.display()
        );
        Ok(workbook.sheet_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_core::SlideRecord;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn read_part(data: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_sanitize_sheet_name_replaces_invalid() {
        assert_eq!(sanitize_sheet_name("Q1/Q2 [draft]: 'x'?*\\"), "Q1_Q2 _draft__ _x____");
        assert_eq!(sanitize_sheet_name("Slide3_Table1"), "Slide3_Table1");
    }

    #[test]
    fn test_sanitize_sheet_name_truncates_to_31() {
        let name = sanitize_sheet_name(&"A".repeat(40));
        assert_eq!(name.chars().count(), 31);

        let name = sanitize_sheet_name(&format!("{}/rest", "B".repeat(30)));
        assert_eq!(name, format!("{}_", "B".repeat(30)));
    }

    #[test]
    fn test_table_sheet_name() {
        assert_eq!(table_sheet_name(4, 2), "Slide4_Table2");
    }

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(703), "AAA");
    }

    #[test]
    fn test_duplicate_sheet_rejected() {
        let mut workbook = WorkbookWriter::new();
        workbook.add_sheet("Slide1_Table1", table(&[&["a"]])).unwrap();
        assert!(workbook.add_sheet("slide1_table1", table(&[&["b"]])).is_err());
    }

    #[test]
    fn test_workbook_package_parts() {
        let mut workbook = WorkbookWriter::new();
        workbook
            .add_sheet("Slide1_Table1", table(&[&["Name", "Qty"], &["Fish & Chips", ""], &["", ""]]))
            .unwrap();
        workbook.add_sheet("Slide2_Table1", table(&[&["x"]])).unwrap();

        let data = workbook.write_to(Cursor::new(Vec::new())).unwrap().into_inner();

        let content_types = read_part(&data, "[Content_Types].xml");
        assert!(content_types.contains("/xl/worksheets/sheet2.xml"));

        let wb = read_part(&data, "xl/workbook.xml");
        assert!(wb.contains(r#"<sheet name="Slide1_Table1" sheetId="1" r:id="rId1"/>"#));
        assert!(wb.contains(r#"<sheet name="Slide2_Table1" sheetId="2" r:id="rId2"/>"#));

        let rels = read_part(&data, "xl/_rels/workbook.xml.rels");
        assert!(rels.contains(r#"Id="rId3""#));
        assert!(rels.contains("styles.xml"));

        let sheet = read_part(&data, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">Name</t></is></c>"#));
        assert!(sheet.contains("Fish &amp; Chips"));
        assert!(!sheet.contains(r#"r="B2""#));
        assert!(!sheet.contains(r#"<row r="3">"#));

        read_part(&data, "_rels/.rels");
        read_part(&data, "xl/styles.xml");
    }

    #[test]
    fn test_control_characters_stripped() {
        assert_eq!(xml_safe("a\u{000B}b\u{0007}c\td"), "a\nbc\td");
    }

    #[test]
    fn test_export_names_sheets_per_slide() {
        let mut result = SlideExtraction::new("deck.pptx", "pptx");
        let mut slide = SlideRecord::new(3);
        slide.tables.push(table(&[&["a", "b"]]));
        slide.tables.push(table(&[&["c"]]));
        result.push_unit(slide);

        let workbook = TableExporter::workbook(&result).unwrap();
        let names: Vec<&str> = workbook.sheets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Slide3_Table1", "Slide3_Table2"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.xlsx");
        assert_eq!(TableExporter::export(&result, &path).unwrap(), 2);
        assert!(path.exists());
    }

    #[test]
    fn test_export_without_tables_writes_nothing() {
        let mut result = SlideExtraction::new("deck.pptx", "pptx");
        result.push_unit(SlideRecord::new(1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.xlsx");
        assert_eq!(TableExporter::export(&result, &path).unwrap(), 0);
        assert!(!path.exists());
    }
}
