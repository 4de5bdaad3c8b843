//! XLSX (Office Open XML spreadsheet) writer.
//!
//! Produces the minimal set of parts a spreadsheet application needs: content
//! types, package relationships, the workbook, a stylesheet and one worksheet
//! per sheet. Cells are written as inline strings, so no shared string table
//! is needed.

use super::{Sheet, WorkbookWriter};
use crate::error::Result;
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Longest text a single cell can hold.
const MAX_CELL_CHARS: usize = 32_767;

/// Name of the placeholder sheet of a workbook without tables.
const EMPTY_WORKBOOK_SHEET: &str = "Sheet1";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Writes sheets as an `.xlsx` workbook.
#[derive(Debug, Clone, Default)]
pub struct XlsxWriter {
    header_row: bool,
}

impl XlsxWriter {
    /// Create a writer that treats the first row as an ordinary row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the first row of every sheet in bold.
    pub fn with_header_row(mut self, enable: bool) -> Self {
        self.header_row = enable;
        self
    }
}

impl WorkbookWriter for XlsxWriter {
    fn write<W: Write + Seek>(&self, sheets: &[Sheet], out: W) -> Result<()> {
        let placeholder;
        let sheets = if sheets.is_empty() {
            placeholder = [Sheet::new(EMPTY_WORKBOOK_SHEET, vec![])];
            &placeholder[..]
        } else {
            sheets
        };

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(out);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types(sheets.len()).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(package_relationships().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook(sheets).as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(workbook_relationships(sheets.len()).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;

        for (index, sheet) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;
            zip.write_all(self.worksheet(sheet).as_bytes())?;
        }

        zip.finish()?;
        log::debug!("Wrote workbook with {} sheets", sheets.len());
        Ok(())
    }
}

impl XlsxWriter {
    fn worksheet(&self, sheet: &Sheet) -> String {
        let mut xml = String::with_capacity(256 + sheet.rows.len() * 64);
        xml.push_str(XML_DECLARATION);
        let _ = write!(xml, r#"<worksheet xmlns="{}"><sheetData>"#, MAIN_NS);
        for (row_index, row) in sheet.rows.iter().enumerate() {
            let row_number = row_index + 1;
            let style = if self.header_row && row_index == 0 {
                r#" s="1""#
            } else {
                ""
            };
            let _ = write!(xml, r#"<row r="{}">"#, row_number);
            for (column_index, value) in row.iter().enumerate() {
                let text = clean_cell_text(value);
                if text.is_empty() {
                    continue;
                }
                let _ = write!(
                    xml,
                    r#"<c r="{}{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                    column_name(column_index),
                    row_number,
                    style,
                    escape(text.as_str())
                );
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// Spreadsheet column letters for a 0-based index: `A`, ..., `Z`, `AA`, ...
pub(crate) fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Drop characters XML 1.0 cannot carry and cap the length of a cell.
fn clean_cell_text(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect();
    if cleaned.chars().count() > MAX_CELL_CHARS {
        log::warn!("Cell text longer than {} characters truncated", MAX_CELL_CHARS);
        cleaned.chars().take(MAX_CELL_CHARS).collect()
    } else {
        cleaned
    }
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    for n in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_relationships() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_DECLARATION, PACKAGE_REL_NS, REL_NS
    )
}

fn workbook(sheets: &[Sheet]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = write!(xml, r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#, MAIN_NS, REL_NS);
    for (index, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(sheet.name.as_str()),
            index + 1,
            index + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_relationships(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECLARATION);
    let _ = write!(xml, r#"<Relationships xmlns="{}">"#, PACKAGE_REL_NS);
    for n in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, REL_NS, n
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
        sheet_count + 1,
        REL_NS
    );
    xml.push_str("</Relationships>");
    xml
}

/// Two cell formats: 0 is the default, 1 uses a bold font for header rows.
const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);
