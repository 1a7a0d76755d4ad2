use crate::domains::export::writer::ExportWriter;
use crate::errors::{ExportError, ExportResult};
use crate::types::{ColumnDescriptor, FieldValue, Record};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const DEFAULT_SHEET_NAME: &str = "Data";

/// Excel caps sheet names at 31 characters
const MAX_SHEET_NAME_CHARS: usize = 31;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Single-sheet Office Open XML workbook, packed with `zip`
pub struct XlsxExportWriter {
    sheet_name: String,
}

impl XlsxExportWriter {
    pub fn new(sheet_name: &str) -> Self {
        Self {
            sheet_name: sanitize_sheet_name(sheet_name),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn workbook_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
            ),
            escape_xml(&self.sheet_name)
        )
    }
}

impl Default for XlsxExportWriter {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME)
    }
}

impl ExportWriter for XlsxExportWriter {
    fn write(&self, columns: &[ColumnDescriptor], rows: &[&Record]) -> ExportResult<Vec<u8>> {
        let sheet = sheet_xml(columns, rows);
        let workbook = self.workbook_xml();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
            ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
        ];
        for (name, body) in parts {
            zip.start_file(name, options)?;
            zip.write_all(body)
                .map_err(|e| ExportError::Serialization(format!("Failed to write {}: {}", name, e)))?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

fn sheet_xml(columns: &[ColumnDescriptor], rows: &[&Record]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#
    ));

    push_row(&mut xml, 1, columns.iter().map(|c| Some(FieldValue::Text(c.header.clone()))));
    for (index, record) in rows.iter().enumerate() {
        let cells = columns.iter().map(|c| c.value(record).map(|v| v.into_owned()));
        push_row(&mut xml, index + 2, cells);
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row<I>(xml: &mut String, row: usize, cells: I)
where
    I: Iterator<Item = Option<FieldValue>>,
{
    xml.push_str(&format!(r#"<row r="{}">"#, row));
    for (col, cell) in cells.enumerate() {
        let reference = format!("{}{}", column_letter(col), row);
        match cell {
            // Missing fields leave the cell out entirely
            None => {}
            Some(FieldValue::Integer(i)) => {
                xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, i));
            }
            Some(FieldValue::Float(x)) if x.is_finite() => {
                xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, x));
            }
            Some(FieldValue::Bool(b)) => {
                xml.push_str(&format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(b)));
            }
            Some(other) => {
                xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    reference,
                    escape_xml(&other.to_string())
                ));
            }
        }
    }
    xml.push_str("</row>");
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA)
pub fn column_letter(index: usize) -> String {
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

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        cleaned
    }
}
