use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Export formats supported by the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    Csv,
    /// Office Open XML workbook with a single sheet
    Spreadsheet,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Name shown to the user in notices
    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Spreadsheet => "Excel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "spreadsheet" | "xlsx" | "excel" => Some(ExportFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Which records ended up in an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    Selected,
    All,
}

impl ExportScope {
    /// Deterministic file name; depends only on scope and format.
    pub fn filename(&self, format: ExportFormat) -> String {
        let stem = match self {
            ExportScope::Selected => "records_selected",
            ExportScope::All => "records_all",
        };
        format!("{}.{}", stem, format.file_extension())
    }
}

#[derive(Clone, Debug)]
pub struct CsvConfig {
    pub delimiter: u8,
    pub quote_char: u8,
    /// Prefix output with a UTF-8 BOM for Excel compatibility
    pub include_bom: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote_char: b'"',
            include_bom: false,
        }
    }
}

/// Serialized export, ready for a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub format: ExportFormat,
    pub scope: ExportScope,
    pub record_count: usize,
}

/// Summary returned after a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub filename: String,
    pub format: ExportFormat,
    pub scope: ExportScope,
    pub record_count: usize,
    pub mime_type: String,
    pub bytes_written: usize,
    /// Where the sink put the file, when it writes to disk
    pub location: Option<PathBuf>,
}
