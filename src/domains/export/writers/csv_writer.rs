use crate::domains::export::types::CsvConfig;
use crate::domains::export::writer::ExportWriter;
use crate::errors::{ExportError, ExportResult};
use crate::types::{ColumnDescriptor, Record};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Flat CSV: one header row of column labels, then one row per record
pub struct CsvExportWriter {
    config: CsvConfig,
}

impl CsvExportWriter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }
}

impl Default for CsvExportWriter {
    fn default() -> Self {
        Self::new(CsvConfig::default())
    }
}

impl ExportWriter for CsvExportWriter {
    fn write(&self, columns: &[ColumnDescriptor], rows: &[&Record]) -> ExportResult<Vec<u8>> {
        let mut buffer = Vec::new();
        if self.config.include_bom {
            buffer.extend_from_slice(UTF8_BOM);
        }

        {
            let mut wtr = csv::WriterBuilder::new()
                .delimiter(self.config.delimiter)
                .quote(self.config.quote_char)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(&mut buffer);

            wtr.write_record(columns.iter().map(|c| c.header.as_str()))?;
            for record in rows {
                wtr.write_record(columns.iter().map(|c| c.cell(record)))?;
            }
            wtr.flush().map_err(|e| ExportError::Serialization(e.to_string()))?;
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", "ID"),
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("email", "Email"),
        ]
    }

    #[test]
    fn test_header_then_rows() {
        let a = Record::new(1).with("name", "Juan").with("email", "juan@email.com");
        let b = Record::new(2).with("name", "María");
        let bytes = CsvExportWriter::default().write(&columns(), &[&a, &b]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "ID,Name,Email\n1,Juan,juan@email.com\n2,María,\n");
    }

    #[test]
    fn test_quotes_fields_with_delimiters() {
        let a = Record::new(1).with("name", "Doe, \"JD\" John");
        let bytes = CsvExportWriter::default().write(&columns()[..2], &[&a]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "ID,Name\n1,\"Doe, \"\"JD\"\" John\"\n");
    }

    #[test]
    fn test_bom_and_custom_delimiter() {
        let writer = CsvExportWriter::new(CsvConfig {
            delimiter: b';',
            include_bom: true,
            ..CsvConfig::default()
        });
        let a = Record::new(7).with("name", "x");
        let bytes = writer.write(&columns()[..2], &[&a]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(&bytes[UTF8_BOM.len()..], b"ID;Name\n7;x\n");
    }
}
