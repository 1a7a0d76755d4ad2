use crate::domains::export::sink::ExportSink;
use crate::domains::export::types::{CsvConfig, ExportFormat, ExportOutcome, ExportPayload, ExportScope};
use crate::domains::export::writer::ExportWriter;
use crate::domains::export::writers::{CsvExportWriter, XlsxExportWriter, DEFAULT_SHEET_NAME};
use crate::domains::selection::SelectionSet;
use crate::errors::{ExportError, ExportResult};
use crate::types::{ColumnDescriptor, Record};
use log::{debug, error, info};
use std::borrow::Cow;

/// Picks the rows, serializes them and hands the payload to a sink.
///
/// Never mutates the records or the selection it is given.
pub struct ExportEngine {
    csv: CsvExportWriter,
    xlsx: XlsxExportWriter,
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new(CsvConfig::default(), DEFAULT_SHEET_NAME)
    }
}

impl ExportEngine {
    pub fn new(csv: CsvConfig, sheet_name: &str) -> Self {
        Self {
            csv: CsvExportWriter::new(csv),
            xlsx: XlsxExportWriter::new(sheet_name),
        }
    }

    fn writer(&self, format: ExportFormat) -> &dyn ExportWriter {
        match format {
            ExportFormat::Csv => &self.csv,
            ExportFormat::Spreadsheet => &self.xlsx,
        }
    }

    /// Serializes without delivering.
    ///
    /// An empty `records` fails with `NoData` before the selection is looked
    /// at. A non-empty selection exports exactly the selected records in
    /// `records` order; otherwise every record goes out. With no `columns`,
    /// every field seen across the exported records becomes a column.
    pub fn render(
        &self,
        records: &[Record],
        columns: &[ColumnDescriptor],
        format: ExportFormat,
        selection: &SelectionSet,
    ) -> ExportResult<ExportPayload> {
        if records.is_empty() {
            return Err(ExportError::NoData);
        }

        let (scope, rows): (ExportScope, Vec<&Record>) = if selection.is_empty() {
            (ExportScope::All, records.iter().collect())
        } else {
            (ExportScope::Selected, selection.ordered_in(records))
        };

        if rows.is_empty() {
            // Selection holds only ids that are gone from the records
            error!(
                "Export candidate set is empty with {} records and {} selected",
                records.len(),
                selection.len()
            );
            return Err(ExportError::NoRecordsSelected);
        }

        let columns: Cow<'_, [ColumnDescriptor]> = if columns.is_empty() {
            Cow::Owned(ColumnDescriptor::infer(rows.iter().copied()))
        } else {
            Cow::Borrowed(columns)
        };

        let bytes = self.writer(format).write(&columns, &rows)?;
        debug!(
            "Rendered {} {} rows into {} bytes",
            rows.len(),
            format.display_name(),
            bytes.len()
        );

        Ok(ExportPayload {
            bytes,
            filename: scope.filename(format),
            format,
            scope,
            record_count: rows.len(),
        })
    }

    /// Renders and delivers to `sink`. Nothing is written when rendering fails.
    pub fn export(
        &self,
        records: &[Record],
        columns: &[ColumnDescriptor],
        format: ExportFormat,
        selection: &SelectionSet,
        sink: &dyn ExportSink,
    ) -> ExportResult<ExportOutcome> {
        let payload = self.render(records, columns, format, selection)?;
        let location = sink.save(&payload.bytes, &payload.filename)?;

        info!(
            "Exported {} records as {} to {}",
            payload.record_count,
            format.display_name(),
            payload.filename
        );

        Ok(ExportOutcome {
            filename: payload.filename,
            format,
            scope: payload.scope,
            record_count: payload.record_count,
            mime_type: format.mime_type().to_string(),
            bytes_written: payload.bytes.len(),
            location,
        })
    }
}
