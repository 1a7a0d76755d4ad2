pub mod csv_writer;
pub mod xlsx_writer;

pub use csv_writer::CsvExportWriter;
pub use xlsx_writer::{XlsxExportWriter, DEFAULT_SHEET_NAME};
