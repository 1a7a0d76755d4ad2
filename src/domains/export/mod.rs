pub mod service;
pub mod sink;
pub mod types;
pub mod writer;
pub mod writers;

pub use service::ExportEngine;
pub use sink::{DirectorySink, ExportSink, MemorySink};
pub use types::{CsvConfig, ExportFormat, ExportOutcome, ExportPayload, ExportScope};
pub use writer::ExportWriter;
pub use writers::{CsvExportWriter, XlsxExportWriter, DEFAULT_SHEET_NAME};
