use crate::errors::ExportResult;
use crate::types::{ColumnDescriptor, Record};

/// Serializes projected rows into one export format.
///
/// Writers build the whole payload in memory; nothing reaches a sink until
/// serialization has succeeded.
pub trait ExportWriter: Send + Sync {
    fn write(&self, columns: &[ColumnDescriptor], rows: &[&Record]) -> ExportResult<Vec<u8>>;
}
