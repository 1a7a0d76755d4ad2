use crate::domains::export::ExportFormat;
use crate::domains::notification::Notice;
use crate::domains::statistics::{CategoryCount, ChartKind, DashboardSummary, Statistics};
use crate::types::{ColumnDescriptor, Record, RecordId};
use serde::Serialize;

pub const NO_DATA_NOTICE: &str = "No data available to export";

pub fn export_success_notice(count: usize, format: ExportFormat) -> String {
    format!("{} records exported successfully as {}", count, format.display_name())
}

pub fn export_failure_notice(format: ExportFormat) -> String {
    format!("Error exporting the {} file", format.display_name())
}

/// Everything the host needs to render the table and dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub records: Vec<Record>,
    pub columns: Vec<ColumnDescriptor>,
    pub selected_ids: Vec<RecordId>,
    pub statistics: Statistics,
    pub chart_kind: ChartKind,
    pub chart: Vec<CategoryCount>,
    pub summary: DashboardSummary,
    pub notice: Option<Notice>,
    pub loading: bool,
    pub error: Option<String>,
}
