use crate::domains::statistics::types::{DashboardSummary, Statistics, FALLBACK_CATEGORY};
use crate::types::{FieldValue, Record};

/// Counts records per category.
///
/// A record without `category_field` lands in [`FALLBACK_CATEGORY`]; so does
/// one whose category renders as an empty string.
pub fn aggregate(records: &[Record], category_field: &str) -> Statistics {
    let mut stats = Statistics::new();
    for record in records {
        let category = record
            .get(category_field)
            .map(|value| category_label(&value))
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
        stats.increment(&category);
    }
    stats
}

fn category_label(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn summarize(records: &[Record], stats: &Statistics, selected: usize) -> DashboardSummary {
    DashboardSummary {
        total_records: records.len(),
        categories: stats.category_count(),
        selected,
        chart_points: stats.chart_series().len(),
    }
}
