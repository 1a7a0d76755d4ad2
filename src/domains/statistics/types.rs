use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used for records without a category value
pub const FALLBACK_CATEGORY: &str = "uncategorized";

/// Slice colors for pie charts, cycled by slice index
pub const CHART_PALETTE: [&str; 8] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884D8", "#82CA9D", "#FF6B6B", "#4ECDC4",
];

/// Category -> count over the current validated records.
///
/// Only observed categories appear. Keys are sorted, so equal category
/// multisets always produce equal maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics {
    counts: BTreeMap<String, u64>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&mut self, category: &str) {
        *self.counts.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, category: &str) -> Option<u64> {
        self.counts.get(category).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct categories
    pub fn category_count(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts; equals the number of aggregated records.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Data points for the bar and pie charts
    pub fn chart_series(&self) -> Vec<CategoryCount> {
        self.iter()
            .enumerate()
            .map(|(index, (category, count))| CategoryCount {
                category: category.to_string(),
                count,
                color: CHART_PALETTE[index % CHART_PALETTE.len()].to_string(),
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Statistics {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One chart data point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
}

/// Summary cards shown above the document list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_records: usize,
    pub categories: usize,
    pub selected: usize,
    pub chart_points: usize,
}
