pub mod service;
pub mod types;

pub use service::{aggregate, summarize};
pub use types::{CategoryCount, ChartKind, DashboardSummary, Statistics, CHART_PALETTE, FALLBACK_CATEGORY};
