use crate::domains::statistics::{aggregate, Statistics};
use crate::domains::store::source::RecordSource;
use crate::errors::LoadResult;
use crate::types::{Record, RecordId};
use crate::validation::{Rejection, Validator};
use log::{error, info};

/// Message kept on the store after a failed remote load
pub const LOAD_FAILURE_MESSAGE: &str = "Error loading the documents";

/// Canonical record list plus the statistics derived from it.
///
/// Records are replaced wholesale on every load and the statistics are
/// recomputed in the same step; nothing else writes to either.
pub struct RecordStore {
    validator: Validator,
    category_field: String,
    records: Vec<Record>,
    statistics: Statistics,
    loading: bool,
    error: Option<String>,
}

impl RecordStore {
    pub fn new(validator: Validator, category_field: &str) -> Self {
        Self {
            validator,
            category_field: category_field.to_string(),
            records: Vec::new(),
            statistics: Statistics::new(),
            loading: false,
            error: None,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Validates `raw` and replaces the contents. Returns the rejected
    /// entries for diagnostics.
    pub fn set_records(&mut self, raw: &serde_json::Value) -> Vec<Rejection> {
        let report = self.validator.validate(raw);
        self.replace(report.records);
        self.error = None;
        report.rejected
    }

    /// Marks a load as in flight.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Applies the outcome of a load started with [`begin_load`]. A failure
    /// empties the store and leaves the error set until the next success.
    ///
    /// [`begin_load`]: RecordStore::begin_load
    pub fn finish_load(&mut self, outcome: LoadResult<serde_json::Value>) -> LoadResult<usize> {
        self.loading = false;
        match outcome {
            Ok(raw) => {
                let rejected = self.set_records(&raw);
                info!(
                    "Loaded {} records ({} rejected)",
                    self.records.len(),
                    rejected.len()
                );
                Ok(self.records.len())
            }
            Err(e) => {
                error!("Record load failed: {}", e);
                self.replace(Vec::new());
                self.error = Some(LOAD_FAILURE_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Fetches from `source` and applies the result. Last completed load wins.
    pub async fn load(&mut self, source: &dyn RecordSource) -> LoadResult<usize> {
        self.begin_load();
        let outcome = source.fetch().await;
        self.finish_load(outcome)
    }

    fn replace(&mut self, records: Vec<Record>) {
        self.statistics = aggregate(&records, &self.category_field);
        self.records = records;
    }
}
