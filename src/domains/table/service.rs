use crate::config::TableConfig;
use crate::domains::export::{ExportEngine, ExportFormat, ExportOutcome, ExportSink};
use crate::domains::notification::{Notice, NoticeKind, NotificationCenter, SharedNotifications};
use crate::domains::selection::{SelectionReloadPolicy, SelectionSet};
use crate::domains::statistics::{summarize, ChartKind, Statistics};
use crate::domains::store::{RecordSource, RecordStore};
use crate::domains::table::types::{
    export_failure_notice, export_success_notice, TableSnapshot, NO_DATA_NOTICE,
};
use crate::errors::{ConfigResult, DomainError, DomainResult, ExportError, LoadResult};
use crate::types::{ColumnDescriptor, Record, RecordId};
use crate::validation::Rejection;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// One table/dashboard instance: records, the user's picks, the export
/// engine and the transient notice shown after an export.
pub struct TableSession {
    store: RecordStore,
    selection: SelectionSet,
    notifications: SharedNotifications,
    columns: Vec<ColumnDescriptor>,
    engine: ExportEngine,
    reload_policy: SelectionReloadPolicy,
    chart_kind: ChartKind,
}

impl TableSession {
    /// Builds a session from `config`, which is validated first since a
    /// struct literal skips the checks the loaders run.
    pub fn new(config: &TableConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            store: RecordStore::new(config.validator(), &config.category_field),
            selection: SelectionSet::new(),
            notifications: Arc::new(Mutex::new(NotificationCenter::new(config.notice_ttl()))),
            columns: config.columns.clone(),
            engine: config.export_engine()?,
            reload_policy: config.reload_policy,
            chart_kind: config.chart_kind,
        })
    }

    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    pub fn statistics(&self) -> &Statistics {
        self.store.statistics()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.columns = columns;
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart_kind = kind;
    }

    /// Flips the selection state of the record with `id`
    pub fn toggle(&mut self, id: &RecordId) -> DomainResult<bool> {
        self.selection
            .toggle_id(id, self.store.records())
            .ok_or_else(|| DomainError::RecordNotFound(id.clone()))
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replaces the records with the validated contents of `raw`.
    pub fn set_records(&mut self, raw: &serde_json::Value) -> Vec<Rejection> {
        let rejected = self.store.set_records(raw);
        self.selection.on_reload(self.reload_policy, self.store.records());
        rejected
    }

    /// Reloads from `source`. The selection follows the reload policy whether
    /// or not the load succeeds.
    pub async fn reload(&mut self, source: &dyn RecordSource) -> DomainResult<usize> {
        self.begin_reload();
        let outcome = source.fetch().await;
        self.finish_reload(outcome)
    }

    /// First half of [`reload`] for callers that fetch without holding the
    /// session. Snapshots report `loading` until [`finish_reload`] runs.
    ///
    /// [`reload`]: TableSession::reload
    /// [`finish_reload`]: TableSession::finish_reload
    pub fn begin_reload(&mut self) {
        self.store.begin_load();
    }

    /// Applies a fetched payload and the selection reload policy.
    pub fn finish_reload(&mut self, outcome: LoadResult<serde_json::Value>) -> DomainResult<usize> {
        let outcome = self.store.finish_load(outcome);
        self.selection.on_reload(self.reload_policy, self.store.records());
        outcome.map_err(DomainError::from)
    }

    /// Exports the selected records, or every record when nothing is
    /// selected, and posts a notice describing the result.
    pub fn export(&self, format: ExportFormat, sink: &dyn ExportSink) -> DomainResult<ExportOutcome> {
        let result = self.engine.export(
            self.store.records(),
            &self.columns,
            format,
            &self.selection,
            sink,
        );

        match &result {
            Ok(outcome) => {
                info!("Export finished: {}", outcome.filename);
                self.post(export_success_notice(outcome.record_count, format), NoticeKind::Success);
            }
            Err(ExportError::NoData) => {
                self.post(NO_DATA_NOTICE, NoticeKind::Error);
            }
            Err(e @ ExportError::NoRecordsSelected) => {
                self.post(e.to_string(), NoticeKind::Error);
            }
            Err(e) => {
                warn!("Export as {} failed: {}", format.display_name(), e);
                self.post(export_failure_notice(format), NoticeKind::Error);
            }
        }

        result.map_err(DomainError::from)
    }

    /// The notice currently showing, if it has not lapsed
    pub fn notice(&self) -> Option<Notice> {
        self.lock_notifications().current().cloned()
    }

    /// Clears the notice posted as `generation`, if it is still showing.
    pub fn expire_notice(&self, generation: u64) -> bool {
        self.lock_notifications().expire(generation)
    }

    /// Handle for scheduling expiry timers
    pub fn notifications(&self) -> SharedNotifications {
        Arc::clone(&self.notifications)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let records = self.store.records();
        let statistics = self.store.statistics().clone();
        TableSnapshot {
            records: records.to_vec(),
            columns: self.columns.clone(),
            selected_ids: self.selection.ids(),
            chart_kind: self.chart_kind,
            chart: statistics.chart_series(),
            summary: summarize(records, &statistics, self.selection.len()),
            statistics,
            notice: self.notice(),
            loading: self.store.is_loading(),
            error: self.store.error().map(str::to_string),
        }
    }

    fn post(&self, text: impl Into<String>, kind: NoticeKind) {
        self.lock_notifications().post(text, kind);
    }

    fn lock_notifications(&self) -> MutexGuard<'_, NotificationCenter> {
        // A poisoned center still holds a usable notice
        self.notifications
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::export::MemorySink;
    use crate::domains::store::{StaticRecordSource, LOAD_FAILURE_MESSAGE};
    use crate::errors::{ConfigError, ExportResult, LoadError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn save(&self, _bytes: &[u8], _filename: &str) -> ExportResult<Option<PathBuf>> {
            Err(ExportError::Sink("disk full".to_string()))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        async fn fetch(&self) -> LoadResult<serde_json::Value> {
            Err(LoadError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn people() -> serde_json::Value {
        json!([
            {"id": 1, "name": "Juan", "email": "juan@email.com", "age": 25},
            {"id": 2, "name": "María", "email": "maria@email.com", "age": 30},
            {"id": 3, "name": "Carlos", "email": "carlos@email.com", "age": 28}
        ])
    }

    fn session(policy: SelectionReloadPolicy) -> TableSession {
        let config = TableConfig {
            required_fields: vec!["name".to_string()],
            reload_policy: policy,
            columns: vec![
                ColumnDescriptor::new("id", "ID"),
                ColumnDescriptor::new("name", "Name"),
                ColumnDescriptor::new("email", "Email"),
                ColumnDescriptor::new("age", "Age"),
            ],
            ..TableConfig::default()
        };
        let mut session = TableSession::new(&config).unwrap();
        session.set_records(&people());
        session
    }

    #[test]
    fn test_toggle_by_id() {
        let mut session = session(SelectionReloadPolicy::Clear);
        assert!(session.toggle(&RecordId::Int(2)).unwrap());
        assert!(session.is_selected(&RecordId::Int(2)));
        assert!(!session.toggle(&RecordId::Int(2)).unwrap());
        assert!(!session.is_selected(&RecordId::Int(2)));

        let result = session.toggle(&RecordId::Int(42));
        assert!(matches!(result, Err(DomainError::RecordNotFound(RecordId::Int(42)))));
    }

    #[test]
    fn test_export_selected_posts_success_notice() {
        let mut session = session(SelectionReloadPolicy::Clear);
        session.toggle(&RecordId::Int(2)).unwrap();

        let sink = MemorySink::new();
        let outcome = session.export(ExportFormat::Csv, &sink).unwrap();
        assert_eq!(outcome.filename, "records_selected.csv");

        let (_, bytes) = sink.take_last().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "ID,Name,Email,Age\n2,María,maria@email.com,30\n"
        );

        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, "1 records exported successfully as CSV");
        // Export leaves the selection alone
        assert!(session.is_selected(&RecordId::Int(2)));
    }

    #[test]
    fn test_export_without_records_posts_no_data() {
        let session = TableSession::new(&TableConfig::default()).unwrap();
        let sink = MemorySink::new();

        let result = session.export(ExportFormat::Spreadsheet, &sink);
        assert!(matches!(result, Err(DomainError::Export(ExportError::NoData))));
        assert!(sink.saved().is_empty());
        assert_eq!(session.notice().unwrap().text, NO_DATA_NOTICE);
    }

    #[test]
    fn test_sink_failure_posts_error_notice() {
        let session = session(SelectionReloadPolicy::Clear);
        let result = session.export(ExportFormat::Spreadsheet, &FailingSink);

        assert!(matches!(result, Err(DomainError::Export(ExportError::Sink(_)))));
        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Error exporting the Excel file");
    }

    #[test]
    fn test_stale_selection_posts_its_own_notice() {
        let mut session = session(SelectionReloadPolicy::Clear);
        // Selected id that no stored record carries
        session.selection.toggle(&Record::new(99));

        let sink = MemorySink::new();
        let result = session.export(ExportFormat::Csv, &sink);
        assert!(matches!(result, Err(DomainError::Export(ExportError::NoRecordsSelected))));
        assert!(sink.saved().is_empty());

        let notice = session.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "No records available to export");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        for delimiter in ['\n', '\r', 'é', '"'] {
            let config = TableConfig {
                csv_delimiter: delimiter,
                ..TableConfig::default()
            };
            let result = TableSession::new(&config);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "csv_delimiter"),
                "delimiter {:?} accepted",
                delimiter
            );
        }

        let config = TableConfig {
            category_field: String::new(),
            ..TableConfig::default()
        };
        assert!(TableSession::new(&config).is_err());
    }

    #[test]
    fn test_expire_notice_by_generation() {
        let session = session(SelectionReloadPolicy::Clear);
        session.export(ExportFormat::Csv, &MemorySink::new()).unwrap();
        let first = session.notice().unwrap().generation;
        session.export(ExportFormat::Csv, &MemorySink::new()).unwrap();

        assert!(!session.expire_notice(first));
        assert!(session.notice().is_some());
        let second = session.notice().unwrap().generation;
        assert!(session.expire_notice(second));
        assert!(session.notice().is_none());
    }

    #[tokio::test]
    async fn test_reload_clears_selection_by_default() {
        let mut session = session(SelectionReloadPolicy::Clear);
        session.toggle(&RecordId::Int(1)).unwrap();

        let loaded = session.reload(&StaticRecordSource::new(people())).await.unwrap();
        assert_eq!(loaded, 3);
        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn test_reload_intersects_when_configured() {
        let mut session = session(SelectionReloadPolicy::Intersect);
        session.toggle(&RecordId::Int(1)).unwrap();
        session.toggle(&RecordId::Int(3)).unwrap();

        let source = StaticRecordSource::new(json!([
            {"id": 3, "name": "Carlos Ruiz"},
            {"id": 4, "name": "Ana"}
        ]));
        session.reload(&source).await.unwrap();
        assert_eq!(session.selection().ids(), vec![RecordId::Int(3)]);
    }

    #[tokio::test]
    async fn test_failed_reload_shows_in_snapshot() {
        let mut session = session(SelectionReloadPolicy::Intersect);
        session.toggle(&RecordId::Int(1)).unwrap();

        let result = session.reload(&FailingSource).await;
        assert!(matches!(result, Err(DomainError::Load(LoadError::Status { status: 503, .. }))));

        let snapshot = session.snapshot();
        assert!(snapshot.records.is_empty());
        assert!(snapshot.selected_ids.is_empty());
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some(LOAD_FAILURE_MESSAGE));
    }

    #[test]
    fn test_split_reload_reports_loading_until_finished() {
        let mut session = session(SelectionReloadPolicy::Intersect);
        session.toggle(&RecordId::Int(2)).unwrap();

        session.begin_reload();
        let pending = session.snapshot();
        assert!(pending.loading);
        assert!(pending.error.is_none());
        // Current records stay visible while the fetch is out
        assert_eq!(pending.records.len(), 3);

        let loaded = session
            .finish_reload(Ok(json!([{"id": 2, "name": "María"}])))
            .unwrap();
        assert_eq!(loaded, 1);
        let done = session.snapshot();
        assert!(!done.loading);
        assert_eq!(done.selected_ids, vec![RecordId::Int(2)]);

        session.begin_reload();
        let result = session.finish_reload(Err(LoadError::Network("connection reset".to_string())));
        assert!(matches!(result, Err(DomainError::Load(LoadError::Network(_)))));
        assert!(!session.snapshot().loading);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_snapshot_serializes_for_host() {
        let mut session = session(SelectionReloadPolicy::Clear);
        session.toggle(&RecordId::Int(3)).unwrap();

        let value = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(value["selected_ids"], json!([3]));
        assert_eq!(value["records"][1], json!({"id": 2, "name": "María", "email": "maria@email.com", "age": 30}));
        assert_eq!(value["statistics"], json!({"uncategorized": 3}));
        assert_eq!(value["summary"]["total_records"], json!(3));
        assert_eq!(value["summary"]["selected"], json!(1));
        assert_eq!(value["notice"], json!(null));
        assert_eq!(value["loading"], json!(false));
        assert_eq!(value["chart_kind"], json!("bar"));

        session.set_chart_kind(ChartKind::Pie);
        assert_eq!(session.snapshot().chart_kind, ChartKind::Pie);
    }
}
