use crate::domains::export::{CsvConfig, ExportEngine, DEFAULT_SHEET_NAME};
use crate::domains::selection::SelectionReloadPolicy;
use crate::domains::statistics::ChartKind;
use crate::domains::store::{HttpRecordSource, PostsDocumentSource, RecordSource, DEFAULT_SOURCE_URL};
use crate::errors::{ConfigError, ConfigResult};
use crate::types::ColumnDescriptor;
use crate::validation::{Validator, DEFAULT_REQUIRED_FIELDS};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix for every environment override
pub const ENV_PREFIX: &str = "RECORD_TABLE_";

/// Settings for one table session. Every field has a default, so a host can
/// send a partial JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub required_fields: Vec<String>,
    pub category_field: String,
    pub notice_ttl_secs: u64,
    pub sheet_name: String,
    pub csv_delimiter: char,
    pub csv_include_bom: bool,
    pub source_url: String,
    pub request_timeout_secs: u64,
    /// Reshape placeholder posts into dashboard documents after fetching
    pub adapt_posts: bool,
    pub reload_policy: SelectionReloadPolicy,
    pub chart_kind: ChartKind,
    /// Export projection; empty means every field
    pub columns: Vec<ColumnDescriptor>,
    pub export_dir: Option<PathBuf>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            category_field: "category".to_string(),
            notice_ttl_secs: 4,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            csv_delimiter: ',',
            csv_include_bom: false,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout_secs: 30,
            adapt_posts: true,
            reload_policy: SelectionReloadPolicy::Clear,
            chart_kind: ChartKind::Bar,
            columns: Vec::new(),
            export_dir: None,
        }
    }
}

impl TableConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `.env` and `RECORD_TABLE_*` variables
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` yields for each
    /// `RECORD_TABLE_*` key
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(fields) = var("REQUIRED_FIELDS") {
            config.required_fields = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(field) = var("CATEGORY_FIELD") {
            config.category_field = field;
        }
        if let Some(ttl) = var("NOTICE_TTL_SECS") {
            config.notice_ttl_secs = parse_number("NOTICE_TTL_SECS", &ttl)?;
        }
        if let Some(name) = var("SHEET_NAME") {
            config.sheet_name = name;
        }
        if let Some(delimiter) = var("CSV_DELIMITER") {
            let mut chars = delimiter.chars();
            config.csv_delimiter = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError::invalid_value(
                        "CSV_DELIMITER",
                        "expected a single character",
                    ))
                }
            };
        }
        if let Some(bom) = var("CSV_BOM") {
            config.csv_include_bom = parse_flag("CSV_BOM", &bom)?;
        }
        if let Some(url) = var("SOURCE_URL") {
            config.source_url = url;
        }
        if let Some(timeout) = var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(adapt) = var("ADAPT_POSTS") {
            config.adapt_posts = parse_flag("ADAPT_POSTS", &adapt)?;
        }
        if let Some(policy) = var("RELOAD_POLICY") {
            config.reload_policy = match policy.to_ascii_lowercase().as_str() {
                "clear" => SelectionReloadPolicy::Clear,
                "intersect" => SelectionReloadPolicy::Intersect,
                _ => {
                    return Err(ConfigError::invalid_value(
                        "RELOAD_POLICY",
                        "expected 'clear' or 'intersect'",
                    ))
                }
            };
        }
        if let Some(kind) = var("CHART_KIND") {
            config.chart_kind = match kind.to_ascii_lowercase().as_str() {
                "bar" => ChartKind::Bar,
                "pie" => ChartKind::Pie,
                _ => return Err(ConfigError::invalid_value("CHART_KIND", "expected 'bar' or 'pie'")),
            };
        }
        if let Some(dir) = var("EXPORT_DIR") {
            config.export_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        debug!("Loaded table config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.category_field.trim().is_empty() {
            return Err(ConfigError::invalid_value("category_field", "must not be empty"));
        }
        if !self.csv_delimiter.is_ascii() || matches!(self.csv_delimiter, '"' | '\r' | '\n') {
            return Err(ConfigError::invalid_value(
                "csv_delimiter",
                "must be an ASCII character other than the quote or a line break",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value("request_timeout_secs", "must be positive"));
        }
        if self.columns.iter().any(|c| c.key.is_empty()) {
            return Err(ConfigError::invalid_value("columns", "column keys must not be empty"));
        }
        Ok(())
    }

    pub fn validator(&self) -> Validator {
        Validator::new(&self.required_fields)
    }

    pub fn csv_config(&self) -> ConfigResult<CsvConfig> {
        let delimiter = u8::try_from(self.csv_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::invalid_value("csv_delimiter", "must be a single ASCII byte"))?;
        Ok(CsvConfig {
            delimiter,
            include_bom: self.csv_include_bom,
            ..CsvConfig::default()
        })
    }

    pub fn export_engine(&self) -> ConfigResult<ExportEngine> {
        Ok(ExportEngine::new(self.csv_config()?, &self.sheet_name))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The remote source this config points at
    pub fn record_source(&self) -> Box<dyn RecordSource> {
        let http = HttpRecordSource::new(&self.source_url, self.request_timeout());
        if self.adapt_posts {
            Box::new(PostsDocumentSource::new(http))
        } else {
            Box::new(http)
        }
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid_value(key, &e.to_string()))
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, "expected a boolean")),
    }
}
