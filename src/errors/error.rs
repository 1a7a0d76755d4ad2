use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RecordId;

/// Why a raw record was turned away by the validator
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Input is not an array of records")]
    NotAnArray,

    #[error("Record is not an object")]
    NotAnObject,

    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields {
        fields: Vec<String>,
    },

    #[error("Field 'id' must be an integer or a string")]
    InvalidId,

    #[error("Duplicate record id {id}")]
    DuplicateId {
        id: RecordId,
    },
}

impl ValidationError {
    pub fn missing(fields: Vec<String>) -> Self {
        Self::MissingFields { fields }
    }

    pub fn duplicate(id: RecordId) -> Self {
        Self::DuplicateId { id }
    }
}

/// Errors raised while producing or delivering an export
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum ExportError {
    #[error("No data available to export")]
    NoData,

    /// Only reachable through an internal inconsistency; the full record set
    /// is the fallback whenever nothing is selected.
    #[error("No records available to export")]
    NoRecordsSelected,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Export sink error: {0}")]
    Sink(String),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Serialization(format!("Workbook container: {}", err))
    }
}

/// Remote load failures
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned error {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LoadError::Parse(err.to_string())
        } else {
            LoadError::Network(err.to_string())
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue {
        key: String,
        reason: String,
    },

    #[error("Invalid configuration document: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn invalid_value(key: &str, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors surfaced by the table session to its host
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record not found with ID {0}")]
    RecordNotFound(RecordId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_every_field() {
        let err = ValidationError::missing(vec!["category".to_string(), "date".to_string()]);
        assert_eq!(err.to_string(), "Missing required fields: category, date");
    }

    #[test]
    fn test_domain_error_wraps_export_error() {
        let err: DomainError = ExportError::NoData.into();
        assert_eq!(err.to_string(), "Export error: No data available to export");
    }

    #[test]
    fn test_export_error_serializes_with_type_tag() {
        let json = serde_json::to_value(ExportError::Sink("disk full".to_string())).unwrap();
        assert_eq!(json["type"], "sink");
        assert_eq!(json["message"], "disk full");
    }
}
