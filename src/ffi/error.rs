use std::fmt;
use serde::{Deserialize, Serialize};
use crate::errors::{ConfigError, DomainError, ExportError, LoadError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    Unknown = 1,
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InternalError = 6,

    // Domain errors (200-299)
    DomainGeneral = 200,
    RecordNotFound = 201,

    // Configuration errors (300-399)
    ConfigurationError = 310,

    // Export errors (500-599)
    ExportNoData = 500,
    ExportNoRecordsSelected = 501,
    ExportSerialization = 502,
    ExportSink = 503,

    // Load errors (600-699)
    LoadNetwork = 600,
    LoadStatus = 601,
    LoadParse = 602,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn null_pointer(what: &str) -> Self {
        Self::new(ErrorCode::NullPointer, &format!("Null pointer provided for {}", what))
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }
}

impl From<ExportError> for FFIError {
    fn from(err: ExportError) -> Self {
        let code = match &err {
            ExportError::NoData => ErrorCode::ExportNoData,
            ExportError::NoRecordsSelected => ErrorCode::ExportNoRecordsSelected,
            ExportError::Serialization(_) => ErrorCode::ExportSerialization,
            ExportError::Sink(_) => ErrorCode::ExportSink,
        };
        Self::new(code, &err.to_string())
    }
}

impl From<LoadError> for FFIError {
    fn from(err: LoadError) -> Self {
        match &err {
            LoadError::Network(_) => Self::new(ErrorCode::LoadNetwork, &err.to_string()),
            LoadError::Status { status, body } => {
                Self::with_details(ErrorCode::LoadStatus, &format!("HTTP status {}", status), body)
            }
            LoadError::Parse(_) => Self::new(ErrorCode::LoadParse, &err.to_string()),
        }
    }
}

impl From<ConfigError> for FFIError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorCode::ConfigurationError, &err.to_string())
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Export(e) => e.into(),
            DomainError::Load(e) => e.into(),
            DomainError::Config(e) => e.into(),
            DomainError::RecordNotFound(id) => {
                Self::new(ErrorCode::RecordNotFound, &format!("Record not found with ID {}", id))
            }
        }
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(err: std::ffi::NulError) -> Self {
        Self::with_details(ErrorCode::InvalidArgument, "String contains null bytes", &err.to_string())
    }
}

impl From<std::str::Utf8Error> for FFIError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::with_details(ErrorCode::InvalidUtf8, "Invalid UTF-8 string", &err.to_string())
    }
}

impl From<serde_json::Error> for FFIError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_details(ErrorCode::InvalidArgument, "Invalid JSON payload", &err.to_string())
    }
}

/// Result type for FFI operations
pub type FFIResult<T> = Result<T, FFIError>;
