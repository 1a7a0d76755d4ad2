mod error;

pub use error::{ConfigError, DomainError, ExportError, LoadError, ValidationError};

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for remote loads
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for session operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for configuration parsing
pub type ConfigResult<T> = Result<T, ConfigError>;
