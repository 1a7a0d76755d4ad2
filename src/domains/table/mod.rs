pub mod service;
pub mod types;

pub use service::TableSession;
pub use types::{export_failure_notice, export_success_notice, TableSnapshot, NO_DATA_NOTICE};
