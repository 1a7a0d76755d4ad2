pub mod export;
pub mod notification;
pub mod selection;
pub mod statistics;
pub mod store;
pub mod table;

pub use store::{RecordSource, RecordStore};
pub use table::TableSession;
