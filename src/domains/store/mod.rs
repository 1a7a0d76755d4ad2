pub mod service;
pub mod source;

pub use service::{RecordStore, LOAD_FAILURE_MESSAGE};
pub use source::{
    posts_to_documents, HttpRecordSource, PostsDocumentSource, RecordSource, StaticRecordSource,
    DEFAULT_SOURCE_URL,
};
