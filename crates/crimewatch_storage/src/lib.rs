#![forbid(unsafe_code)]

pub mod attachment_sink;
pub mod error;
pub mod record_store;

pub use attachment_sink::AttachmentSink;
pub use error::StorageError;
pub use record_store::{FlatRecord, RecordKind, RecordStore};
