pub mod page_repository;
pub mod storage;

pub use crate::domain::records::PageRecord;
pub use crate::domain::storage::Storage;
pub use page_repository::{CopyOptions, PageRepository};
pub use storage::{StorageKind, StorageTarget};
