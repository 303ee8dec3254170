/// Content storage backends
mod memory;
mod plain_text;

pub use memory::MemoryStorage;
pub use plain_text::{PlainTextStorage, CHANGES_DIR};

use crate::domain::base::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid layout: {0}")]
    Layout(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::storage(err.to_string())
    }
}
