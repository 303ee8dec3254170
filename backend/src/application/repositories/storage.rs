use crate::domain::storage::Storage;

/// Storage backend families a page can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// A fresh in-memory storage
    Memory,
    /// The repository's native storage at the page's location
    Repository,
}

/// Target of `change_storage` / `move_to_storage`
#[derive(Debug)]
pub enum StorageTarget {
    Kind(StorageKind),
    Instance(Box<dyn Storage>),
}

impl From<StorageKind> for StorageTarget {
    fn from(kind: StorageKind) -> Self {
        StorageTarget::Kind(kind)
    }
}

impl From<Box<dyn Storage>> for StorageTarget {
    fn from(storage: Box<dyn Storage>) -> Self {
        StorageTarget::Instance(storage)
    }
}
