pub mod cms;
pub mod config;
pub mod dto;
pub mod repositories;
pub mod rules;
pub mod services;
pub mod use_cases;

// Re-export key types to avoid naming conflicts
pub use cms::{Cms, CmsBuilder, Kernel};
pub use config::{BackendConfig, CmsConfig, ConfigError, LanguageConfig};
pub use dto::{DuplicateOptions, PageInput};
pub use repositories::{CopyOptions, PageRecord, PageRepository, Storage, StorageKind, StorageTarget};
pub use rules::{AllowAll, PageAction, PageRules, Permissions, PermissionsFn};
pub use services::{
    CacheSyncError, CacheSyncService, Hook, HookDispatcher, HookRegistry, SyncCallback, SyncEvent,
    SyncStats,
};
