pub mod cache_sync_service;
pub mod hook_dispatcher;

pub use cache_sync_service::{
    page_id_for, CacheSyncError, CacheSyncResult, CacheSyncService, SyncCallback, SyncEvent,
    SyncStats,
};
pub use hook_dispatcher::{Hook, HookDispatcher, HookHandler, HookRegistry};
