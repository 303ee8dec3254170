pub mod discovery;
mod fs_page_repository;
pub mod watcher;

pub use discovery::{discover_page_dirs, parse_dirname, PageDir, DRAFTS_DIR};
pub use fs_page_repository::FileSystemPageRepository;
pub use watcher::{ContentWatcher, FileEvent, FileEventKind, WatcherError};
