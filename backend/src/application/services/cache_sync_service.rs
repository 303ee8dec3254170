/// Keeps the in-memory page caches in step with edits made directly on disk
use crate::domain::base::DomainError;
use crate::domain::entities::Site;
use crate::domain::value_objects::PageId;
use crate::infrastructure::file_system::{
    parse_dirname, ContentWatcher, FileEvent, FileEventKind, WatcherError, DRAFTS_DIR,
};
use crate::infrastructure::storage::CHANGES_DIR;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheSyncError {
    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheSyncResult<T> = Result<T, CacheSyncError>;

/// Callback type for sync events
pub type SyncCallback = Rc<dyn Fn(SyncEvent)>;

#[derive(Debug, Clone)]
pub enum SyncEvent {
    SyncStarted,
    /// `page_id` is `None` when the site's own listing was refreshed
    CachePurged {
        path: PathBuf,
        page_id: Option<PageId>,
    },
    SyncCompleted(SyncStats),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub modified: usize,
    pub deleted: usize,
}

/// Map a path inside the content root to the id of the page directory holding it.
///
/// Returns `Ok(None)` for paths that belong to the site itself and `Err` for
/// paths outside the root.
pub fn page_id_for(root: &Path, path: &Path) -> Result<Option<PageId>, DomainError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        DomainError::invalid_value(
            "error.sync.outsideRoot",
            format!("{} is not inside {}", path.display(), root.display()),
        )
    })?;

    let mut segments: Vec<String> = Vec::new();
    let mut components: Vec<Component> = relative.components().collect();

    // a content file belongs to the directory around it
    if relative.extension().is_some() {
        components.pop();
    }

    for component in components {
        let Some(name) = component.as_os_str().to_str() else {
            continue;
        };
        if name == DRAFTS_DIR {
            continue;
        }
        if name == CHANGES_DIR {
            break;
        }
        let (_, slug) = parse_dirname(name);
        segments.push(slug.to_string());
    }

    if segments.is_empty() {
        Ok(None)
    } else {
        PageId::new(segments.join("/")).map(Some)
    }
}

/// Watches a content directory and purges the cached listings of the pages
/// whose directories changed underneath them
pub struct CacheSyncService {
    site: Rc<Site>,
    watcher: ContentWatcher,
}

impl CacheSyncService {
    pub fn new(site: Rc<Site>, root: &Path, debounce_duration: Option<Duration>) -> CacheSyncResult<Self> {
        let debounce = debounce_duration.unwrap_or(Duration::from_millis(500));
        let watcher = ContentWatcher::new(root, debounce)?;
        Ok(CacheSyncService { site, watcher })
    }

    /// Block on the watcher and sync every batch until the watcher goes away
    pub fn run(&self, callback: Option<SyncCallback>) -> CacheSyncResult<()> {
        tracing::info!("Starting cache sync for {}", self.watcher.root().display());

        if let Some(ref cb) = callback {
            cb(SyncEvent::SyncStarted);
        }

        loop {
            if let Some(events) = self.watcher.recv() {
                self.process_events(events, callback.as_ref());
            }

            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Sync whatever the watcher has collected so far, without blocking
    pub fn poll(&self, callback: Option<&SyncCallback>) -> Option<SyncStats> {
        self.watcher
            .try_recv()
            .map(|events| self.process_events(events, callback))
    }

    /// Purge the caches touched by a batch of file events
    pub fn process_events(&self, events: Vec<FileEvent>, callback: Option<&SyncCallback>) -> SyncStats {
        let mut stats = SyncStats::default();

        for event in events {
            match self.purge_for(&event.path) {
                Ok(page_id) => {
                    match event.kind {
                        FileEventKind::Modified => stats.modified += 1,
                        FileEventKind::Deleted => stats.deleted += 1,
                    }
                    if let Some(cb) = callback {
                        cb(SyncEvent::CachePurged {
                            path: event.path.clone(),
                            page_id,
                        });
                    }
                }
                Err(e) => tracing::warn!("Failed to sync {}: {}", event.path.display(), e),
            }
        }

        tracing::debug!(
            "Synced {} modified and {} deleted paths",
            stats.modified,
            stats.deleted
        );

        if let Some(cb) = callback {
            cb(SyncEvent::SyncCompleted(stats));
        }
        stats
    }

    /// A page directory changed: its parent's listing is stale, and so is
    /// its own listing of children
    fn purge_for(&self, path: &Path) -> Result<Option<PageId>, DomainError> {
        let page_id = page_id_for(self.watcher.root(), path)?;

        let Some(id) = page_id.as_ref() else {
            self.site.purge();
            return Ok(None);
        };

        if let Some(page) = self.site.find_page_or_draft(id.as_str())? {
            page.purge();
        }

        match id.parent() {
            Some(parent_id) => match self.site.find_page_or_draft(parent_id.as_str())? {
                Some(parent) => parent.purge(),
                None => self.site.purge(),
            },
            None => self.site.purge(),
        }

        Ok(page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_for_content_file() {
        let root = Path::new("/content");

        let id = page_id_for(root, Path::new("/content/1_blog/_drafts/post/article.txt")).unwrap();
        assert_eq!(id.unwrap().as_str(), "blog/post");

        let id = page_id_for(root, Path::new("/content/2_about")).unwrap();
        assert_eq!(id.unwrap().as_str(), "about");
    }

    #[test]
    fn test_page_id_for_site_files() {
        let root = Path::new("/content");

        assert!(page_id_for(root, Path::new("/content/site.txt")).unwrap().is_none());
        assert!(page_id_for(root, Path::new("/content/_drafts")).unwrap().is_none());
    }

    #[test]
    fn test_page_id_for_changes_version() {
        let root = Path::new("/content");
        let id = page_id_for(root, Path::new("/content/1_a/_changes/default.txt")).unwrap();
        assert_eq!(id.unwrap().as_str(), "a");
    }

    #[test]
    fn test_page_id_outside_root() {
        let err = page_id_for(Path::new("/content"), Path::new("/elsewhere/a.txt")).unwrap_err();
        assert_eq!(err.key(), "error.sync.outsideRoot");
    }
}
