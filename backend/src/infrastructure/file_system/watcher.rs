/// File system watcher for a content directory using the notify crate
use crate::infrastructure::storage::CHANGES_DIR;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Simplified file event representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Modified,
    Deleted,
}

impl FileEvent {
    /// Content files (`.txt`) and page directories; attached files are ignored
    pub fn is_content(&self) -> bool {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => ext == "txt",
            None => self.kind == FileEventKind::Deleted || self.path.is_dir(),
        }
    }

    /// Whether the event touches a `_changes` version directory or a hidden
    /// entry below `root`
    pub fn is_ignored(&self, root: &Path) -> bool {
        let relative = self.path.strip_prefix(root).unwrap_or(&self.path);
        relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .map(|name| name == CHANGES_DIR || name.starts_with('.'))
                .unwrap_or(false)
        })
    }
}

/// Debounced watcher over a content root
pub struct ContentWatcher {
    root: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
    receiver: Receiver<DebounceEventResult>,
}

impl ContentWatcher {
    /// Watch `path` recursively, batching changes within `debounce_duration`
    pub fn new(path: &Path, debounce_duration: Duration) -> Result<Self, WatcherError> {
        let root = path.canonicalize()?;
        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer = new_debouncer(debounce_duration, tx)?;
        debouncer.watcher().watch(&root, RecursiveMode::Recursive)?;

        tracing::info!("Watching content directory: {}", path.display());

        Ok(ContentWatcher {
            root,
            _debouncer: debouncer,
            receiver: rx,
        })
    }

    /// Get the next batch of file events (non-blocking)
    pub fn try_recv(&self) -> Option<Vec<FileEvent>> {
        match self.receiver.try_recv() {
            Ok(result) => self.convert_batch(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("File watcher disconnected");
                None
            }
        }
    }

    /// Wait for the next batch of file events (blocking)
    pub fn recv(&self) -> Option<Vec<FileEvent>> {
        match self.receiver.recv() {
            Ok(result) => self.convert_batch(result),
            Err(_) => {
                tracing::error!("File watcher disconnected");
                None
            }
        }
    }

    /// Wait at most `timeout` for the next batch of file events
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<FileEvent>> {
        self.receiver
            .recv_timeout(timeout)
            .ok()
            .and_then(|result| self.convert_batch(result))
    }

    /// Canonical root the watcher was registered on
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn convert_batch(&self, result: DebounceEventResult) -> Option<Vec<FileEvent>> {
        match result {
            Ok(events) => {
                let file_events: Vec<FileEvent> =
                    events.into_iter().filter_map(|e| self.convert_event(e)).collect();

                if file_events.is_empty() {
                    None
                } else {
                    Some(file_events)
                }
            }
            Err(error) => {
                tracing::error!("File watcher error: {:?}", error);
                None
            }
        }
    }

    /// Debounced events only say "something changed"; existence decides the kind
    fn convert_event(&self, event: DebouncedEvent) -> Option<FileEvent> {
        let kind = if event.path.exists() {
            FileEventKind::Modified
        } else {
            FileEventKind::Deleted
        };
        let event = FileEvent {
            path: event.path,
            kind,
        };

        if event.is_content() && !event.is_ignored(&self.root) {
            Some(event)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(path: &str, kind: FileEventKind) -> FileEvent {
        FileEvent {
            path: PathBuf::from(path),
            kind,
        }
    }

    #[test]
    fn test_file_event_is_content() {
        assert!(event("/content/1_blog/blog.txt", FileEventKind::Modified).is_content());
        assert!(event("/content/1_blog", FileEventKind::Deleted).is_content());
        assert!(!event("/content/1_blog/cover.jpg", FileEventKind::Modified).is_content());
    }

    #[test]
    fn test_file_event_is_ignored() {
        let root = Path::new("/tmp/.tmp123/content");
        let ignored = |path: &str| event(path, FileEventKind::Modified).is_ignored(root);

        assert!(ignored("/tmp/.tmp123/content/1_blog/_changes/blog.txt"));
        assert!(ignored("/tmp/.tmp123/content/.git/HEAD"));
        assert!(!ignored("/tmp/.tmp123/content/_drafts/a/default.txt"));
    }
}
