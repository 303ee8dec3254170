use super::discovery::{self, CopyScope, PageDir, DRAFTS_DIR};
use crate::application::repositories::{CopyOptions, PageRecord, PageRepository, Storage};
use crate::domain::entities::PageFile;
use crate::domain::value_objects::{PageId, Slug, Template};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::storage::{PlainTextStorage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Page tree stored as nested directories below a content root.
///
/// A page's location encodes its state: `3_slug` is listed with num 3,
/// `slug` is unlisted and `_drafts/slug` is a draft. Content lives in
/// `.txt` files handled by [`PlainTextStorage`].
#[derive(Debug)]
pub struct FileSystemPageRepository {
    root: PathBuf,
    multilang: bool,
}

impl FileSystemPageRepository {
    /// Open a content root, creating it if it does not exist yet
    pub fn open(root: impl Into<PathBuf>, multilang: bool) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!("Opening content directory: {}", root.display());
        Ok(FileSystemPageRepository { root, multilang })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_of(&self, parent: Option<&PageId>, dir: &PageDir) -> Option<PageRecord> {
        let template = match discovery::detect_template(&dir.path, self.multilang) {
            Ok(Some(name)) => Template::new(name).ok()?,
            Ok(None) => Template::default(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", dir.path.display(), e);
                return None;
            }
        };

        match Slug::new(dir.slug.as_str()) {
            Ok(slug) => PageRecord::new(parent, slug, dir.num, dir.is_draft, template).ok(),
            Err(e) => {
                tracing::warn!("Skipping page directory {}: {}", dir.path.display(), e);
                None
            }
        }
    }

    /// Directory of an existing page, walking the id segment by segment
    fn dir_of(&self, id: &PageId) -> StorageResult<Option<PathBuf>> {
        let mut current = self.root.clone();
        for segment in id.segments() {
            let found = discovery::discover_page_dirs(&current)?
                .into_iter()
                .find(|dir| dir.slug == segment);
            match found {
                Some(dir) => current = dir.path,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn parent_dir(&self, parent: Option<&PageId>) -> DomainResult<PathBuf> {
        match parent {
            None => Ok(self.root.clone()),
            Some(id) => self.dir_of(id)?.ok_or_else(|| not_found(id)),
        }
    }

    /// Directory a record's location maps to
    fn target_dir(&self, record: &PageRecord) -> DomainResult<PathBuf> {
        let mut dir = self.parent_dir(record.parent_id().as_ref())?;
        if record.is_draft {
            dir.push(DRAFTS_DIR);
        }
        dir.push(discovery::dirname(record.num, record.slug.as_str()));
        Ok(dir)
    }

    fn existing_dir(&self, record: &PageRecord) -> DomainResult<PathBuf> {
        self.dir_of(&record.id)?.ok_or_else(|| not_found(&record.id))
    }

    fn ensure_free(&self, id: &PageId, except: Option<&Path>) -> DomainResult<()> {
        if let Some(existing) = self.dir_of(id)? {
            if Some(existing.as_path()) != except {
                return Err(duplicate(id));
            }
        }
        Ok(())
    }

    fn prune(dir: &Path) -> StorageResult<()> {
        if let Some(parent) = dir.parent() {
            discovery::prune_drafts_dir(parent)?;
        }
        Ok(())
    }
}

fn not_found(id: &PageId) -> DomainError {
    DomainError::not_found(
        "error.page.notFound",
        format!("The page \"{}\" cannot be found", id),
    )
}

fn duplicate(id: &PageId) -> DomainError {
    DomainError::duplicate(
        "error.page.duplicate",
        format!("A page with the id \"{}\" already exists", id),
    )
}

impl PageRepository for FileSystemPageRepository {
    fn kind(&self) -> &'static str {
        "file_system"
    }

    fn children_of(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>> {
        let dir = match parent {
            None => self.root.clone(),
            Some(id) => match self.dir_of(id)? {
                Some(dir) => dir,
                None => return Ok(Vec::new()),
            },
        };

        let dirs = discovery::discover_page_dirs(&dir).map_err(StorageError::from)?;
        Ok(dirs
            .iter()
            .filter_map(|page_dir| self.record_of(parent, page_dir))
            .collect())
    }

    fn find(&self, id: &PageId) -> DomainResult<Option<PageRecord>> {
        let parent = id.parent();
        Ok(self
            .children_of(parent.as_ref())?
            .into_iter()
            .find(|record| &record.id == id))
    }

    fn insert(&mut self, record: &PageRecord) -> DomainResult<()> {
        self.ensure_free(&record.id, None)?;
        let dir = self.target_dir(record)?;
        fs::create_dir_all(&dir).map_err(StorageError::from)?;
        tracing::debug!("Created page directory {}", dir.display());
        Ok(())
    }

    fn relocate(&mut self, from: &PageRecord, to: &PageRecord) -> DomainResult<()> {
        let source = self.existing_dir(from)?;
        self.ensure_free(&to.id, Some(&source))?;

        let target = self.target_dir(to)?;
        if target == source {
            return Ok(());
        }
        if target.exists() {
            return Err(duplicate(&to.id));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(StorageError::from)?;
        }
        fs::rename(&source, &target).map_err(StorageError::from)?;
        Self::prune(&source)?;

        tracing::debug!("Moved {} to {}", source.display(), target.display());
        Ok(())
    }

    fn remove(&mut self, record: &PageRecord) -> DomainResult<()> {
        let dir = self.existing_dir(record)?;
        fs::remove_dir_all(&dir).map_err(StorageError::from)?;
        Self::prune(&dir)?;
        Ok(())
    }

    fn copy(&mut self, from: &PageRecord, to: &PageRecord, options: CopyOptions) -> DomainResult<()> {
        let source = self.existing_dir(from)?;
        self.ensure_free(&to.id, None)?;

        let target = self.target_dir(to)?;
        if target.exists() {
            return Err(duplicate(&to.id));
        }

        let scope = CopyScope {
            children: options.children,
            files: options.files,
        };
        discovery::copy_page_dir(&source, &target, scope).map_err(StorageError::from)?;
        Ok(())
    }

    fn files(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>> {
        let dir = match self.dir_of(&record.id)? {
            Some(dir) => dir,
            None => return Ok(Vec::new()),
        };

        Ok(discovery::page_files(&dir)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|name| PageFile::new(record.id.clone(), name))
            .collect())
    }

    fn storage(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>> {
        let dir = match self.dir_of(&record.id)? {
            Some(dir) => dir,
            None => self.target_dir(record)?,
        };
        Ok(Box::new(PlainTextStorage::new(
            dir,
            record.template.clone(),
            self.multilang,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, num: Option<i64>, is_draft: bool) -> PageRecord {
        let id = PageId::new(id).unwrap();
        PageRecord::new(
            id.parent().as_ref(),
            Slug::new(id.last_segment()).unwrap(),
            num,
            is_draft,
            Template::default(),
        )
        .unwrap()
    }

    fn repository() -> (TempDir, FileSystemPageRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSystemPageRepository::open(temp_dir.path(), false).unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_insert_encodes_status_in_directory_name() {
        let (temp_dir, mut repo) = repository();

        repo.insert(&record("a", Some(1), false)).unwrap();
        repo.insert(&record("b", None, false)).unwrap();
        repo.insert(&record("c", None, true)).unwrap();

        assert!(temp_dir.path().join("1_a").is_dir());
        assert!(temp_dir.path().join("b").is_dir());
        assert!(temp_dir.path().join("_drafts/c").is_dir());

        let children = repo.children_of(None).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2].status(), crate::domain::value_objects::Status::Draft);
    }

    #[test]
    fn test_detects_template_from_content_file() {
        let (temp_dir, repo) = repository();
        fs::create_dir_all(temp_dir.path().join("1_blog")).unwrap();
        fs::write(temp_dir.path().join("1_blog/blog.txt"), "Title: Blog").unwrap();

        let found = repo.find(&PageId::new("blog").unwrap()).unwrap().unwrap();
        assert_eq!(found.template.as_str(), "blog");
        assert_eq!(found.num, Some(1));
    }

    #[test]
    fn test_insert_duplicate_id() {
        let (_temp_dir, mut repo) = repository();
        repo.insert(&record("a", None, true)).unwrap();

        let err = repo.insert(&record("a", Some(2), false)).unwrap_err();
        assert_eq!(err.key(), "error.page.duplicate");
    }

    #[test]
    fn test_relocate_publishes_and_prunes_drafts() {
        let (temp_dir, mut repo) = repository();
        let draft = record("a", None, true);
        repo.insert(&draft).unwrap();
        repo.insert(&record("a/child", None, false)).unwrap();

        repo.relocate(&draft, &draft.published().with_num(Some(2))).unwrap();

        assert!(temp_dir.path().join("2_a/child").is_dir());
        assert!(!temp_dir.path().join(DRAFTS_DIR).exists());
        assert!(repo.find(&PageId::new("a/child").unwrap()).unwrap().is_some());
    }

    #[test]
    fn test_relocate_missing_source() {
        let (_temp_dir, mut repo) = repository();
        let missing = record("ghost", None, false);

        let err = repo.relocate(&missing, &missing.with_num(Some(1))).unwrap_err();
        assert_eq!(err.key(), "error.page.notFound");
    }

    #[test]
    fn test_copy_without_children() {
        let (temp_dir, mut repo) = repository();
        let source = record("a", Some(1), false);
        repo.insert(&source).unwrap();
        repo.insert(&record("a/child", None, false)).unwrap();
        fs::write(temp_dir.path().join("1_a/default.txt"), "Title: A").unwrap();
        fs::write(temp_dir.path().join("1_a/cover.jpg"), "").unwrap();

        let target = record("a-copy", None, true);
        repo.copy(&source, &target, CopyOptions::default()).unwrap();

        let copy_dir = temp_dir.path().join("_drafts/a-copy");
        assert!(copy_dir.join("default.txt").is_file());
        assert!(!copy_dir.join("child").exists());
        assert!(repo.files(&target).unwrap().is_empty());
        assert_eq!(repo.files(&source).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_subtree() {
        let (temp_dir, mut repo) = repository();
        let page = record("a", None, true);
        repo.insert(&page).unwrap();
        repo.insert(&record("a/child", None, false)).unwrap();

        repo.remove(&page).unwrap();

        assert!(!temp_dir.path().join("_drafts").exists());
        assert!(repo.children_of(None).unwrap().is_empty());
    }

    #[test]
    fn test_children_of_missing_parent_is_empty() {
        let (_temp_dir, repo) = repository();
        let children = repo.children_of(Some(&PageId::new("nope").unwrap())).unwrap();
        assert!(children.is_empty());
    }
}
