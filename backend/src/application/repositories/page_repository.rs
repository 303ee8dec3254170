use crate::domain::entities::PageFile;
use crate::domain::records::PageRecord;
use crate::domain::storage::Storage;
use crate::domain::value_objects::PageId;
use crate::domain::DomainResult;

/// What `copy` takes along besides the page's own content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    pub children: bool,
    pub files: bool,
}

/// Repository trait for the structural inventory of the page tree.
///
/// The repository knows which pages exist, where they live and how their
/// location encodes status and sorting number. Content itself is read and
/// written through the [`Storage`] handles it hands out.
pub trait PageRepository {
    /// Short backend name used in log output
    fn kind(&self) -> &'static str;

    /// Direct children of a page, drafts included, in repository order.
    ///
    /// `None` lists the top-level pages of the site.
    fn children_of(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>>;

    /// Finds a page or draft by its id.
    ///
    /// Returns `Ok(None)` if no such page exists.
    fn find(&self, id: &PageId) -> DomainResult<Option<PageRecord>>;

    /// Creates the location for a new page without any content.
    fn insert(&mut self, record: &PageRecord) -> DomainResult<()>;

    /// Moves a page and its whole subtree from one location to another.
    ///
    /// Covers renames, status changes, re-numbering and parent changes.
    fn relocate(&mut self, from: &PageRecord, to: &PageRecord) -> DomainResult<()>;

    /// Removes a page, its content, its files and all descendants.
    fn remove(&mut self, record: &PageRecord) -> DomainResult<()>;

    /// Copies a page's content to a new location, optionally with its
    /// descendants and files.
    fn copy(&mut self, from: &PageRecord, to: &PageRecord, options: CopyOptions) -> DomainResult<()>;

    /// Files attached to a page.
    fn files(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>>;

    /// The native content storage for a page location.
    fn storage(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>>;

    /// All pages below `parent`, depth first, drafts included.
    fn descendants_of(&self, parent: &PageId) -> DomainResult<Vec<PageRecord>> {
        let mut result = Vec::new();
        for child in self.children_of(Some(parent))? {
            let grandchildren = self.descendants_of(&child.id)?;
            result.push(child);
            result.extend(grandchildren);
        }
        Ok(result)
    }
}
