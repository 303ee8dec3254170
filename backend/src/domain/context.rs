/// What models need from the tree they belong to
use super::base::DomainResult;
use super::blueprint::Blueprint;
use super::entities::{Languages, PageFile, Site};
use super::records::PageRecord;
use super::storage::Storage;
use super::value_objects::{LanguageCode, PageId, Template};
use std::any::Any;
use std::rc::Rc;

/// Lookups shared by every page and the site of one content tree.
///
/// Models only read through the context; all writes happen in the
/// lifecycle operations that own the implementation.
pub trait ModelContext {
    fn site(&self) -> DomainResult<Rc<Site>>;

    fn languages(&self) -> &Languages;

    fn default_language(&self) -> LanguageCode;

    /// The language content is read in when none is given
    fn language(&self) -> LanguageCode;

    fn blueprint(&self, template: &Template) -> Blueprint;

    /// A page or draft by id, `Ok(None)` if there is none
    fn find_record(&self, id: &PageId) -> DomainResult<Option<PageRecord>>;

    /// Direct children of a page or of the site, drafts included
    fn child_records(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>>;

    /// The native storage at a page location
    fn storage_for(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>>;

    fn files_of(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>>;

    fn as_any(&self) -> &dyn Any;
}
