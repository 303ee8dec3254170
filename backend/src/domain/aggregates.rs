/// Page aggregate root
use super::base::{DomainError, DomainResult, Entity};
use super::blueprint::Blueprint;
use super::collections::{ChildCache, ChildSource, Pages};
use super::content::{Content, Fields, Translation};
use super::context::ModelContext;
use super::entities::{PageFile, Site};
use super::records::PageRecord;
use super::storage::Storage;
use super::value_objects::{LanguageCode, PageId, PageUuid, Slug, Status, Template, VersionId};
use std::fmt;
use std::rc::{Rc, Weak};

/// How a page reaches its parent.
///
/// Parents are never owned by their children. A page parent that has been
/// dropped is reloaded from the repository by id.
#[derive(Clone)]
pub enum ParentLink {
    Site,
    Page { page: Weak<Page>, id: PageId },
}

impl ParentLink {
    pub fn to_page(page: &Rc<Page>) -> ParentLink {
        ParentLink::Page {
            page: Rc::downgrade(page),
            id: page.id().clone(),
        }
    }

    /// Link for a page whose parent lives at `parent_id`
    pub fn for_parent_id(parent_id: Option<PageId>) -> ParentLink {
        match parent_id {
            Some(id) => ParentLink::Page {
                page: Weak::new(),
                id,
            },
            None => ParentLink::Site,
        }
    }

    pub fn resolve(&self, context: &Rc<dyn ModelContext>) -> DomainResult<ParentModel> {
        match self {
            ParentLink::Site => Ok(ParentModel::Site(context.site()?)),
            ParentLink::Page { page, id } => {
                if let Some(page) = page.upgrade() {
                    return Ok(ParentModel::Page(page));
                }

                let record = context.find_record(id)?.ok_or_else(|| {
                        DomainError::not_found(
                            "error.page.notFound",
                            format!("The page \"{}\" cannot be found", id),
                        )
                    })?;
                let link = ParentLink::for_parent_id(record.parent_id());
                Ok(ParentModel::Page(Page::from_record(context, link, record)?))
            }
        }
    }
}

/// The owner of a page: the site or another page
#[derive(Clone)]
pub enum ParentModel {
    Site(Rc<Site>),
    Page(Rc<Page>),
}

impl ParentModel {
    pub fn children(&self) -> DomainResult<Pages> {
        match self {
            ParentModel::Site(site) => site.children(),
            ParentModel::Page(page) => page.children(),
        }
    }

    pub fn drafts(&self) -> DomainResult<Pages> {
        match self {
            ParentModel::Site(site) => site.drafts(),
            ParentModel::Page(page) => page.drafts(),
        }
    }

    pub fn children_and_drafts(&self) -> DomainResult<Pages> {
        match self {
            ParentModel::Site(site) => site.children_and_drafts(),
            ParentModel::Page(page) => page.children_and_drafts(),
        }
    }

    pub fn purge(&self) {
        match self {
            ParentModel::Site(site) => site.purge(),
            ParentModel::Page(page) => page.purge(),
        }
    }

    pub fn context(&self) -> &Rc<dyn ModelContext> {
        match self {
            ParentModel::Site(site) => site.context(),
            ParentModel::Page(page) => page.context(),
        }
    }

    /// `None` for the site
    pub fn page_id(&self) -> Option<&PageId> {
        match self {
            ParentModel::Site(_) => None,
            ParentModel::Page(page) => Some(page.id()),
        }
    }

    pub fn as_page(&self) -> Option<&Rc<Page>> {
        match self {
            ParentModel::Site(_) => None,
            ParentModel::Page(page) => Some(page),
        }
    }

    /// Link to hand to a child of this model
    pub fn link(&self) -> ParentLink {
        match self {
            ParentModel::Site(_) => ParentLink::Site,
            ParentModel::Page(page) => ParentLink::to_page(page),
        }
    }

    /// Whether both refer to the same position in the tree
    pub fn is(&self, other: &ParentModel) -> bool {
        self.page_id() == other.page_id()
    }
}

impl From<Rc<Page>> for ParentModel {
    fn from(page: Rc<Page>) -> Self {
        ParentModel::Page(page)
    }
}

impl From<Rc<Site>> for ParentModel {
    fn from(site: Rc<Site>) -> Self {
        ParentModel::Site(site)
    }
}

/// A content page.
///
/// Pages are immutable: every lifecycle operation returns a new instance and
/// leaves the old one describing the state before the change. The child
/// collections are the only state that changes after construction.
pub struct Page {
    context: Rc<dyn ModelContext>,
    me: Weak<Page>,
    parent: ParentLink,
    record: PageRecord,
    storage: Box<dyn Storage>,
    custom_storage: bool,
    children: ChildCache,
}

impl Page {
    /// Build a page bound to an explicit storage
    pub(crate) fn new(
        context: Rc<dyn ModelContext>,
        parent: ParentLink,
        record: PageRecord,
        storage: Box<dyn Storage>,
        custom_storage: bool,
    ) -> Rc<Page> {
        Rc::new_cyclic(|me| Page {
            context,
            me: me.clone(),
            parent,
            record,
            storage,
            custom_storage,
            children: ChildCache::default(),
        })
    }

    /// Build a page bound to the repository's native storage
    pub(crate) fn from_record(
        context: &Rc<dyn ModelContext>,
        parent: ParentLink,
        record: PageRecord,
    ) -> DomainResult<Rc<Page>> {
        let storage = context.storage_for(&record)?;
        Ok(Page::new(context.clone(), parent, record, storage, false))
    }

    pub(crate) fn this(&self) -> DomainResult<Rc<Page>> {
        self.me.upgrade().ok_or_else(|| {
            DomainError::logic(
                "error.page.detached",
                format!("The page \"{}\" is no longer available", self.record.id),
            )
        })
    }

    pub fn context(&self) -> &Rc<dyn ModelContext> {
        &self.context
    }

    pub fn record(&self) -> &PageRecord {
        &self.record
    }

    pub fn id(&self) -> &PageId {
        &self.record.id
    }

    pub fn slug(&self) -> &Slug {
        &self.record.slug
    }

    pub fn num(&self) -> Option<i64> {
        self.record.num
    }

    pub fn template(&self) -> &Template {
        &self.record.template
    }

    pub fn status(&self) -> Status {
        self.record.status()
    }

    pub fn is_draft(&self) -> bool {
        self.record.is_draft
    }

    pub fn is_listed(&self) -> bool {
        self.status() == Status::Listed
    }

    pub fn is_unlisted(&self) -> bool {
        self.status() == Status::Unlisted
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Whether the storage was chosen explicitly instead of the repository's
    pub fn has_custom_storage(&self) -> bool {
        self.custom_storage
    }

    pub fn blueprint(&self) -> Blueprint {
        self.context.blueprint(self.template())
    }

    pub(crate) fn parent_link(&self) -> &ParentLink {
        &self.parent
    }

    pub fn parent(&self) -> DomainResult<Option<Rc<Page>>> {
        match self.parent_model()? {
            ParentModel::Page(page) => Ok(Some(page)),
            ParentModel::Site(_) => Ok(None),
        }
    }

    pub fn parent_model(&self) -> DomainResult<ParentModel> {
        self.parent.resolve(&self.context)
    }

    /// Published siblings, this page included when it is published
    pub fn siblings(&self) -> DomainResult<Pages> {
        self.parent_model()?.children()
    }

    /// Whether `other` lies below this page
    pub fn is_ancestor_of(&self, other: &Page) -> bool {
        other.id().is_descendant_of(self.id())
    }

    // content

    /// Published content in the active language
    pub fn content(&self) -> DomainResult<Content> {
        self.content_for(&self.context.language())
    }

    pub fn content_for(&self, language: &LanguageCode) -> DomainResult<Content> {
        self.version(VersionId::Latest).content(language)
    }

    pub fn version(&self, version: VersionId) -> Version<'_> {
        Version { page: self, id: version }
    }

    /// The title field, falling back to the slug
    pub fn title(&self) -> DomainResult<String> {
        let content = self.content()?;
        Ok(content
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| self.slug().to_string()))
    }

    pub fn uuid(&self) -> DomainResult<Option<PageUuid>> {
        let content = self.content_for(&self.context.default_language())?;
        content.uuid().map(PageUuid::new).transpose()
    }

    pub fn translation(&self, code: &LanguageCode) -> DomainResult<Translation> {
        let exists = self.storage.exists(VersionId::Latest, code)?;
        let fields = self.storage.read(VersionId::Latest, code)?;
        Ok(Translation::new(code.clone(), fields, exists))
    }

    pub fn translations(&self) -> DomainResult<Vec<Translation>> {
        self.context
            .languages()
            .codes()
            .iter()
            .map(|code| self.translation(code))
            .collect()
    }

    /// The slug for a language: the translated slug if one is stored, otherwise
    /// the page slug
    pub fn slug_for(&self, code: &LanguageCode) -> DomainResult<String> {
        if *code == self.context.default_language() {
            return Ok(self.slug().to_string());
        }
        let translation = self.translation(code)?;
        Ok(translation
            .slug()
            .map(str::to_string)
            .unwrap_or_else(|| self.slug().to_string()))
    }

    pub fn files(&self) -> DomainResult<Vec<PageFile>> {
        self.context.files_of(&self.record)
    }

    // children

    pub fn children(&self) -> DomainResult<Pages> {
        self.children.children(self)
    }

    pub fn drafts(&self) -> DomainResult<Pages> {
        self.children.drafts(self)
    }

    pub fn children_and_drafts(&self) -> DomainResult<Pages> {
        self.children.children_and_drafts(self)
    }

    pub fn has_children(&self) -> DomainResult<bool> {
        Ok(!self.children()?.is_empty())
    }

    pub fn has_drafts(&self) -> DomainResult<bool> {
        Ok(!self.drafts()?.is_empty())
    }

    /// Reset the child collections to "not built"
    pub fn purge(&self) {
        self.children.purge();
    }

    /// All descendants and drafts, depth first
    pub fn index(&self) -> DomainResult<Vec<Rc<Page>>> {
        let mut pages = Vec::new();
        for child in self.children_and_drafts()?.iter() {
            pages.push(child.clone());
            pages.extend(child.index()?);
        }
        Ok(pages)
    }
}

impl ChildSource for Page {
    fn context(&self) -> &Rc<dyn ModelContext> {
        &self.context
    }

    fn child_cache(&self) -> &ChildCache {
        &self.children
    }

    fn child_link(&self) -> ParentLink {
        ParentLink::Page {
            page: self.me.clone(),
            id: self.record.id.clone(),
        }
    }

    fn source_id(&self) -> Option<&PageId> {
        Some(&self.record.id)
    }
}

impl Entity for Page {
    type Id = PageId;

    fn id(&self) -> &Self::Id {
        &self.record.id
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.record.id)
            .field("status", &self.status())
            .field("num", &self.record.num)
            .field("template", &self.record.template)
            .field("storage", &self.storage.kind())
            .finish()
    }
}

/// One content version of a page
pub struct Version<'a> {
    page: &'a Page,
    id: VersionId,
}

impl Version<'_> {
    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn exists(&self, language: &LanguageCode) -> DomainResult<bool> {
        self.page.storage.exists(self.id, language)
    }

    pub fn content(&self, language: &LanguageCode) -> DomainResult<Content> {
        let fields = self.page.storage.read(self.id, language)?;
        Ok(Content::new(language.clone(), self.id, fields))
    }

    /// Write fields into this version; without `overwrite` they are merged
    /// over the stored fields
    pub fn save(&self, fields: &Fields, language: &LanguageCode, overwrite: bool) -> DomainResult<()> {
        let fields = if overwrite {
            Content::new(language.clone(), self.id, fields.clone()).to_map()
        } else {
            self.content(language)?.merged(fields)
        };
        self.page.storage.write(self.id, language, &fields)
    }

    /// Move the unpublished changes of one language into `latest`
    pub fn publish(&self, language: &LanguageCode) -> DomainResult<()> {
        if self.id == VersionId::Latest {
            return Err(DomainError::logic(
                "error.version.alreadyPublished",
                "This version is already published",
            ));
        }
        if !self.exists(language)? {
            return Err(DomainError::not_found(
                "error.version.notFound",
                format!("Version \"{}\" does not exist", self.id),
            ));
        }

        let fields = self.page.storage.read(self.id, language)?;
        self.page.storage.write(VersionId::Latest, language, &fields)?;
        self.page.storage.delete(self.id, language)
    }

    pub fn delete(&self, language: &LanguageCode) -> DomainResult<()> {
        self.page.storage.delete(self.id, language)
    }
}
