/// Page collections and the lazily built child caches of pages and the site
use super::aggregates::{Page, ParentLink};
use super::base::{DomainError, DomainResult};
use super::context::ModelContext;
use super::value_objects::{PageId, Status};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Ordered, keyed collection of pages.
///
/// Cloning is cheap: clones share the underlying map, and [`Pages::same`]
/// tells whether two collections are the same cached instance.
#[derive(Clone, Default)]
pub struct Pages {
    items: Rc<IndexMap<PageId, Rc<Page>>>,
    parent_id: Option<PageId>,
}

impl Pages {
    pub fn new(pages: impl IntoIterator<Item = Rc<Page>>, parent_id: Option<PageId>) -> Self {
        let items = pages
            .into_iter()
            .map(|page| (page.id().clone(), page))
            .collect();
        Pages {
            items: Rc::new(items),
            parent_id,
        }
    }

    fn derive(&self, pages: impl IntoIterator<Item = Rc<Page>>) -> Pages {
        Pages::new(pages, self.parent_id.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Page>> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PageId> {
        self.items.keys()
    }

    pub fn get(&self, id: &PageId) -> Option<Rc<Page>> {
        self.items.get(id).cloned()
    }

    /// Whether a page with this id is part of the collection
    pub fn has(&self, id: &str) -> bool {
        PageId::new(id)
            .map(|id| self.items.contains_key(&id))
            .unwrap_or(false)
    }

    /// Direct member with the given slug
    pub fn find_slug(&self, slug: &str) -> Option<Rc<Page>> {
        self.iter().find(|page| page.slug().as_str() == slug).cloned()
    }

    /// Find a page by id.
    ///
    /// Tries the exact id, then the id relative to the collection's parent,
    /// then walks down the tree one slug at a time.
    pub fn find(&self, id: &str) -> DomainResult<Option<Rc<Page>>> {
        let id = id.trim_matches('/');
        let Ok(key) = PageId::new(id) else {
            return Ok(None);
        };

        if let Some(page) = self.get(&key) {
            return Ok(Some(page));
        }

        if let Some(parent) = &self.parent_id {
            let nested = PageId::new(format!("{}/{}", parent, id))?;
            if let Some(page) = self.get(&nested) {
                return Ok(Some(page));
            }
        }

        let mut segments = key.segments();
        let Some(mut current) = segments.next().and_then(|slug| self.find_slug(slug)) else {
            return Ok(None);
        };
        for segment in segments {
            current = match current.children()?.find_slug(segment) {
                Some(page) => page,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    pub fn find_or_fail(&self, id: &str) -> DomainResult<Rc<Page>> {
        self.find(id)?.ok_or_else(|| {
            DomainError::not_found(
                "error.page.notFound",
                format!("The page \"{}\" cannot be found", id),
            )
        })
    }

    pub fn first(&self) -> Option<Rc<Page>> {
        self.items.first().map(|(_, page)| page.clone())
    }

    pub fn last(&self) -> Option<Rc<Page>> {
        self.items.last().map(|(_, page)| page.clone())
    }

    pub fn listed(&self) -> Pages {
        self.filter(|page| page.status() == Status::Listed)
    }

    pub fn unlisted(&self) -> Pages {
        self.filter(|page| page.status() == Status::Unlisted)
    }

    pub fn drafts(&self) -> Pages {
        self.filter(|page| page.status() == Status::Draft)
    }

    pub fn filter<F>(&self, predicate: F) -> Pages
    where
        F: Fn(&Rc<Page>) -> bool,
    {
        self.derive(self.iter().filter(|page| predicate(page)).cloned())
    }

    /// The collection without the given ids
    pub fn not<'a>(&self, ids: impl IntoIterator<Item = &'a PageId>) -> Pages {
        let excluded: Vec<&PageId> = ids.into_iter().collect();
        self.filter(|page| !excluded.contains(&page.id()))
    }

    /// This collection followed by the pages of `other`; pages present in
    /// both keep their position and take the instance from `other`
    pub fn merge(&self, other: &Pages) -> Pages {
        let mut items = (*self.items).clone();
        for (id, page) in other.items.iter() {
            items.insert(id.clone(), page.clone());
        }
        Pages {
            items: Rc::new(items),
            parent_id: self.parent_id.clone(),
        }
    }

    /// The collection with `page` added at the end, unless already present
    pub fn append(&self, page: Rc<Page>) -> Pages {
        if self.items.contains_key(page.id()) {
            return self.clone();
        }
        self.derive(self.iter().cloned().chain(std::iter::once(page)))
    }

    pub fn index_of(&self, id: &PageId) -> Option<usize> {
        self.items.get_index_of(id)
    }

    /// Whether both collections are the same cached instance
    pub fn same(&self, other: &Pages) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl fmt::Debug for Pages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.keys()).finish()
    }
}

/// Anything that owns child pages: the site or a page
pub trait ChildSource {
    fn context(&self) -> &Rc<dyn ModelContext>;

    fn child_cache(&self) -> &ChildCache;

    /// Parent link handed to the children built from this source
    fn child_link(&self) -> ParentLink;

    /// `None` for the site
    fn source_id(&self) -> Option<&PageId>;
}

/// Memoized child collections.
///
/// Each collection is built on first access and kept until [`ChildCache::purge`]
/// resets it to "not built". This is the only mutable state of a model.
#[derive(Default)]
pub struct ChildCache {
    children: RefCell<Option<Pages>>,
    drafts: RefCell<Option<Pages>>,
    children_and_drafts: RefCell<Option<Pages>>,
}

impl ChildCache {
    /// Published children: listed by (num, slug), then unlisted in repository order
    pub fn children(&self, source: &dyn ChildSource) -> DomainResult<Pages> {
        let cached = self.children.borrow().clone();
        if let Some(pages) = cached {
            return Ok(pages);
        }

        let mut listed = Vec::new();
        let mut unlisted = Vec::new();
        for page in Self::load(source, false)? {
            if page.num().is_some() {
                listed.push(page);
            } else {
                unlisted.push(page);
            }
        }
        listed.sort_by(|a, b| (a.num(), a.slug()).cmp(&(b.num(), b.slug())));

        let pages = Pages::new(
            listed.into_iter().chain(unlisted),
            source.source_id().cloned(),
        );
        *self.children.borrow_mut() = Some(pages.clone());
        Ok(pages)
    }

    /// Drafts in repository order
    pub fn drafts(&self, source: &dyn ChildSource) -> DomainResult<Pages> {
        let cached = self.drafts.borrow().clone();
        if let Some(pages) = cached {
            return Ok(pages);
        }

        let pages = Pages::new(Self::load(source, true)?, source.source_id().cloned());
        *self.drafts.borrow_mut() = Some(pages.clone());
        Ok(pages)
    }

    /// Children followed by drafts, sharing their page instances
    pub fn children_and_drafts(&self, source: &dyn ChildSource) -> DomainResult<Pages> {
        let cached = self.children_and_drafts.borrow().clone();
        if let Some(pages) = cached {
            return Ok(pages);
        }

        let pages = self.children(source)?.merge(&self.drafts(source)?);
        *self.children_and_drafts.borrow_mut() = Some(pages.clone());
        Ok(pages)
    }

    pub fn purge(&self) {
        self.children.replace(None);
        self.drafts.replace(None);
        self.children_and_drafts.replace(None);
    }

    pub fn is_built(&self) -> bool {
        self.children.borrow().is_some()
            || self.drafts.borrow().is_some()
            || self.children_and_drafts.borrow().is_some()
    }

    fn load(source: &dyn ChildSource, drafts: bool) -> DomainResult<Vec<Rc<Page>>> {
        let context = source.context();
        let records = context.child_records(source.source_id())?;

        records
            .into_iter()
            .filter(|record| record.is_draft == drafts)
            .map(|record| Page::from_record(context, source.child_link(), record))
            .collect()
    }
}
