/// Domain entities
use super::aggregates::{Page, ParentLink};
use super::base::{DomainError, DomainResult, ValueObject};
use super::collections::{ChildCache, ChildSource, Pages};
use super::context::ModelContext;
use super::value_objects::{LanguageCode, PageId};
use std::fmt;
use std::rc::{Rc, Weak};

/// A configured content language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    code: LanguageCode,
    name: String,
    is_default: bool,
}

impl Language {
    pub fn new(code: LanguageCode, name: impl Into<String>, is_default: bool) -> Self {
        Language {
            code,
            name: name.into(),
            is_default,
        }
    }

    pub fn code(&self) -> &LanguageCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl ValueObject for Language {}

/// The languages of a site. Without any configured language the site runs in
/// single-language mode under the implicit `default` code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Languages {
    items: Vec<Language>,
}

impl Languages {
    /// Validates that at most one language is the default; the first language
    /// becomes the default if none is marked
    pub fn new(items: Vec<Language>) -> DomainResult<Self> {
        let defaults = items.iter().filter(|lang| lang.is_default).count();
        if defaults > 1 {
            return Err(DomainError::invalid_value(
                "error.language.default",
                "Only one language can be the default language",
            ));
        }

        for (index, language) in items.iter().enumerate() {
            if items[..index].iter().any(|other| other.code == language.code) {
                return Err(DomainError::duplicate(
                    "error.language.duplicate",
                    format!("The language \"{}\" exists", language.code),
                ));
            }
        }

        let mut items = items;
        if defaults == 0 {
            if let Some(first) = items.first_mut() {
                first.is_default = true;
            }
        }

        Ok(Languages { items })
    }

    pub fn single() -> Self {
        Languages::default()
    }

    pub fn is_multilang(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn default_code(&self) -> LanguageCode {
        self.items
            .iter()
            .find(|lang| lang.is_default)
            .map(|lang| lang.code.clone())
            .unwrap_or_else(LanguageCode::single)
    }

    pub fn find(&self, code: &str) -> Option<&Language> {
        self.items.iter().find(|lang| lang.code.as_str() == code)
    }

    /// The language for `code`, or `error.language.notFound`
    pub fn find_or_fail(&self, code: &str) -> DomainResult<&Language> {
        self.find(code).ok_or_else(|| {
            DomainError::not_found(
                "error.language.notFound",
                format!("The language \"{}\" does not exist", code),
            )
        })
    }

    /// All codes content can be stored under
    pub fn codes(&self) -> Vec<LanguageCode> {
        if self.items.is_empty() {
            return vec![LanguageCode::single()];
        }
        self.items.iter().map(|lang| lang.code.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A file attached to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    page_id: PageId,
    filename: String,
}

impl PageFile {
    pub fn new(page_id: PageId, filename: impl Into<String>) -> Self {
        PageFile {
            page_id,
            filename: filename.into(),
        }
    }

    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File name without extension
    pub fn name(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(name, _)| name)
            .unwrap_or(&self.filename)
    }

    pub fn extension(&self) -> Option<&str> {
        self.filename.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// `page/id/filename`
    pub fn id(&self) -> String {
        format!("{}/{}", self.page_id, self.filename)
    }
}

/// Root of the content tree
pub struct Site {
    context: Rc<dyn ModelContext>,
    me: Weak<Site>,
    children: ChildCache,
}

impl Site {
    pub(crate) fn new(context: Rc<dyn ModelContext>) -> Rc<Site> {
        Rc::new_cyclic(|me| Site {
            context,
            me: me.clone(),
            children: ChildCache::default(),
        })
    }

    pub fn context(&self) -> &Rc<dyn ModelContext> {
        &self.context
    }

    pub(crate) fn this(&self) -> DomainResult<Rc<Site>> {
        self.me.upgrade().ok_or_else(|| {
            DomainError::logic("error.site.detached", "The site is no longer available")
        })
    }

    /// Published top-level pages
    pub fn children(&self) -> DomainResult<Pages> {
        self.children.children(self)
    }

    /// Top-level drafts
    pub fn drafts(&self) -> DomainResult<Pages> {
        self.children.drafts(self)
    }

    pub fn children_and_drafts(&self) -> DomainResult<Pages> {
        self.children.children_and_drafts(self)
    }

    pub fn purge(&self) {
        self.children.purge();
    }

    /// Find a published page by id, walking down the tree
    pub fn find(&self, id: &str) -> DomainResult<Option<Rc<Page>>> {
        self.children()?.find(id)
    }

    /// Find a page by id, drafts included at every level
    pub fn find_page_or_draft(&self, id: &str) -> DomainResult<Option<Rc<Page>>> {
        let mut segments = id.trim_matches('/').split('/').filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return Ok(None);
        };

        let mut current = match self.children_and_drafts()?.find_slug(first) {
            Some(page) => page,
            None => return Ok(None),
        };
        for segment in segments {
            current = match current.children_and_drafts()?.find_slug(segment) {
                Some(page) => page,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    /// Every page and draft of the site, depth first
    pub fn index(&self) -> DomainResult<Vec<Rc<Page>>> {
        let mut pages = Vec::new();
        for page in self.children_and_drafts()?.iter() {
            pages.push(page.clone());
            pages.extend(page.index()?);
        }
        Ok(pages)
    }
}

impl ChildSource for Site {
    fn context(&self) -> &Rc<dyn ModelContext> {
        &self.context
    }

    fn child_cache(&self) -> &ChildCache {
        &self.children
    }

    fn child_link(&self) -> ParentLink {
        ParentLink::Site
    }

    fn source_id(&self) -> Option<&PageId> {
        None
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn language(code: &str, is_default: bool) -> Language {
        Language::new(LanguageCode::new(code).unwrap(), code.to_uppercase(), is_default)
    }

    #[test]
    fn test_single_language_mode() {
        let languages = Languages::single();
        assert!(!languages.is_multilang());
        assert!(languages.default_code().is_single());
        assert_eq!(languages.codes(), vec![LanguageCode::single()]);
    }

    #[test]
    fn test_first_language_becomes_default() {
        let languages = Languages::new(vec![language("en", false), language("de", false)]).unwrap();
        assert_eq!(languages.default_code().as_str(), "en");
        assert!(languages.is_multilang());
    }

    #[test]
    fn test_explicit_default_language() {
        let languages = Languages::new(vec![language("en", false), language("de", true)]).unwrap();
        assert_eq!(languages.default_code().as_str(), "de");
        assert!(languages.find("en").is_some());
        assert_eq!(languages.find_or_fail("fr").unwrap_err().key(), "error.language.notFound");
    }

    #[test]
    fn test_invalid_language_sets() {
        let err = Languages::new(vec![language("en", true), language("de", true)]).unwrap_err();
        assert_eq!(err.key(), "error.language.default");

        let err = Languages::new(vec![language("en", false), language("en", false)]).unwrap_err();
        assert_eq!(err.key(), "error.language.duplicate");
    }

    #[test]
    fn test_page_file_parts() {
        let file = PageFile::new(PageId::new("blog/a").unwrap(), "cover.final.jpg");
        assert_eq!(file.name(), "cover.final");
        assert_eq!(file.extension(), Some("jpg"));
        assert_eq!(file.id(), "blog/a/cover.final.jpg");
    }
}
