/// Lifecycle operations on pages: create, rename, status, sorting, content, copy, move, delete
use super::page_lifecycle::{
    commit, commit_page, parent_value, purge_around, reloaded, relocate,
    resort_siblings_after_listing, resort_siblings_after_unlisting,
};
use crate::application::cms::{Kernel, KernelAccess};
use crate::application::dto::{DuplicateOptions, PageInput};
use crate::application::repositories::{CopyOptions, StorageKind, StorageTarget};
use crate::application::rules::{PageAction, PageRules};
use crate::domain::aggregates::{Page, ParentModel, Version};
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::content::{fields_from, Fields};
use crate::domain::entities::Site;
use crate::domain::events::{arguments, HookValue};
use crate::domain::records::PageRecord;
use crate::domain::storage::Storage;
use crate::domain::value_objects::{LanguageCode, PageUuid, Slug, Status, Template, VersionId};
use crate::infrastructure::storage::MemoryStorage;
use std::rc::Rc;

impl Page {
    /// Create a new page below `parent`.
    ///
    /// The page is a draft unless `input.draft` is `false`. Its content is
    /// staged in memory so the rules and `page.create:before` can inspect it
    /// before anything is written to the repository. When `input.num` is set
    /// the page is listed at that position afterwards.
    pub fn create(parent: ParentModel, input: PageInput) -> DomainResult<Rc<Page>> {
        let context = parent.context().clone();
        let kernel = Kernel::of(&*context)?;

        let mut content = fields_from(input.content.clone());
        let slug_source = input
            .slug
            .clone()
            .or_else(|| content.get("title").cloned())
            .unwrap_or_default();
        let slug = Slug::slugify(&slug_source)?;
        let template = match &input.template {
            Some(template) => Template::new(template.as_str())?,
            None => Template::default(),
        };
        if !content.contains_key("uuid") {
            content.insert("uuid".to_string(), PageUuid::generate().to_string());
        }

        let record = PageRecord::new(
            parent.page_id(),
            slug,
            None,
            input.draft.unwrap_or(true),
            template,
        )?;
        let staged = MemoryStorage::with_content(&kernel.default_language(), content);
        let page = Page::new(
            context.clone(),
            parent.link(),
            record.clone(),
            Box::new(staged),
            true,
        );

        PageRules::create(&page, &parent)?;

        let before = arguments([
            ("page", HookValue::from(page.clone())),
            ("input", HookValue::from(input.to_value())),
        ]);
        let created = commit_page(&page, PageAction::Create, before, || {
            kernel.write_repository(|repo| repo.insert(&record))?;
            let storage = kernel.read_repository(|repo| repo.storage(&record))?;
            page.storage().copy_all(storage.as_ref())?;

            let created = Page::new(context.clone(), parent.link(), record.clone(), storage, false);
            parent.purge();
            tracing::info!("Created page {} ({})", created.id(), created.status());
            Ok(created)
        })?;

        match input.num {
            Some(num) => created.change_status(Status::Listed, Some(num)),
            None => Ok(created),
        }
    }

    /// Create a new page below this one
    pub fn create_child(&self, input: PageInput) -> DomainResult<Rc<Page>> {
        Page::create(ParentModel::Page(self.this()?), input)
    }

    /// Rename the page.
    ///
    /// In multi-language setups a non-default `language` only changes the
    /// translated slug stored in that language's content; the page id is
    /// always derived from the default slug.
    pub fn change_slug(&self, slug: &str, language: Option<&str>) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        let kernel = self.kernel()?;
        let slug = Slug::slugify(slug)?;

        if kernel.is_multilang() {
            let code = self.resolve_language(language)?;
            if code != kernel.default_language() {
                return self.translate_slug(slug, code);
            }
        }

        if slug == *self.slug() {
            return Ok(this);
        }

        PageRules::change_slug(self, &slug)?;

        let before = arguments([
            ("page", HookValue::from(this)),
            ("slug", HookValue::from(slug.as_str())),
            ("languageCode", HookValue::Null),
        ]);
        commit_page(self, PageAction::ChangeSlug, before, || {
            let page = relocate(self, self.record().with_slug(slug.clone()), self.parent_link().clone())?;
            purge_around(self)?;
            Ok(page)
        })
    }

    /// Set the slug of one non-default language
    pub fn change_slug_for_language(&self, slug: &str, language: &str) -> DomainResult<Rc<Page>> {
        let kernel = self.kernel()?;
        let code = kernel.languages().find_or_fail(language)?.code().clone();
        if code == kernel.default_language() {
            return Err(DomainError::invalid_value(
                "error.page.changeSlug.defaultLanguage",
                "The slug of the default language is changed with change_slug",
            ));
        }
        self.translate_slug(Slug::slugify(slug)?, code)
    }

    fn translate_slug(&self, slug: Slug, language: LanguageCode) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        PageRules::change_slug(self, &slug)?;

        let before = arguments([
            ("page", HookValue::from(this)),
            ("slug", HookValue::from(slug.as_str())),
            ("languageCode", HookValue::from(language.as_str())),
        ]);
        commit_page(self, PageAction::ChangeSlug, before, || {
            // a translated slug equal to the page slug is not stored
            let stored = (slug != *self.slug()).then(|| slug.as_str());

            let changes = self.version(VersionId::Changes);
            if changes.exists(&language)? {
                write_slug(&changes, stored, &language)?;
            }
            write_slug(&self.version(VersionId::Latest), stored, &language)?;

            let page = reloaded(self);
            self.parent_model()?.purge();
            Ok(page)
        })
    }

    /// Move the page between draft, unlisted and listed.
    ///
    /// `position` only matters for `Listed`. Manually sorted siblings are
    /// renumbered so that listed numbers stay contiguous.
    pub fn change_status(&self, status: Status, position: Option<i64>) -> DomainResult<Rc<Page>> {
        match status {
            Status::Draft => self.change_status_to_draft(),
            Status::Unlisted => self.change_status_to_unlisted(),
            Status::Listed => self.change_status_to_listed(position),
        }
    }

    /// [`Page::change_status`] with the status given by name
    pub fn change_status_str(&self, status: &str, position: Option<i64>) -> DomainResult<Rc<Page>> {
        self.change_status(status.parse()?, position)
    }

    fn change_status_to_draft(&self) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        if self.is_draft() {
            return Ok(this);
        }

        PageRules::change_status(self)?;
        let was_listed = self.is_listed();

        let before = arguments([
            ("page", HookValue::from(this)),
            ("status", HookValue::from(Status::Draft.as_str())),
            ("position", HookValue::Null),
        ]);
        let page = commit_page(self, PageAction::ChangeStatus, before, || self.unpublish())?;

        if was_listed && self.blueprint().num.is_sortable() {
            resort_siblings_after_unlisting(self)?;
        }
        Ok(page)
    }

    fn change_status_to_unlisted(&self) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        if self.is_unlisted() {
            return Ok(this);
        }

        PageRules::change_status(self)?;
        let was_listed = self.is_listed();

        let before = arguments([
            ("page", HookValue::from(this)),
            ("status", HookValue::from(Status::Unlisted.as_str())),
            ("position", HookValue::Null),
        ]);
        let page = commit_page(self, PageAction::ChangeStatus, before, || {
            self.publish_location()?.change_num(None)
        })?;

        if was_listed && self.blueprint().num.is_sortable() {
            resort_siblings_after_unlisting(self)?;
        }
        Ok(page)
    }

    fn change_status_to_listed(&self, position: Option<i64>) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        let num = self.create_num(position)?;

        if self.is_listed() && self.num() == Some(num) {
            return Ok(this);
        }

        PageRules::change_status(self)?;

        let before = arguments([
            ("page", HookValue::from(this)),
            ("status", HookValue::from(Status::Listed.as_str())),
            ("position", HookValue::from(num)),
        ]);
        let page = commit_page(self, PageAction::ChangeStatus, before, || {
            self.publish_location()?.change_num(Some(num))
        })?;

        if self.blueprint().num.is_sortable() {
            return resort_siblings_after_listing(&page, num);
        }
        Ok(page)
    }

    /// List the page at `position` among its siblings
    pub fn change_sort(&self, position: Option<i64>) -> DomainResult<Rc<Page>> {
        PageRules::change_sort(self)?;
        self.change_status(Status::Listed, position)
    }

    /// Set the raw sorting number; `None` makes a listed page unlisted
    pub fn change_num(&self, num: Option<i64>) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        PageRules::change_num(self, num)?;

        if num == self.num() {
            return Ok(this);
        }

        let before = arguments([("page", HookValue::from(this)), ("num", HookValue::from(num))]);
        commit_page(self, PageAction::ChangeNum, before, || {
            let page = relocate(self, self.record().with_num(num), self.parent_link().clone())?;
            purge_around(self)?;
            Ok(page)
        })
    }

    /// Publish a draft as unlisted page; published pages are returned as they are
    pub fn publish(&self) -> DomainResult<Rc<Page>> {
        if !self.is_draft() {
            return self.this();
        }
        self.change_status(Status::Unlisted, None)
    }

    /// Turn the page into a draft without running hooks or rules
    pub fn unpublish(&self) -> DomainResult<Rc<Page>> {
        if self.is_draft() {
            return self.this();
        }
        let page = relocate(self, self.record().unpublished(), self.parent_link().clone())?;
        purge_around(self)?;
        Ok(page)
    }

    /// Move a draft out of the drafts area without running hooks or rules
    fn publish_location(&self) -> DomainResult<Rc<Page>> {
        if !self.is_draft() {
            return self.this();
        }
        let page = relocate(self, self.record().published(), self.parent_link().clone())?;
        purge_around(self)?;
        Ok(page)
    }

    pub fn change_title(&self, title: &str, language: Option<&str>) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        let language = self.resolve_language(language)?;
        PageRules::change_title(self, title)?;

        let before = arguments([
            ("page", HookValue::from(this)),
            ("title", HookValue::from(title)),
            ("languageCode", HookValue::from(language.as_str())),
        ]);
        commit_page(self, PageAction::ChangeTitle, before, || {
            self.save_in(&fields_from([("title", title)]), &language, false)
        })
    }

    /// Merge `values` into the published content of a language
    pub fn update(&self, values: Fields, language: Option<&str>) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        let language = self.resolve_language(language)?;
        let values = fields_from(values);
        PageRules::update(self)?;

        let before = arguments([
            ("page", HookValue::from(this)),
            ("values", HookValue::from(&values)),
            ("languageCode", HookValue::from(language.as_str())),
        ]);
        commit_page(self, PageAction::Update, before, || self.save_in(&values, &language, false))
    }

    /// Write content without running hooks or rules
    pub fn save(&self, values: &Fields, language: Option<&str>, overwrite: bool) -> DomainResult<Rc<Page>> {
        let language = self.resolve_language(language)?;
        self.save_in(values, &language, overwrite)
    }

    fn save_in(&self, values: &Fields, language: &LanguageCode, overwrite: bool) -> DomainResult<Rc<Page>> {
        self.version(VersionId::Latest).save(values, language, overwrite)?;
        let page = reloaded(self);
        self.parent_model()?.purge();
        Ok(page)
    }

    /// Copy the page next to itself as a draft.
    ///
    /// The copy defaults to the slug `<slug>-copy`. It and every copied
    /// descendant get fresh uuids.
    pub fn duplicate(&self, slug: Option<&str>, options: DuplicateOptions) -> DomainResult<Rc<Page>> {
        let this = self.this()?;
        let kernel = self.kernel()?;
        let slug = match slug {
            Some(slug) => Slug::slugify(slug)?,
            None => Slug::slugify(&format!("{}-copy", self.slug()))?,
        };

        PageRules::duplicate(self, &slug)?;

        let before = arguments([
            ("originalPage", HookValue::from(this)),
            ("input", HookValue::from(slug.as_str())),
            ("options", HookValue::from(options.to_value())),
        ]);
        let value = commit(self, PageAction::Duplicate, before, || {
            let target = PageRecord::new(
                self.record().parent_id().as_ref(),
                slug.clone(),
                None,
                true,
                self.template().clone(),
            )?;
            let copy = CopyOptions {
                children: options.children,
                files: options.files,
            };
            kernel.write_repository(|repo| repo.copy(self.record(), &target, copy))?;

            if self.has_custom_storage() {
                let storage = kernel.read_repository(|repo| repo.storage(&target))?;
                storage.delete_all()?;
                self.storage().copy_all(storage.as_ref())?;
            }

            let mut page = Page::from_record(self.context(), self.parent_link().clone(), target)?;
            let default_language = kernel.default_language();
            refresh_uuid(page.storage(), &default_language)?;
            if options.children {
                for record in kernel.read_repository(|repo| repo.descendants_of(page.id()))? {
                    let storage = kernel.read_repository(|repo| repo.storage(&record))?;
                    refresh_uuid(storage.as_ref(), &default_language)?;
                }
            }

            if let Some(title) = &options.title {
                page = page.change_title(title, None)?;
            }

            self.parent_model()?.purge();
            tracing::info!("Duplicated page {} as {}", self.id(), page.id());
            Ok(HookValue::from(page))
        })?;

        value.as_page().ok_or_else(|| {
            DomainError::invalid_type(
                "error.hooks.result.invalid",
                "The page.duplicate:after hooks must return a page",
            )
        })
    }

    /// Move the page with its subtree below another parent
    pub fn move_to(&self, parent: impl Into<ParentModel>) -> DomainResult<Rc<Page>> {
        let parent = parent.into();
        let this = self.this()?;
        let old_parent = self.parent_model()?;

        if old_parent.is(&parent) {
            return Ok(this);
        }

        PageRules::move_to(self, &parent)?;

        let before = arguments([("page", HookValue::from(this)), ("parent", parent_value(&parent))]);
        commit_page(self, PageAction::Move, before, || {
            let record = self.record().with_parent(parent.page_id());
            let page = relocate(self, record, parent.link())?;

            self.purge();
            old_parent.purge();
            parent.purge();
            tracing::info!("Moved page {} to {}", self.id(), page.id());
            Ok(page)
        })
    }

    /// Delete the page with its content and files.
    ///
    /// Pages with children or drafts are only deleted with `force`.
    pub fn delete(&self, force: bool) -> DomainResult<bool> {
        self.delete_with(force, true)
    }

    fn delete_with(&self, force: bool, resort: bool) -> DomainResult<bool> {
        let this = self.this()?;
        let kernel = self.kernel()?;
        PageRules::delete(self, force)?;

        let before = arguments([("page", HookValue::from(this)), ("force", HookValue::from(force))]);
        let value = commit(self, PageAction::Delete, before, || {
            // the whole subtree goes away with this page, siblings of
            // children need no renumbering
            for child in self.children_and_drafts()?.iter() {
                child.delete_with(true, false)?;
            }

            kernel.write_repository(|repo| repo.remove(self.record()))?;
            if self.has_custom_storage() {
                self.storage().delete_all()?;
            }

            self.purge();
            self.parent_model()?.purge();
            if resort && !self.is_draft() {
                resort_siblings_after_unlisting(self)?;
            }

            tracing::info!("Deleted page {}", self.id());
            Ok(HookValue::from(true))
        })?;

        Ok(value.as_bool().unwrap_or(!value.is_null()))
    }

    /// Copy all content into another storage and bind the page to it
    pub fn change_storage(&self, target: impl Into<StorageTarget>) -> DomainResult<Rc<Page>> {
        self.switch_storage(target.into(), false)
    }

    /// Like [`Page::change_storage`], removing the content from the old storage
    pub fn move_to_storage(&self, target: impl Into<StorageTarget>) -> DomainResult<Rc<Page>> {
        self.switch_storage(target.into(), true)
    }

    fn switch_storage(&self, target: StorageTarget, remove_old: bool) -> DomainResult<Rc<Page>> {
        let kernel = self.kernel()?;
        let (storage, custom): (Box<dyn Storage>, bool) = match target {
            StorageTarget::Kind(StorageKind::Memory) => {
                (Box::new(MemoryStorage::new()) as Box<dyn Storage>, true)
            }
            StorageTarget::Kind(StorageKind::Repository) => {
                if !self.has_custom_storage() {
                    return Ok(reloaded(self));
                }
                (kernel.read_repository(|repo| repo.storage(self.record()))?, false)
            }
            StorageTarget::Instance(storage) => (storage, true),
        };

        tracing::debug!(
            "Switching storage of page {} from {} to {}",
            self.id(),
            self.storage().kind(),
            storage.kind()
        );

        self.storage().copy_all(storage.as_ref())?;
        if remove_old {
            self.storage().delete_all()?;
        }

        Ok(Page::new(
            self.context().clone(),
            self.parent_link().clone(),
            self.record().clone(),
            storage,
            custom,
        ))
    }

    /// The language an operation applies to, the active one by default
    fn resolve_language(&self, language: Option<&str>) -> DomainResult<LanguageCode> {
        let kernel = self.kernel()?;
        match language {
            None => Ok(kernel.language()),
            Some(_) if !kernel.is_multilang() => Ok(kernel.default_language()),
            Some(code) => Ok(kernel.languages().find_or_fail(code)?.code().clone()),
        }
    }
}

impl Site {
    /// Create a new top-level page
    pub fn create_child(&self, input: PageInput) -> DomainResult<Rc<Page>> {
        Page::create(ParentModel::Site(self.this()?), input)
    }
}

fn write_slug(version: &Version<'_>, slug: Option<&str>, language: &LanguageCode) -> DomainResult<()> {
    let mut fields = version.content(language)?.to_map();
    match slug {
        Some(slug) => {
            fields.insert("slug".to_string(), slug.to_string());
        }
        None => {
            fields.shift_remove("slug");
        }
    }
    version.save(&fields, language, true)
}

/// Give one page's content a new uuid in every slot that carries one
fn refresh_uuid(storage: &dyn Storage, default_language: &LanguageCode) -> DomainResult<()> {
    let uuid = PageUuid::generate().to_string();

    let mut slots = storage.slots()?;
    let primary = (VersionId::Latest, default_language.clone());
    if !slots.contains(&primary) {
        slots.push(primary.clone());
    }

    for slot in slots {
        let (version, language) = &slot;
        let mut fields = storage.read(*version, language)?;
        if fields.contains_key("uuid") || slot == primary {
            fields.insert("uuid".to_string(), uuid.clone());
            storage.write(*version, language, &fields)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cms::Cms;
    use crate::application::services::HookRegistry;
    use crate::domain::blueprint::Blueprint;
    use std::cell::RefCell;

    fn listed(cms: &Cms, slug: &str, num: i64) -> Rc<Page> {
        cms.site()
            .create_child(PageInput::new().slug(slug).draft(false).num(num))
            .unwrap()
    }

    fn nums(cms: &Cms) -> Vec<(String, Option<i64>)> {
        cms.site()
            .children()
            .unwrap()
            .iter()
            .map(|page| (page.slug().to_string(), page.num()))
            .collect()
    }

    #[test]
    fn test_create_defaults_to_draft() {
        let cms = Cms::in_memory().unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().title("Hello World"))
            .unwrap();

        assert!(page.is_draft());
        assert_eq!(page.slug().as_str(), "hello-world");
        assert_eq!(page.title().unwrap(), "Hello World");
        assert!(page.uuid().unwrap().is_some());
        assert!(!page.has_custom_storage());
        assert_eq!(cms.site().drafts().unwrap().len(), 1);
    }

    #[test]
    fn test_create_duplicate_slug_fails() {
        let cms = Cms::in_memory().unwrap();
        cms.site().create_child(PageInput::new().slug("a")).unwrap();
        let err = cms.site().create_child(PageInput::new().slug("a")).unwrap_err();
        assert_eq!(err.key(), "error.page.duplicate");
    }

    #[test]
    fn test_create_with_num_lists_the_page() {
        let cms = Cms::in_memory().unwrap();
        let page = listed(&cms, "a", 1);
        assert!(page.is_listed());
        assert_eq!(page.num(), Some(1));
    }

    #[test]
    fn test_listing_shifts_siblings() {
        let cms = Cms::in_memory().unwrap();
        listed(&cms, "a", 1);
        listed(&cms, "b", 2);
        let c = cms.site().create_child(PageInput::new().slug("c")).unwrap();

        let c = c.change_status(Status::Listed, Some(1)).unwrap();
        assert_eq!(c.num(), Some(1));
        assert_eq!(
            nums(&cms),
            vec![
                ("c".to_string(), Some(1)),
                ("a".to_string(), Some(2)),
                ("b".to_string(), Some(3)),
            ]
        );
    }

    #[test]
    fn test_listing_clamps_position() {
        let cms = Cms::in_memory().unwrap();
        listed(&cms, "a", 1);
        let b = cms.site().create_child(PageInput::new().slug("b")).unwrap();

        let b = b.change_status(Status::Listed, Some(99)).unwrap();
        assert_eq!(b.num(), Some(2));
    }

    #[test]
    fn test_unlisting_closes_the_gap() {
        let cms = Cms::in_memory().unwrap();
        let a = listed(&cms, "a", 1);
        listed(&cms, "b", 2);
        listed(&cms, "c", 3);

        let a = a.change_status(Status::Unlisted, None).unwrap();
        assert!(a.is_unlisted());
        assert_eq!(
            nums(&cms),
            vec![
                ("b".to_string(), Some(1)),
                ("c".to_string(), Some(2)),
                ("a".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_listed_to_draft_drops_num() {
        let cms = Cms::in_memory().unwrap();
        let a = listed(&cms, "a", 1);
        listed(&cms, "b", 2);

        let a = a.change_status(Status::Draft, None).unwrap();
        assert!(a.is_draft());
        assert_eq!(a.num(), None);
        assert_eq!(nums(&cms), vec![("b".to_string(), Some(1))]);
    }

    #[test]
    fn test_change_num_on_draft_fails() {
        let cms = Cms::in_memory().unwrap();
        let draft = cms.site().create_child(PageInput::new().slug("a")).unwrap();
        assert_eq!(draft.change_num(Some(1)).unwrap_err().key(), "error.page.num.draft");
    }

    #[test]
    fn test_zero_num_mode() {
        let cms = Cms::builder()
            .blueprint("note", Blueprint::with_num("zero"))
            .build()
            .unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().slug("a").template("note"))
            .unwrap();
        let page = page.change_status(Status::Listed, Some(5)).unwrap();
        assert_eq!(page.num(), Some(0));
    }

    #[test]
    fn test_date_num_mode() {
        let cms = Cms::builder()
            .blueprint("article", Blueprint::with_num("date"))
            .build()
            .unwrap();
        let page = cms
            .site()
            .create_child(
                PageInput::new()
                    .slug("a")
                    .template("article")
                    .field("date", "2012-12-12"),
            )
            .unwrap();
        let page = page.change_status(Status::Listed, None).unwrap();
        assert_eq!(page.num(), Some(20121212));
    }

    #[test]
    fn test_template_num_mode() {
        let cms = Cms::builder()
            .blueprint("event", Blueprint::with_num(r#"{{ page.date.toDate("Y") }}"#))
            .build()
            .unwrap();
        let page = cms
            .site()
            .create_child(
                PageInput::new()
                    .slug("a")
                    .template("event")
                    .field("date", "2016-05-01"),
            )
            .unwrap();
        assert_eq!(page.create_num(None).unwrap(), 2016);
    }

    #[test]
    fn test_change_slug_renames_and_keeps_content() {
        let cms = Cms::in_memory().unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().slug("a").title("A"))
            .unwrap();

        let renamed = page.change_slug("New Name", None).unwrap();
        assert_eq!(renamed.id().as_str(), "new-name");
        assert_eq!(renamed.title().unwrap(), "A");
        assert!(cms.page("a").unwrap().is_none());
        assert!(cms.page("new-name").unwrap().is_some());

        let same = renamed.change_slug("new-name", None).unwrap();
        assert!(Rc::ptr_eq(&same, &renamed));
    }

    #[test]
    fn test_change_title_and_update() {
        let cms = Cms::in_memory().unwrap();
        let page = cms.site().create_child(PageInput::new().slug("a")).unwrap();

        let page = page.change_title("Renamed", None).unwrap();
        assert_eq!(page.title().unwrap(), "Renamed");
        assert_eq!(page.change_title("  ", None).unwrap_err().key(), "error.page.changeTitle.empty");

        let page = page
            .update(fields_from([("Text", "Body")]), None)
            .unwrap();
        assert_eq!(page.content().unwrap().get("text"), Some("Body"));
        assert_eq!(page.content().unwrap().get("title"), Some("Renamed"));
    }

    #[test]
    fn test_publish_is_noop_for_published_pages() {
        let cms = Cms::in_memory().unwrap();
        let page = cms.site().create_child(PageInput::new().slug("a")).unwrap();

        let published = page.publish().unwrap();
        assert!(published.is_unlisted());
        let again = published.publish().unwrap();
        assert!(Rc::ptr_eq(&again, &published));
    }

    #[test]
    fn test_duplicate_gets_fresh_uuid() {
        let cms = Cms::in_memory().unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().slug("a").title("A").draft(false))
            .unwrap();

        let copy = page.duplicate(None, DuplicateOptions::default()).unwrap();
        assert_eq!(copy.slug().as_str(), "a-copy");
        assert!(copy.is_draft());
        assert_eq!(copy.title().unwrap(), "A");
        assert_ne!(copy.uuid().unwrap(), page.uuid().unwrap());

        let titled = page
            .duplicate(
                Some("b"),
                DuplicateOptions {
                    title: Some("B".to_string()),
                    ..DuplicateOptions::default()
                },
            )
            .unwrap();
        assert_eq!(titled.title().unwrap(), "B");
    }

    #[test]
    fn test_move_into_itself_fails() {
        let cms = Cms::in_memory().unwrap();
        let parent = cms.site().create_child(PageInput::new().slug("a")).unwrap();
        let child = parent.create_child(PageInput::new().slug("b")).unwrap();

        let err = parent.move_to(child.clone()).unwrap_err();
        assert_eq!(err.key(), "error.page.move.ancestor");

        let moved = child.move_to(cms.site()).unwrap();
        assert_eq!(moved.id().as_str(), "b");
        assert!(parent.children_and_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_delete_requires_force_for_children() {
        let cms = Cms::in_memory().unwrap();
        let parent = cms.site().create_child(PageInput::new().slug("a")).unwrap();
        parent.create_child(PageInput::new().slug("b")).unwrap();

        let err = parent.delete(false).unwrap_err();
        assert_eq!(err.key(), "error.page.delete.hasChildren");

        assert!(parent.delete(true).unwrap());
        assert!(cms.page("a").unwrap().is_none());
        assert!(cms.page("a/b").unwrap().is_none());
    }

    #[test]
    fn test_before_hook_error_aborts_mutation() {
        let mut hooks = HookRegistry::new();
        hooks.on("page.changeTitle:before", |_| {
            Err(DomainError::permission_denied("error.custom", "nope"))
        });
        let cms = Cms::builder().hooks(hooks).build().unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().slug("a").title("A"))
            .unwrap();

        assert_eq!(page.change_title("B", None).unwrap_err().key(), "error.custom");
        assert_eq!(cms.page("a").unwrap().unwrap().title().unwrap(), "A");
    }

    #[test]
    fn test_after_hooks_see_old_and_new_page() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut hooks = HookRegistry::new();
        hooks.on("page.changeSlug:after", move |event| {
            let old = event.page("oldPage").unwrap();
            let new = event.page("newPage").unwrap();
            log.borrow_mut().push((old.id().to_string(), new.id().to_string()));
            Ok(None)
        });
        let cms = Cms::builder().hooks(hooks).build().unwrap();
        let page = cms.site().create_child(PageInput::new().slug("a")).unwrap();

        page.change_slug("b", None).unwrap();
        assert_eq!(*seen.borrow(), vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_change_storage_keeps_content() {
        let cms = Cms::in_memory().unwrap();
        let page = cms
            .site()
            .create_child(PageInput::new().slug("a").title("A"))
            .unwrap();

        let detached = page.change_storage(StorageKind::Memory).unwrap();
        assert!(detached.has_custom_storage());
        assert_eq!(detached.title().unwrap(), "A");
        assert_eq!(page.title().unwrap(), "A");

        let moved = page.move_to_storage(StorageKind::Memory).unwrap();
        assert_eq!(moved.title().unwrap(), "A");
        assert!(page.storage().slots().unwrap().is_empty());
    }
}
