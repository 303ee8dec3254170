/// Application kernel: wires repository, hooks, languages, blueprints and permissions
use crate::application::config::{BackendConfig, CmsConfig};
use crate::application::repositories::PageRepository;
use crate::application::rules::{AllowAll, Permissions};
use crate::application::services::{HookDispatcher, HookRegistry};
use crate::domain::aggregates::Page;
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::blueprint::{Blueprint, Blueprints};
use crate::domain::context::ModelContext;
use crate::domain::entities::{Languages, PageFile, Site};
use crate::domain::events::{Arguments, HookValue};
use crate::domain::records::PageRecord;
use crate::domain::storage::Storage;
use crate::domain::value_objects::{LanguageCode, PageId, Template};
use crate::infrastructure::file_system::FileSystemPageRepository;
use crate::infrastructure::persistence::{InMemoryPageRepository, SqlitePageRepository};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared services every model of one tree reaches through an `Rc`
pub struct Kernel {
    languages: Languages,
    blueprints: Blueprints,
    hooks: HookDispatcher,
    repository: RefCell<Box<dyn PageRepository>>,
    permissions: Box<dyn Permissions>,
    current_language: RefCell<Option<LanguageCode>>,
    site: RefCell<Weak<Site>>,
}

impl Kernel {
    pub fn hooks(&self) -> &HookDispatcher {
        &self.hooks
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    pub fn is_multilang(&self) -> bool {
        self.languages.is_multilang()
    }

    pub fn blueprint(&self, template: &Template) -> Blueprint {
        self.blueprints.get(template)
    }

    pub fn permissions(&self) -> &dyn Permissions {
        self.permissions.as_ref()
    }

    pub fn default_language(&self) -> LanguageCode {
        self.languages.default_code()
    }

    /// The active language, the default language unless one was set
    pub fn language(&self) -> LanguageCode {
        self.current_language
            .borrow()
            .clone()
            .unwrap_or_else(|| self.default_language())
    }

    pub fn set_language(&self, code: Option<&str>) -> DomainResult<()> {
        let code = match code {
            Some(code) => Some(self.languages.find_or_fail(code)?.code().clone()),
            None => None,
        };
        *self.current_language.borrow_mut() = code;
        Ok(())
    }

    pub fn site(&self) -> DomainResult<Rc<Site>> {
        self.site.borrow().upgrade().ok_or_else(|| {
            DomainError::logic("error.site.detached", "The site is no longer available")
        })
    }

    /// Run `f` with shared access to the repository
    pub fn read_repository<T>(
        &self,
        f: impl FnOnce(&dyn PageRepository) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let repository = self.repository.try_borrow().map_err(|_| Self::busy())?;
        f(&**repository)
    }

    /// Run `f` with exclusive access to the repository
    pub fn write_repository<T>(
        &self,
        f: impl FnOnce(&mut dyn PageRepository) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut repository = self.repository.try_borrow_mut().map_err(|_| Self::busy())?;
        f(&mut **repository)
    }

    fn busy() -> DomainError {
        DomainError::logic(
            "error.repository.busy",
            "The page repository is already in use",
        )
    }

    /// The kernel behind a model's context
    pub fn of(context: &dyn ModelContext) -> DomainResult<&Kernel> {
        context.as_any().downcast_ref::<Kernel>().ok_or_else(|| {
            DomainError::logic(
                "error.kernel.missing",
                "The model was not built by a content kernel",
            )
        })
    }
}

impl ModelContext for Kernel {
    fn site(&self) -> DomainResult<Rc<Site>> {
        Kernel::site(self)
    }

    fn languages(&self) -> &Languages {
        Kernel::languages(self)
    }

    fn default_language(&self) -> LanguageCode {
        Kernel::default_language(self)
    }

    fn language(&self) -> LanguageCode {
        Kernel::language(self)
    }

    fn blueprint(&self, template: &Template) -> Blueprint {
        Kernel::blueprint(self, template)
    }

    fn find_record(&self, id: &PageId) -> DomainResult<Option<PageRecord>> {
        self.read_repository(|repo| repo.find(id))
    }

    fn child_records(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>> {
        self.read_repository(|repo| repo.children_of(parent))
    }

    fn storage_for(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>> {
        self.read_repository(|repo| repo.storage(record))
    }

    fn files_of(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>> {
        self.read_repository(|repo| repo.files(record))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reach the kernel that built a model
pub trait KernelAccess {
    fn kernel(&self) -> DomainResult<&Kernel>;
}

impl KernelAccess for Page {
    fn kernel(&self) -> DomainResult<&Kernel> {
        Kernel::of(&**self.context())
    }
}

impl KernelAccess for Site {
    fn kernel(&self) -> DomainResult<&Kernel> {
        Kernel::of(&**self.context())
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("languages", &self.languages)
            .field("blueprints", &self.blueprints.len())
            .finish_non_exhaustive()
    }
}

/// Entry point: a site backed by one repository
pub struct Cms {
    kernel: Rc<Kernel>,
    site: Rc<Site>,
}

impl Cms {
    pub fn builder() -> CmsBuilder {
        CmsBuilder::default()
    }

    /// A memory-backed instance with default settings
    pub fn in_memory() -> DomainResult<Cms> {
        Cms::builder().build()
    }

    pub fn site(&self) -> Rc<Site> {
        self.site.clone()
    }

    pub fn kernel(&self) -> &Rc<Kernel> {
        &self.kernel
    }

    /// Find a page or draft by id
    pub fn page(&self, id: &str) -> DomainResult<Option<Rc<Page>>> {
        self.site.find_page_or_draft(id)
    }

    pub fn hooks(&self) -> &HookDispatcher {
        self.kernel.hooks()
    }

    pub fn trigger(&self, name: &str, arguments: Arguments) -> DomainResult<()> {
        self.kernel.hooks().trigger(name, arguments)
    }

    pub fn apply(&self, name: &str, arguments: Arguments, key: &str) -> DomainResult<HookValue> {
        self.kernel.hooks().apply(name, arguments, key)
    }

    pub fn languages(&self) -> &Languages {
        self.kernel.languages()
    }

    pub fn default_language(&self) -> LanguageCode {
        self.kernel.default_language()
    }

    pub fn language(&self) -> LanguageCode {
        self.kernel.language()
    }

    /// Switch the active language; `None` goes back to the default
    pub fn set_language(&self, code: Option<&str>) -> DomainResult<()> {
        self.kernel.set_language(code)
    }
}

impl fmt::Debug for Cms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cms").field("kernel", &self.kernel).finish()
    }
}

#[derive(Default)]
pub struct CmsBuilder {
    config: CmsConfig,
    repository: Option<Box<dyn PageRepository>>,
    hooks: HookRegistry,
    permissions: Option<Box<dyn Permissions>>,
    languages: Option<Languages>,
    blueprints: Blueprints,
}

impl CmsBuilder {
    pub fn config(mut self, config: CmsConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this repository instead of the configured backend
    pub fn repository(mut self, repository: impl PageRepository + 'static) -> Self {
        self.repository = Some(Box::new(repository));
        self
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn permissions(mut self, permissions: impl Permissions + 'static) -> Self {
        self.permissions = Some(Box::new(permissions));
        self
    }

    pub fn languages(mut self, languages: Languages) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Blueprints added on top of the configured ones
    pub fn blueprint(mut self, template: &str, blueprint: Blueprint) -> Self {
        self.blueprints.insert(template, blueprint);
        self
    }

    pub fn build(self) -> DomainResult<Cms> {
        let languages = match self.languages {
            Some(languages) => languages,
            None => self.config.languages().map_err(|err| {
                DomainError::invalid_value("error.config.invalid", err.to_string())
            })?,
        };

        let repository = match self.repository {
            Some(repository) => repository,
            None => open_repository(&self.config.backend, languages.is_multilang())?,
        };

        let mut blueprints = self.config.blueprints.clone();
        blueprints.merge(self.blueprints);

        tracing::info!(
            "Starting content tree with {} repository ({} languages)",
            repository.kind(),
            languages.len()
        );

        let kernel = Rc::new(Kernel {
            languages,
            blueprints,
            hooks: HookDispatcher::new(self.hooks),
            repository: RefCell::new(repository),
            permissions: self.permissions.unwrap_or_else(|| Box::new(AllowAll)),
            current_language: RefCell::new(None),
            site: RefCell::new(Weak::new()),
        });

        let site = Site::new(kernel.clone());
        *kernel.site.borrow_mut() = Rc::downgrade(&site);

        Ok(Cms { kernel, site })
    }
}

fn open_repository(backend: &BackendConfig, multilang: bool) -> DomainResult<Box<dyn PageRepository>> {
    let repository: Box<dyn PageRepository> = match backend {
        BackendConfig::Memory => Box::new(InMemoryPageRepository::new()),
        BackendConfig::FileSystem { root } => {
            Box::new(FileSystemPageRepository::open(root, multilang)?)
        }
        BackendConfig::Sqlite { path } => Box::new(SqlitePageRepository::new_with_path(path)?),
    };
    Ok(repository)
}
