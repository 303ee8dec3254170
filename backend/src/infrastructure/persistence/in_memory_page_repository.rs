use crate::application::repositories::{CopyOptions, PageRecord, PageRepository, Storage};
use crate::domain::content::Fields;
use crate::domain::entities::PageFile;
use crate::domain::value_objects::{LanguageCode, PageId, Slug, Template, VersionId};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::storage::MemoryStorage;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

/// Fixture description of one page and its subtree
#[derive(Debug, Clone, Deserialize)]
pub struct PageProps {
    pub slug: String,
    #[serde(default)]
    pub num: Option<i64>,
    #[serde(default)]
    pub template: Option<String>,
    /// Latest content in the default language
    #[serde(default)]
    pub content: Fields,
    /// Latest content of further languages
    #[serde(default)]
    pub translations: IndexMap<String, Fields>,
    #[serde(default)]
    pub children: Vec<PageProps>,
    #[serde(default)]
    pub drafts: Vec<PageProps>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Fixture root: top-level pages and drafts of a site
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteProps {
    #[serde(default)]
    pub children: Vec<PageProps>,
    #[serde(default)]
    pub drafts: Vec<PageProps>,
}

/// Page repository kept entirely in memory.
///
/// Records are kept in insertion order, which is the repository order
/// collections fall back to.
#[derive(Debug, Default)]
pub struct InMemoryPageRepository {
    records: Vec<PageRecord>,
    contents: HashMap<PageId, MemoryStorage>,
    files: HashMap<PageId, Vec<String>>,
}

impl InMemoryPageRepository {
    pub fn new() -> Self {
        InMemoryPageRepository::default()
    }

    /// Build a repository from a JSON fixture, content in the single language
    pub fn from_value(value: serde_json::Value) -> DomainResult<Self> {
        Self::from_value_with_language(value, &LanguageCode::single())
    }

    /// Build a repository from a JSON fixture whose `content` belongs to `language`
    pub fn from_value_with_language(value: serde_json::Value, language: &LanguageCode) -> DomainResult<Self> {
        let props: SiteProps = serde_json::from_value(value).map_err(|e| {
            DomainError::invalid_value("error.fixture.invalid", format!("Invalid fixture: {}", e))
        })?;

        let mut repository = InMemoryPageRepository::new();
        repository.load(None, props.children, false, language)?;
        repository.load(None, props.drafts, true, language)?;

        tracing::debug!("Loaded {} pages from fixture", repository.records.len());
        Ok(repository)
    }

    fn load(
        &mut self,
        parent: Option<&PageId>,
        pages: Vec<PageProps>,
        is_draft: bool,
        language: &LanguageCode,
    ) -> DomainResult<()> {
        for props in pages {
            let template = match &props.template {
                Some(template) => Template::new(template.as_str())?,
                None => Template::default(),
            };
            let record = PageRecord::new(parent, Slug::new(props.slug)?, props.num, is_draft, template)?;
            self.insert(&record)?;

            let storage = self.storage_for(&record.id)?;
            if !props.content.is_empty() {
                storage.write(VersionId::Latest, language, &props.content)?;
            }
            for (code, fields) in &props.translations {
                storage.write(VersionId::Latest, &LanguageCode::new(code.as_str())?, fields)?;
            }
            if !props.files.is_empty() {
                self.files.insert(record.id.clone(), props.files);
            }

            self.load(Some(&record.id), props.children, false, language)?;
            self.load(Some(&record.id), props.drafts, true, language)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &PageId) -> Option<usize> {
        self.records.iter().position(|record| record.id == *id)
    }

    fn storage_for(&self, id: &PageId) -> DomainResult<MemoryStorage> {
        self.contents.get(id).cloned().ok_or_else(|| not_found(id))
    }

    fn ensure_free(&self, id: &PageId) -> DomainResult<()> {
        if self.position(id).is_some() {
            return Err(DomainError::duplicate(
                "error.page.duplicate",
                format!("A page with the id \"{}\" already exists", id),
            ));
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

impl PageRepository for InMemoryPageRepository {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn children_of(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.parent_id().as_ref() == parent)
            .cloned()
            .collect())
    }

    fn find(&self, id: &PageId) -> DomainResult<Option<PageRecord>> {
        Ok(self.position(id).map(|index| self.records[index].clone()))
    }

    fn insert(&mut self, record: &PageRecord) -> DomainResult<()> {
        self.ensure_free(&record.id)?;
        self.records.push(record.clone());
        self.contents.insert(record.id.clone(), MemoryStorage::new());
        Ok(())
    }

    fn relocate(&mut self, from: &PageRecord, to: &PageRecord) -> DomainResult<()> {
        let index = self.position(&from.id).ok_or_else(|| not_found(&from.id))?;
        if from.id != to.id {
            self.ensure_free(&to.id)?;
        }

        for record in self.records.iter_mut() {
            let Some(id) = record.id.rebase(&from.id, &to.id) else {
                continue;
            };
            if let Some(storage) = self.contents.remove(&record.id) {
                self.contents.insert(id.clone(), storage);
            }
            if let Some(files) = self.files.remove(&record.id) {
                self.files.insert(id.clone(), files);
            }
            record.id = id;
        }
        self.records[index] = to.clone();
        Ok(())
    }

    fn remove(&mut self, record: &PageRecord) -> DomainResult<()> {
        if self.position(&record.id).is_none() {
            return Err(not_found(&record.id));
        }

        let removed: Vec<PageId> = self
            .records
            .iter()
            .filter(|other| other.id.is_within(&record.id))
            .map(|other| other.id.clone())
            .collect();
        self.records.retain(|other| !other.id.is_within(&record.id));
        for id in removed {
            self.contents.remove(&id);
            self.files.remove(&id);
        }
        Ok(())
    }

    fn copy(&mut self, from: &PageRecord, to: &PageRecord, options: CopyOptions) -> DomainResult<()> {
        let source = self.storage_for(&from.id)?;
        let descendants = if options.children {
            self.descendants_of(&from.id)?
        } else {
            Vec::new()
        };

        self.insert(to)?;
        self.contents.insert(to.id.clone(), source.detached());
        if options.files {
            if let Some(files) = self.files.get(&from.id).cloned() {
                self.files.insert(to.id.clone(), files);
            }
        }

        for descendant in descendants {
            let Some(id) = descendant.id.rebase(&from.id, &to.id) else {
                continue;
            };
            let copy = PageRecord { id, ..descendant.clone() };
            let content = self.storage_for(&descendant.id)?.detached();
            self.insert(&copy)?;
            self.contents.insert(copy.id.clone(), content);
            if options.files {
                if let Some(files) = self.files.get(&descendant.id).cloned() {
                    self.files.insert(copy.id.clone(), files);
                }
            }
        }
        Ok(())
    }

    fn files(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>> {
        Ok(self
            .files
            .get(&record.id)
            .map(|files| {
                files
                    .iter()
                    .map(|name| PageFile::new(record.id.clone(), name.as_str()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn storage(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>> {
        Ok(Box::new(self.storage_for(&record.id)?))
    }
}
