use crate::application::repositories::Storage;
use crate::domain::content::Fields;
use crate::domain::value_objects::{LanguageCode, VersionId};
use crate::domain::DomainResult;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

type Slots = IndexMap<(VersionId, LanguageCode), Fields>;

/// In-memory content storage.
///
/// Clones share the same slots, so a page and the repository that created it
/// see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Rc<RefCell<Slots>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// A storage pre-filled with the latest content of one language
    pub fn with_content(language: &LanguageCode, fields: Fields) -> Self {
        let storage = MemoryStorage::new();
        storage
            .slots
            .borrow_mut()
            .insert((VersionId::Latest, language.clone()), fields);
        storage
    }

    /// An independent copy that no longer shares slots with `self`
    pub fn detached(&self) -> Self {
        MemoryStorage {
            slots: Rc::new(RefCell::new(self.slots.borrow().clone())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn read(&self, version: VersionId, language: &LanguageCode) -> DomainResult<Fields> {
        Ok(self
            .slots
            .borrow()
            .get(&(version, language.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn write(&self, version: VersionId, language: &LanguageCode, fields: &Fields) -> DomainResult<()> {
        self.slots
            .borrow_mut()
            .insert((version, language.clone()), fields.clone());
        Ok(())
    }

    fn exists(&self, version: VersionId, language: &LanguageCode) -> DomainResult<bool> {
        Ok(self.slots.borrow().contains_key(&(version, language.clone())))
    }

    fn delete(&self, version: VersionId, language: &LanguageCode) -> DomainResult<()> {
        self.slots
            .borrow_mut()
            .shift_remove(&(version, language.clone()));
        Ok(())
    }

    fn slots(&self) -> DomainResult<Vec<(VersionId, LanguageCode)>> {
        Ok(self.slots.borrow().keys().cloned().collect())
    }

    fn boxed_clone(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}
