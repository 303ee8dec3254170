use super::{StorageError, StorageResult};
use crate::application::repositories::Storage;
use crate::domain::content::Fields;
use crate::domain::value_objects::{LanguageCode, Template, VersionId};
use crate::domain::DomainResult;
use crate::infrastructure::parsers::TxtCodec;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the `changes` version inside a page directory
pub const CHANGES_DIR: &str = "_changes";

/// Content stored as `.txt` files inside the page directory.
///
/// `latest` lives next to the page's files, `changes` in `_changes/`.
/// Single-language sites use `<template>.txt`, multi-language sites
/// `<template>.<lang>.txt`.
#[derive(Debug, Clone)]
pub struct PlainTextStorage {
    root: PathBuf,
    template: Template,
    multilang: bool,
}

impl PlainTextStorage {
    pub fn new(root: impl Into<PathBuf>, template: Template, multilang: bool) -> Self {
        PlainTextStorage {
            root: root.into(),
            template,
            multilang,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, version: VersionId) -> PathBuf {
        match version {
            VersionId::Latest => self.root.clone(),
            VersionId::Changes => self.root.join(CHANGES_DIR),
        }
    }

    /// Path of the content file for one slot
    pub fn content_file(&self, version: VersionId, language: &LanguageCode) -> PathBuf {
        let name = if self.multilang && !language.is_single() {
            format!("{}.{}.txt", self.template, language)
        } else {
            format!("{}.txt", self.template)
        };
        self.version_dir(version).join(name)
    }

    /// Language of a content file name, if it belongs to this template
    fn language_of(&self, file_name: &str) -> Option<LanguageCode> {
        let stem = file_name.strip_suffix(".txt")?;
        if self.multilang {
            let code = stem.strip_prefix(self.template.as_str())?.strip_prefix('.')?;
            LanguageCode::new(code).ok()
        } else if stem == self.template.as_str() {
            Some(LanguageCode::single())
        } else {
            None
        }
    }

    fn read_file(&self, path: &Path) -> StorageResult<Fields> {
        if !path.is_file() {
            return Ok(Fields::new());
        }
        let text = fs::read_to_string(path)?;
        Ok(TxtCodec::decode(&text))
    }

    fn write_file(&self, path: &Path, fields: &Fields) -> StorageResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::Layout(format!("{} has no parent", path.display())))?;
        fs::create_dir_all(parent)?;
        fs::write(path, TxtCodec::encode(fields))?;
        Ok(())
    }

    fn delete_file(&self, version: VersionId, path: &Path) -> StorageResult<()> {
        if path.is_file() {
            fs::remove_file(path)?;
        }

        // drop an empty `_changes` directory
        if version == VersionId::Changes {
            let dir = self.version_dir(version);
            if dir.is_dir() && fs::read_dir(&dir)?.next().is_none() {
                fs::remove_dir(&dir)?;
            }
        }
        Ok(())
    }

    fn list_slots(&self) -> StorageResult<Vec<(VersionId, LanguageCode)>> {
        let mut slots = Vec::new();
        for version in VersionId::all() {
            let dir = self.version_dir(version);
            if !dir.is_dir() {
                continue;
            }

            let mut names: Vec<String> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .collect();
            names.sort();

            for name in names {
                if let Some(language) = self.language_of(&name) {
                    slots.push((version, language));
                }
            }
        }
        Ok(slots)
    }
}

impl Storage for PlainTextStorage {
    fn kind(&self) -> &'static str {
        "plain_text"
    }

    fn read(&self, version: VersionId, language: &LanguageCode) -> DomainResult<Fields> {
        Ok(self.read_file(&self.content_file(version, language))?)
    }

    fn write(&self, version: VersionId, language: &LanguageCode, fields: &Fields) -> DomainResult<()> {
        let path = self.content_file(version, language);
        tracing::debug!("Writing content file: {}", path.display());
        Ok(self.write_file(&path, fields)?)
    }

    fn exists(&self, version: VersionId, language: &LanguageCode) -> DomainResult<bool> {
        Ok(self.content_file(version, language).is_file())
    }

    fn delete(&self, version: VersionId, language: &LanguageCode) -> DomainResult<()> {
        Ok(self.delete_file(version, &self.content_file(version, language))?)
    }

    fn slots(&self) -> DomainResult<Vec<(VersionId, LanguageCode)>> {
        Ok(self.list_slots()?)
    }

    fn boxed_clone(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::fields_from;
    use tempfile::TempDir;

    #[test]
    fn test_single_language_file_names() {
        let temp_dir = TempDir::new().unwrap();
        let storage = PlainTextStorage::new(temp_dir.path(), Template::new("article").unwrap(), false);

        storage
            .write(VersionId::Latest, &LanguageCode::single(), &fields_from([("title", "Hello")]))
            .unwrap();

        assert!(temp_dir.path().join("article.txt").is_file());
        let fields = storage.read(VersionId::Latest, &LanguageCode::single()).unwrap();
        assert_eq!(fields["title"], "Hello");
    }

    #[test]
    fn test_multi_language_and_changes() {
        let temp_dir = TempDir::new().unwrap();
        let storage = PlainTextStorage::new(temp_dir.path(), Template::default(), true);
        let en = LanguageCode::new("en").unwrap();
        let de = LanguageCode::new("de").unwrap();

        storage.write(VersionId::Latest, &en, &fields_from([("title", "Hello")])).unwrap();
        storage.write(VersionId::Changes, &de, &fields_from([("title", "Hallo")])).unwrap();

        assert!(temp_dir.path().join("default.en.txt").is_file());
        assert!(temp_dir.path().join("_changes/default.de.txt").is_file());

        let slots = storage.slots().unwrap();
        assert_eq!(slots, vec![(VersionId::Latest, en.clone()), (VersionId::Changes, de.clone())]);

        storage.delete(VersionId::Changes, &de).unwrap();
        assert!(!temp_dir.path().join(CHANGES_DIR).exists());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = PlainTextStorage::new(temp_dir.path().join("missing"), Template::default(), false);

        let fields = storage.read(VersionId::Latest, &LanguageCode::single()).unwrap();
        assert!(fields.is_empty());
        assert!(storage.slots().unwrap().is_empty());
        assert!(storage.delete(VersionId::Latest, &LanguageCode::single()).is_ok());
    }

    #[test]
    fn test_foreign_txt_files_are_not_slots() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "Title: x").unwrap();
        fs::write(temp_dir.path().join("default.txt"), "Title: y").unwrap();

        let storage = PlainTextStorage::new(temp_dir.path(), Template::default(), false);
        assert_eq!(storage.slots().unwrap(), vec![(VersionId::Latest, LanguageCode::single())]);
    }
}
