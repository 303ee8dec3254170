/// Content snapshots read from a page's storage
use super::value_objects::{LanguageCode, VersionId};
use indexmap::IndexMap;

/// Insertion-ordered field map with lower-case keys
pub type Fields = IndexMap<String, String>;

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Build a field map from arbitrary pairs, normalizing every key
pub fn fields_from<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (normalize_key(key.as_ref()), value.into()))
        .collect()
}

/// Read-only snapshot of one (version, language) slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    language: LanguageCode,
    version: VersionId,
    fields: Fields,
}

impl Content {
    pub fn new(language: LanguageCode, version: VersionId, fields: Fields) -> Self {
        Content {
            language,
            version,
            fields: fields_from(fields),
        }
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn version(&self) -> VersionId {
        self.version
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(&normalize_key(key))
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").filter(|title| !title.trim().is_empty())
    }

    pub fn uuid(&self) -> Option<&str> {
        self.get("uuid")
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_map(&self) -> Fields {
        self.fields.clone()
    }

    /// The fields of this snapshot with `values` merged over them
    pub fn merged(&self, values: &Fields) -> Fields {
        let mut fields = self.fields.clone();
        for (key, value) in values {
            fields.insert(normalize_key(key), value.clone());
        }
        fields
    }
}

/// Per-language view of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    code: LanguageCode,
    slug: Option<String>,
    content: Fields,
    exists: bool,
}

impl Translation {
    pub fn new(code: LanguageCode, content: Fields, exists: bool) -> Self {
        let slug = content
            .get("slug")
            .filter(|slug| !slug.trim().is_empty())
            .cloned();
        Translation {
            code,
            slug,
            content,
            exists,
        }
    }

    pub fn code(&self) -> &LanguageCode {
        &self.code
    }

    /// The translated slug, if one is stored for this language
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn content(&self) -> &Fields {
        &self.content
    }

    pub fn exists(&self) -> bool {
        self.exists
    }
}
