/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Unique identifier for a Page: the slash separated path of slugs from the site root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.id.invalid",
                "PageId cannot be empty",
            ));
        }
        if trimmed.split('/').any(|segment| segment.is_empty()) {
            return Err(DomainError::invalid_value(
                "error.page.id.invalid",
                format!("PageId \"{}\" contains an empty segment", id),
            ));
        }
        Ok(PageId(trimmed.to_string()))
    }

    /// Build the id of a page with the given slug below an optional parent
    pub fn from_parts(parent: Option<&PageId>, slug: &Slug) -> Self {
        match parent {
            Some(parent) => PageId(format!("{}/{}", parent.0, slug.as_str())),
            None => PageId(slug.as_str().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id of the parent page, `None` for top-level pages
    pub fn parent(&self) -> Option<PageId> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| PageId(parent.to_string()))
    }

    /// The last path segment
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether this id lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &PageId) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0.as_bytes()[ancestor.0.len()] == b'/'
    }

    /// Whether this id equals `other` or lies below it
    pub fn is_within(&self, other: &PageId) -> bool {
        self == other || self.is_descendant_of(other)
    }

    /// Replace the `from` prefix of this id with `to`
    ///
    /// Returns `None` when the id is not within `from`.
    pub fn rebase(&self, from: &PageId, to: &PageId) -> Option<PageId> {
        if self == from {
            return Some(to.clone());
        }
        if self.is_descendant_of(from) {
            return Some(PageId(format!("{}{}", to.0, &self.0[from.0.len()..])));
        }
        None
    }
}

impl ValueObject for PageId {}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The URL-path segment identifying a page among its siblings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    /// Accept a slug verbatim; it must be non-empty and free of slashes
    pub fn new(slug: impl Into<String>) -> DomainResult<Self> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.slug.invalid",
                "The page slug is required",
            ));
        }
        if slug.contains('/') || slug.trim() != slug {
            return Err(DomainError::invalid_value(
                "error.page.slug.invalid",
                format!("The slug \"{}\" is invalid", slug),
            ));
        }
        Ok(Slug(slug))
    }

    /// Sanitize arbitrary input into a slug: transliterate, lowercase and
    /// collapse everything outside `a-z0-9` into single dashes
    pub fn slugify(input: &str) -> DomainResult<Self> {
        let ascii = deunicode::deunicode(input).to_lowercase();
        let slug = SLUG_SEPARATORS.replace_all(&ascii, "-");
        let slug = slug.trim_matches('-');
        if slug.is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.slug.invalid",
                format!("The slug \"{}\" is invalid", input),
            ));
        }
        Ok(Slug(slug.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The blueprint/template name of a page, always lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template(String);

impl Template {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_lowercase();
        if name.is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.template.invalid",
                "Template cannot be empty",
            ));
        }
        if name.contains(['/', '.']) {
            return Err(DomainError::invalid_value(
                "error.page.template.invalid",
                format!("The template \"{}\" is invalid", name),
            ));
        }
        Ok(Template(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Template {
    fn default() -> Self {
        Template("default".to_string())
    }
}

impl ValueObject for Template {}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A language code such as `en`; single-language sites use `default`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub const SINGLE: &'static str = "default";

    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_lowercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(DomainError::invalid_value(
                "error.language.code",
                format!("The language code \"{}\" is invalid", code),
            ));
        }
        Ok(LanguageCode(code))
    }

    /// The implicit code used when no languages are configured
    pub fn single() -> Self {
        LanguageCode(Self::SINGLE.to_string())
    }

    pub fn is_single(&self) -> bool {
        self.0 == Self::SINGLE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for LanguageCode {}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility status of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Draft,
    Unlisted,
    Listed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Unlisted => "unlisted",
            Status::Listed => "listed",
        }
    }
}

impl ValueObject for Status {}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "unlisted" => Ok(Status::Unlisted),
            "listed" => Ok(Status::Listed),
            other => Err(DomainError::invalid_value(
                "error.page.status.invalid",
                format!("The status \"{}\" does not exist", other),
            )),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named content slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionId {
    /// The published content
    Latest,
    /// Unpublished edits
    Changes,
}

impl VersionId {
    pub fn all() -> [VersionId; 2] {
        [VersionId::Latest, VersionId::Changes]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionId::Latest => "latest",
            VersionId::Changes => "changes",
        }
    }
}

impl ValueObject for VersionId {}

impl FromStr for VersionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(VersionId::Latest),
            "changes" => Ok(VersionId::Changes),
            other => Err(DomainError::invalid_value(
                "error.version.invalid",
                format!("The version \"{}\" does not exist", other),
            )),
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable unique identifier of a page, independent of its location in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageUuid(String);

impl PageUuid {
    pub fn new(uuid: impl Into<String>) -> DomainResult<Self> {
        let uuid = uuid.into();
        let uuid = uuid.trim().trim_start_matches("page://");
        if uuid.is_empty() {
            return Err(DomainError::invalid_value(
                "error.page.uuid.invalid",
                "PageUuid cannot be empty",
            ));
        }
        Ok(PageUuid(uuid.to_string()))
    }

    pub fn generate() -> Self {
        PageUuid(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `page://` permalink form
    pub fn to_uri(&self) -> String {
        format!("page://{}", self.0)
    }
}

impl ValueObject for PageUuid {}

impl fmt::Display for PageUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
