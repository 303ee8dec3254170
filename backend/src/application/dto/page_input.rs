use crate::domain::content::{fields_from, Fields};
use serde::{Deserialize, Serialize};

/// Props for creating a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub content: Fields,
    /// Lists the page at this position right after creation
    #[serde(default)]
    pub num: Option<i64>,
    /// Defaults to `true`
    #[serde(default)]
    pub draft: Option<bool>,
}

impl PageInput {
    pub fn new() -> Self {
        PageInput::default()
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.field("title", title)
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.content.extend(fields_from([(key, value)]));
        self
    }

    pub fn content(mut self, content: Fields) -> Self {
        self.content.extend(fields_from(content));
        self
    }

    pub fn num(mut self, num: i64) -> Self {
        self.num = Some(num);
        self
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.draft = Some(draft);
        self
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "slug": self.slug,
            "template": self.template,
            "content": self.content,
            "num": self.num,
            "draft": self.draft,
        })
    }
}

/// Options for duplicating a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateOptions {
    #[serde(default)]
    pub children: bool,
    #[serde(default)]
    pub files: bool,
    #[serde(default)]
    pub title: Option<String>,
}

impl DuplicateOptions {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "children": self.children,
            "files": self.files,
            "title": self.title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_field_keys() {
        let input = PageInput::new().slug("a").title("Hello").field("Text", "World");
        assert_eq!(input.content["title"], "Hello");
        assert_eq!(input.content["text"], "World");
        assert_eq!(input.draft, None);
    }

    #[test]
    fn test_input_from_json() {
        let input: PageInput = serde_json::from_value(serde_json::json!({
            "slug": "a",
            "content": { "title": "A" },
            "num": 2
        }))
        .unwrap();
        assert_eq!(input.num, Some(2));
        assert_eq!(input.to_value()["content"]["title"], "A");
    }
}
