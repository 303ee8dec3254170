/// Per-template page settings that the lifecycle operations depend on
use super::value_objects::Template;
use indexmap::IndexMap;
use serde::Deserialize;

/// How a page's sorting number is computed when it gets listed
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum NumMode {
    /// Position among the listed siblings
    #[default]
    Default,
    /// Always `0`
    Zero,
    /// The `date` field as `YYYYMMDD`
    Date,
    /// The `date` field as `YYYYMMDDHHMM`
    DateTime,
    /// A `{{ page.field }}` expression evaluated against the page content
    Template(String),
}

impl NumMode {
    /// Whether siblings with this mode take part in manual renumbering
    pub fn is_sortable(&self) -> bool {
        matches!(self, NumMode::Default)
    }
}

impl From<String> for NumMode {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | "default" | "sort" => NumMode::Default,
            "zero" | "0" => NumMode::Zero,
            "date" => NumMode::Date,
            "datetime" => NumMode::DateTime,
            other => NumMode::Template(other.to_string()),
        }
    }
}

impl From<&str> for NumMode {
    fn from(value: &str) -> Self {
        NumMode::from(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub num: NumMode,
}

impl Blueprint {
    pub fn with_num(num: impl Into<NumMode>) -> Self {
        Blueprint {
            title: None,
            num: num.into(),
        }
    }
}

/// Blueprints keyed by template name; unknown templates get the default blueprint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Blueprints(IndexMap<String, Blueprint>);

impl Blueprints {
    pub fn new() -> Self {
        Blueprints::default()
    }

    pub fn insert(&mut self, template: &str, blueprint: Blueprint) -> &mut Self {
        self.0.insert(template.to_lowercase(), blueprint);
        self
    }

    pub fn get(&self, template: &Template) -> Blueprint {
        self.0.get(template.as_str()).cloned().unwrap_or_default()
    }

    pub fn merge(&mut self, other: Blueprints) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_mode_parsing() {
        assert_eq!(NumMode::from("default"), NumMode::Default);
        assert_eq!(NumMode::from("sort"), NumMode::Default);
        assert_eq!(NumMode::from("zero"), NumMode::Zero);
        assert_eq!(NumMode::from("0"), NumMode::Zero);
        assert_eq!(NumMode::from("date"), NumMode::Date);
        assert_eq!(NumMode::from("datetime"), NumMode::DateTime);
        assert_eq!(
            NumMode::from("{{ page.year }}"),
            NumMode::Template("{{ page.year }}".to_string())
        );
    }

    #[test]
    fn test_unknown_template_uses_default_blueprint() {
        let mut blueprints = Blueprints::new();
        blueprints.insert("Article", Blueprint::with_num("date"));

        let article = blueprints.get(&Template::new("article").unwrap());
        assert_eq!(article.num, NumMode::Date);

        let other = blueprints.get(&Template::new("project").unwrap());
        assert_eq!(other.num, NumMode::Default);
        assert!(other.num.is_sortable());
    }

    #[test]
    fn test_blueprints_deserialize() {
        let blueprints: Blueprints = serde_json::from_value(serde_json::json!({
            "article": { "title": "Article", "num": "date" },
            "note": { "num": "zero" },
            "page": {}
        }))
        .unwrap();

        assert_eq!(blueprints.len(), 3);
        assert_eq!(blueprints.get(&Template::new("note").unwrap()).num, NumMode::Zero);
        assert_eq!(
            blueprints.get(&Template::new("article").unwrap()).title.as_deref(),
            Some("Article")
        );
        assert_eq!(blueprints.get(&Template::new("page").unwrap()).num, NumMode::Default);
    }
}
