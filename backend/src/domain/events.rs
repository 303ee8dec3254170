/// Hook events and the values carried in their argument bags
use super::aggregates::Page;
use super::content::Fields;
use super::entities::Site;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

static EVENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(?:\.([^.]*?))?(?::(.*))?$").unwrap());

/// A value passed to or returned from a hook handler
#[derive(Clone, Default)]
pub enum HookValue {
    #[default]
    Null,
    Value(serde_json::Value),
    Page(Rc<Page>),
    Site(Rc<Site>),
}

impl HookValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HookValue::Null | HookValue::Value(serde_json::Value::Null))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HookValue::Value(value) => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HookValue::Value(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HookValue::Value(value) => value.as_str(),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            HookValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<Rc<Page>> {
        match self {
            HookValue::Page(page) => Some(page.clone()),
            _ => None,
        }
    }

    pub fn as_site(&self) -> Option<Rc<Site>> {
        match self {
            HookValue::Site(site) => Some(site.clone()),
            _ => None,
        }
    }
}

impl PartialEq for HookValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HookValue::Page(a), HookValue::Page(b)) => Rc::ptr_eq(a, b),
            (HookValue::Site(a), HookValue::Site(b)) => Rc::ptr_eq(a, b),
            (HookValue::Value(a), HookValue::Value(b)) => a == b,
            (a, b) => a.is_null() && b.is_null(),
        }
    }
}

impl fmt::Debug for HookValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookValue::Null => write!(f, "Null"),
            HookValue::Value(value) => write!(f, "Value({})", value),
            HookValue::Page(page) => write!(f, "Page({})", page.id()),
            HookValue::Site(_) => write!(f, "Site"),
        }
    }
}

impl From<serde_json::Value> for HookValue {
    fn from(value: serde_json::Value) -> Self {
        HookValue::Value(value)
    }
}

impl From<i64> for HookValue {
    fn from(value: i64) -> Self {
        HookValue::Value(value.into())
    }
}

impl From<i32> for HookValue {
    fn from(value: i32) -> Self {
        HookValue::Value(value.into())
    }
}

impl From<bool> for HookValue {
    fn from(value: bool) -> Self {
        HookValue::Value(value.into())
    }
}

impl From<&str> for HookValue {
    fn from(value: &str) -> Self {
        HookValue::Value(value.into())
    }
}

impl From<String> for HookValue {
    fn from(value: String) -> Self {
        HookValue::Value(value.into())
    }
}

impl From<&Fields> for HookValue {
    fn from(fields: &Fields) -> Self {
        HookValue::Value(serde_json::Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                .collect(),
        ))
    }
}

impl From<Rc<Page>> for HookValue {
    fn from(page: Rc<Page>) -> Self {
        HookValue::Page(page)
    }
}

impl From<Rc<Site>> for HookValue {
    fn from(site: Rc<Site>) -> Self {
        HookValue::Site(site)
    }
}

impl<T: Into<HookValue>> From<Option<T>> for HookValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HookValue::Null)
    }
}

/// Ordered argument bag of an event
pub type Arguments = IndexMap<String, HookValue>;

/// Build an argument bag from `(name, value)` pairs
pub fn arguments<I, V>(pairs: I) -> Arguments
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<HookValue>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}

/// A named hook invocation: `type.action:state` plus its arguments
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    kind: String,
    action: Option<String>,
    state: Option<String>,
    arguments: Arguments,
}

impl Event {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        let name = name.into();
        let (kind, action, state) = match EVENT_NAME.captures(&name) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                caps.get(2).map(|m| m.as_str().to_string()),
                caps.get(3).map(|m| m.as_str().to_string()),
            ),
            None => (name.clone(), None, None),
        };

        Event {
            name,
            kind,
            action,
            state,
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The leading `type` segment, e.g. `page` in `page.create:after`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&HookValue> {
        self.arguments.get(name)
    }

    pub fn page(&self, name: &str) -> Option<Rc<Page>> {
        self.argument(name).and_then(HookValue::as_page)
    }

    /// A copy of this event with one argument replaced
    pub fn with_argument(&self, name: &str, value: HookValue) -> Event {
        let mut event = self.clone();
        event.arguments.insert(name.to_string(), value);
        event
    }

    /// Wildcard patterns matching this event, most specific first
    ///
    /// Names that already contain `*` have no wildcard variants.
    pub fn name_wildcards(&self) -> Vec<String> {
        if self.name.contains('*') {
            return Vec::new();
        }

        let kind = &self.kind;
        match (self.action.as_deref(), self.state.as_deref()) {
            (Some(action), Some(state)) => vec![
                format!("{}.*:{}", kind, state),
                format!("{}.{}:*", kind, action),
                format!("{}.*:*", kind),
                format!("*.{}:{}", action, state),
                format!("*.{}:*", action),
                format!("*:{}", state),
                "*".to_string(),
            ],
            (None, Some(state)) => vec![
                format!("{}:*", kind),
                format!("*:{}", state),
                "*".to_string(),
            ],
            (Some(action), None) => vec![
                format!("{}.*", kind),
                format!("*.{}", action),
                "*".to_string(),
            ],
            (None, None) => vec!["*".to_string()],
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
