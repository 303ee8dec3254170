/// Sorting number computation for pages that get listed
use crate::domain::aggregates::Page;
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::blueprint::NumMode;
use crate::domain::content::Content;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static NUM_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*page\.([A-Za-z0-9_]+)(?:\.toDate\(\s*["']([^"']*)["']\s*\))?\s*\}\}"#)
        .unwrap()
});

const DATE_FORMAT: &str = "%Y%m%d";
const DATETIME_FORMAT: &str = "%Y%m%d%H%M";

impl Page {
    /// The sorting number this page would get when listed at `position`.
    ///
    /// Manually sorted pages clamp the position into `1..=max`, where `max`
    /// counts the listed siblings plus this page when it is not listed yet.
    pub fn create_num(&self, position: Option<i64>) -> DomainResult<i64> {
        match self.blueprint().num {
            NumMode::Zero => Ok(0),
            NumMode::Date => self.date_num(DATE_FORMAT),
            NumMode::DateTime => self.date_num(DATETIME_FORMAT),
            NumMode::Template(template) => {
                let content = self.content_for(&self.context().default_language())?;
                Ok(leading_int(&evaluate(&template, self, &content)))
            }
            NumMode::Default => {
                let listed = self.siblings()?.listed();
                let mut max = listed.len() as i64;
                if listed.index_of(self.id()).is_none() {
                    max += 1;
                }

                Ok(match position {
                    None => max,
                    Some(position) if position < 1 => 1,
                    Some(position) => position.min(max),
                })
            }
        }
    }

    /// The `date` field formatted with `format`; today when the field is
    /// missing or unreadable
    fn date_num(&self, format: &str) -> DomainResult<i64> {
        let content = self.content_for(&self.context().default_language())?;
        let date = content
            .get("date")
            .and_then(parse_date)
            .unwrap_or_else(|| Local::now().naive_local());

        let formatted = date.format(format).to_string();
        formatted.parse::<i64>().map_err(|_| {
            DomainError::invalid_value(
                "error.page.num.invalid",
                format!("\"{}\" is not a valid sorting number", formatted),
            )
        })
    }
}

/// Parse the date notations content files commonly carry
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Replace every `{{ page.field }}` and `{{ page.field.toDate("Ymd") }}`
/// in `template`
fn evaluate(template: &str, page: &Page, content: &Content) -> String {
    NUM_EXPRESSION
        .replace_all(template, |caps: &Captures| {
            let field = &caps[1];
            let value = match content.get(field) {
                Some(value) => value.to_string(),
                None => intrinsic(page, field).unwrap_or_default(),
            };

            match caps.get(2) {
                Some(format) => parse_date(&value)
                    .map(|date| date.format(&date_format(format.as_str())).to_string())
                    .unwrap_or_default(),
                None => value,
            }
        })
        .into_owned()
}

fn intrinsic(page: &Page, field: &str) -> Option<String> {
    match field {
        "slug" | "uid" => Some(page.slug().to_string()),
        "id" => Some(page.id().to_string()),
        "template" => Some(page.template().to_string()),
        "num" => page.num().map(|num| num.to_string()),
        _ => None,
    }
}

/// Translate a `Ymd`-style date pattern into a chrono format string
fn date_format(pattern: &str) -> String {
    let mut format = String::new();
    for c in pattern.chars() {
        match c {
            'Y' => format.push_str("%Y"),
            'y' => format.push_str("%y"),
            'm' => format.push_str("%m"),
            'n' => format.push_str("%-m"),
            'd' => format.push_str("%d"),
            'j' => format.push_str("%-d"),
            'H' => format.push_str("%H"),
            'G' => format.push_str("%-H"),
            'i' => format.push_str("%M"),
            's' => format.push_str("%S"),
            '%' => format.push_str("%%"),
            other => format.push(other),
        }
    }
    format
}

/// The integer at the start of `value`, `0` if there is none
fn leading_int(value: &str) -> i64 {
    let value = value.trim();
    let end = value
        .char_indices()
        .take_while(|(index, c)| c.is_ascii_digit() || (*index == 0 && *c == '-'))
        .map(|(index, c)| index + c.len_utf8())
        .last()
        .unwrap_or(0);
    value[..end].parse().unwrap_or(0)
}
