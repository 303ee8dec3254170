/// Codec for `.txt` content files.
///
/// Fields are written as `Key: value` blocks separated by a line of four dashes.
/// Multi-line values start on a fresh line after the key. A value line that itself
/// begins with `----` is escaped as `\----`.
use crate::domain::content::Fields;
use regex::Regex;
use std::sync::LazyLock;

static DIVIDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n----\s*\n*").unwrap());
static ESCAPED_DIVIDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\\----").unwrap());
static LINE_DIVIDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^----").unwrap());

const SEPARATOR: &str = "\n\n----\n\n";

pub struct TxtCodec;

impl TxtCodec {
    /// Parse file contents into fields; blocks without a key are skipped
    pub fn decode(input: &str) -> Fields {
        let normalized = input
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        let mut fields = Fields::new();
        for block in DIVIDER.split(&normalized) {
            let Some((key, value)) = block.split_once(':') else {
                continue;
            };

            let key = key.trim().to_lowercase().replace(['-', ' '], "_");
            if key.is_empty() {
                continue;
            }

            let value = ESCAPED_DIVIDER.replace_all(value.trim(), "----");
            fields.insert(key, value.into_owned());
        }
        fields
    }

    pub fn encode(fields: &Fields) -> String {
        let blocks: Vec<String> = fields
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, value)| {
                let key = Self::encode_key(key);
                let value = LINE_DIVIDER.replace_all(value.trim(), r"\----");
                if value.contains('\n') {
                    format!("{}:\n\n{}", key, value)
                } else {
                    format!("{}: {}", key, value)
                }
            })
            .collect();

        let mut output = blocks.join(SEPARATOR);
        output.push('\n');
        output
    }

    fn encode_key(key: &str) -> String {
        let key = key.trim().replace(['-', ' '], "_");
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
