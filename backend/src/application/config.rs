/// Configuration loaded from a JSON file
use crate::domain::blueprint::Blueprints;
use crate::domain::entities::{Language, Languages};
use crate::domain::value_objects::LanguageCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    Invalid(#[from] crate::domain::base::DomainError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which repository holds the page tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    #[default]
    Memory,
    FileSystem {
        root: PathBuf,
    },
    Sqlite {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmsConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
    #[serde(default)]
    pub blueprints: Blueprints,
    /// Debounce interval of the content watcher in milliseconds
    #[serde(default)]
    pub watch: Option<u64>,
}

impl CmsConfig {
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        tracing::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: CmsConfig = serde_json::from_str(text)?;
        config.languages()?;
        Ok(config)
    }

    /// The configured languages, validated
    pub fn languages(&self) -> ConfigResult<Languages> {
        let items = self
            .languages
            .iter()
            .map(|lang| -> ConfigResult<Language> {
                let code = LanguageCode::new(lang.code.as_str())?;
                let name = lang.name.clone().unwrap_or_else(|| code.to_string());
                Ok(Language::new(code, name, lang.default))
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Languages::new(items)?)
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch.unwrap_or(500))
    }
}
