use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{translate, Language, MessageKey};

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read templates: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse templates")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub zh: String,
    pub en: String,
}

impl LocalizedText {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.zh,
            Language::En => &self.en,
        }
    }

    fn matches(&self, label: &str) -> bool {
        self.zh == label || self.en == label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: LocalizedText,
    pub prompt: LocalizedText,
}

/// Read-only list of prompt templates, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn from_json(serialized: &str) -> TemplateResult<Self> {
        Ok(serde_json::from_str(serialized)?)
    }

    pub fn load(path: &Path) -> TemplateResult<Self> {
        let serialized = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&serialized)
    }

    /// Falls back to an empty catalog and a localized warning when loading fails.
    pub fn load_or_empty(path: &Path, language: Language) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(catalog) => {
                tracing::debug!(path = %path.display(), count = catalog.len(), "loaded templates");
                (catalog, None)
            }
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "failed to load templates; continuing without them");
                (
                    Self::default(),
                    Some(translate(language, MessageKey::ErrorLoadTemplates, &[])),
                )
            }
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Finds a template by its label in either locale.
    pub fn find(&self, label: &str) -> Option<&Template> {
        self.templates
            .iter()
            .find(|template| template.name.matches(label))
    }

    pub fn labels(&self, language: Language) -> impl Iterator<Item = &str> {
        self.templates
            .iter()
            .map(move |template| template.name.get(language))
    }
}
