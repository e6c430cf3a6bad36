use std::path::PathBuf;

use thiserror::Error;

use crate::editor::EditorError;
use crate::templates::TemplateError;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no template catalog path configured")]
    MissingTemplatesPath,
    #[error("editor has no image to save")]
    NothingToSave,
}
