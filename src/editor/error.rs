use thiserror::Error;

use crate::artifact::DecodingError;
use crate::crop::{CropSessionError, TransformError};
use crate::generation::GenerationFailure;
use crate::i18n::{translate, Language, MessageKey};

pub type EditorResult<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no image loaded for editing")]
    NoImage,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("a generation request is already running")]
    Busy,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Session(#[from] CropSessionError),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationFailure),
    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

impl EditorError {
    /// The text shown in the error slot.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            Self::Validation(ValidationError::NoImage) => {
                translate(language, MessageKey::ErrorNoImage, &[])
            }
            Self::Validation(ValidationError::EmptyPrompt) => {
                translate(language, MessageKey::ErrorNoPrompt, &[])
            }
            Self::Validation(ValidationError::Busy) => {
                translate(language, MessageKey::ErrorBusy, &[])
            }
            Self::Transform(err) => translate(
                language,
                MessageKey::ErrorCropFailed,
                &[("message", err.to_string().as_str())],
            ),
            Self::Session(err) => translate(
                language,
                MessageKey::ErrorCropFailed,
                &[("message", err.to_string().as_str())],
            ),
            Self::Generation(failure) => translate(
                language,
                MessageKey::ErrorGenerationFailed,
                &[("message", failure.localized(language).as_str())],
            ),
            Self::Decoding(err) => translate(
                language,
                MessageKey::ErrorDecodeFailed,
                &[("message", err.to_string().as_str())],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_localizes_validation_errors() {
        let err = EditorError::from(ValidationError::EmptyPrompt);
        assert_eq!(err.user_message(Language::Zh), "请输入描述以生成头像。");
        assert_eq!(
            err.user_message(Language::En),
            "Please enter a description to generate the avatar."
        );
    }

    #[test]
    fn user_message_wraps_collaborator_text() {
        let err = EditorError::from(GenerationFailure::Transport("quota exceeded".to_string()));
        assert_eq!(
            err.user_message(Language::En),
            "Failed to generate avatar: quota exceeded"
        );
    }

    #[test]
    fn user_message_wraps_transform_errors() {
        let err = EditorError::from(TransformError::NoActiveCrop);
        assert_eq!(
            err.user_message(Language::En),
            "Cropping failed: no active crop to apply"
        );
    }
}
