use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Self::Zh, Self::En];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Zh => Self::En,
            Self::En => Self::Zh,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    ErrorNoImage,
    ErrorNoPrompt,
    ErrorBusy,
    ErrorLoadTemplates,
    ErrorGenerationFailed,
    ErrorCropFailed,
    ErrorDecodeFailed,
    GenerationBlocked,
    GenerationStopped,
    GenerationNoImageText,
    GenerationNoImageGeneric,
}

impl MessageKey {
    pub const fn key(self) -> &'static str {
        match self {
            Self::ErrorNoImage => "app.error.noImage",
            Self::ErrorNoPrompt => "app.error.noPrompt",
            Self::ErrorBusy => "app.error.busy",
            Self::ErrorLoadTemplates => "app.error.loadTemplates",
            Self::ErrorGenerationFailed => "app.error.generationFailed",
            Self::ErrorCropFailed => "app.error.cropFailed",
            Self::ErrorDecodeFailed => "app.error.decodeFailed",
            Self::GenerationBlocked => "generation.error.requestBlocked",
            Self::GenerationStopped => "generation.error.generationStopped",
            Self::GenerationNoImageText => "generation.error.noImageReturnedText",
            Self::GenerationNoImageGeneric => "generation.error.noImageReturnedGeneric",
        }
    }

    pub const fn text(self, language: Language) -> &'static str {
        match language {
            Language::En => self.english(),
            Language::Zh => self.chinese(),
        }
    }

    const fn english(self) -> &'static str {
        match self {
            Self::ErrorNoImage => "No image loaded for editing.",
            Self::ErrorNoPrompt => "Please enter a description to generate the avatar.",
            Self::ErrorBusy => "The AI is still working on the previous request.",
            Self::ErrorLoadTemplates => "Failed to load templates.",
            Self::ErrorGenerationFailed => "Failed to generate avatar: {{message}}",
            Self::ErrorCropFailed => "Cropping failed: {{message}}",
            Self::ErrorDecodeFailed => "Could not read the image: {{message}}",
            Self::GenerationBlocked => "Request was blocked. Reason: {{reason}}. {{message}}",
            Self::GenerationStopped => {
                "Image generation stopped unexpectedly. Reason: {{reason}}. This often relates to safety settings."
            }
            Self::GenerationNoImageText => {
                "The AI model did not return an image. The model responded with text: \"{{text}}\""
            }
            Self::GenerationNoImageGeneric => {
                "The AI model did not return an image. This can happen due to safety filters or if the request is too complex. Please try rephrasing your prompt to be more direct."
            }
        }
    }

    const fn chinese(self) -> &'static str {
        match self {
            Self::ErrorNoImage => "没有加载图片进行编辑。",
            Self::ErrorNoPrompt => "请输入描述以生成头像。",
            Self::ErrorBusy => "AI 仍在处理上一个请求。",
            Self::ErrorLoadTemplates => "加载模板失败。",
            Self::ErrorGenerationFailed => "生成头像失败：{{message}}",
            Self::ErrorCropFailed => "裁剪失败：{{message}}",
            Self::ErrorDecodeFailed => "无法读取图片：{{message}}",
            Self::GenerationBlocked => "请求被阻止。原因: {{reason}}。{{message}}",
            Self::GenerationStopped => "图像生成意外停止。原因: {{reason}}。这通常与安全设置有关。",
            Self::GenerationNoImageText => "AI模型没有返回图像。模型以文本回应: \"{{text}}\"",
            Self::GenerationNoImageGeneric => {
                "AI模型没有返回图像。这可能是由于安全过滤器或请求过于复杂。请尝试更直接地改写您的提示。"
            }
        }
    }
}

pub fn translate(language: Language, key: MessageKey, params: &[(&str, &str)]) -> String {
    interpolate(key.text(language), params)
}

/// Replaces every `{{name}}` occurrence with its value. Nothing is escaped; callers
/// rendering into markup escape the result themselves.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{{{name}}}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_language_is_chinese_and_toggles() {
        assert_eq!(Language::default(), Language::Zh);
        assert_eq!(Language::Zh.toggled(), Language::En);
        assert_eq!(Language::En.toggled(), Language::Zh);
    }

    #[test]
    fn from_code_is_case_insensitive() {
        assert_eq!(Language::from_code("EN"), Some(Language::En));
        assert_eq!(Language::from_code(" zh "), Some(Language::Zh));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn interpolate_replaces_every_occurrence() {
        let text = interpolate("{{a}} and {{a}} but {{b}}", &[("a", "x"), ("b", "y")]);
        assert_eq!(text, "x and x but y");
    }

    #[test]
    fn interpolate_leaves_unknown_tokens_and_markup_untouched() {
        let text = interpolate("{{message}} {{other}}", &[("message", "<b>raw</b>")]);
        assert_eq!(text, "<b>raw</b> {{other}}");
    }

    #[test]
    fn translate_uses_locale_table() {
        assert_eq!(
            translate(Language::En, MessageKey::ErrorCropFailed, &[("message", "boom")]),
            "Cropping failed: boom"
        );
        assert_eq!(
            translate(Language::Zh, MessageKey::ErrorGenerationFailed, &[("message", "x")]),
            "生成头像失败：x"
        );
    }

    #[test]
    fn every_key_has_both_locales() {
        let keys = [
            MessageKey::ErrorNoImage,
            MessageKey::ErrorNoPrompt,
            MessageKey::ErrorBusy,
            MessageKey::ErrorLoadTemplates,
            MessageKey::ErrorGenerationFailed,
            MessageKey::ErrorCropFailed,
            MessageKey::ErrorDecodeFailed,
            MessageKey::GenerationBlocked,
            MessageKey::GenerationStopped,
            MessageKey::GenerationNoImageText,
            MessageKey::GenerationNoImageGeneric,
        ];
        for key in keys {
            for language in Language::ALL {
                assert!(!key.text(language).is_empty(), "{} missing", key.key());
            }
            assert_ne!(key.text(Language::En), key.text(Language::Zh));
        }
    }
}
