use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::geometry::Color;
use crate::i18n::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "avatar-studio";
const APP_CONFIG_FILE: &str = "config.json";
const DEFAULT_TEMPLATES_FILE: &str = "template.json";
const DEFAULT_PIXEL_RATIO: f64 = 1.0;

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub pixel_ratio: Option<f64>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub templates_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn pixel_ratio(&self) -> f64 {
        match self.pixel_ratio {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
            Some(ratio) => {
                tracing::warn!(ratio, "ignoring invalid pixel_ratio; using 1.0");
                DEFAULT_PIXEL_RATIO
            }
            None => DEFAULT_PIXEL_RATIO,
        }
    }

    pub fn background(&self) -> Color {
        let Some(raw) = self.background_color.as_deref() else {
            return Color::WHITE;
        };
        Color::from_hex(raw).unwrap_or_else(|| {
            tracing::warn!(value = raw, "ignoring invalid background_color; using white");
            Color::WHITE
        })
    }

    /// Explicit `templates_path`, or `template.json` next to `config.json`.
    pub fn templates_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.templates_path {
            return Some(path.clone());
        }
        let (xdg_config_home, home) = config_env_dirs();
        app_config_path(
            APP_DIR,
            DEFAULT_TEMPLATES_FILE,
            xdg_config_home.as_deref(),
            home.as_deref(),
        )
        .ok()
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
