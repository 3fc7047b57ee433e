//! Lexer configuration persistence
//!
//! Stores settings in `~/.config/rstlex/config.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::syntax::{DEFAULT_DIRECTIVES, DEFAULT_WIDEN_MARGIN};

/// Lexer configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerConfig {
    /// Language segment of theme keys (`style.<language>.<id>`)
    #[serde(default = "default_language")]
    pub language: String,

    /// Directive names highlighted after `.. `
    #[serde(default = "default_directives")]
    pub directives: Vec<String>,

    /// Cached spans stepped over on each side of an edit before widening
    /// stops at a structural boundary
    #[serde(default = "default_widen_margin")]
    pub widen_margin: usize,

    /// YAML property file overriding the built-in styles. Relative paths
    /// are resolved against the themes directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<PathBuf>,
}

fn default_language() -> String {
    "rst".to_string()
}

fn default_directives() -> Vec<String> {
    DEFAULT_DIRECTIVES.iter().map(|d| d.to_string()).collect()
}

fn default_widen_margin() -> usize {
    DEFAULT_WIDEN_MARGIN
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            directives: default_directives(),
            widen_margin: default_widen_margin(),
            theme: None,
        }
    }
}

impl LexerConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolved theme file path, if one is configured
    pub fn theme_path(&self) -> Option<PathBuf> {
        let theme = self.theme.as_ref()?;
        if theme.is_absolute() {
            return Some(theme.clone());
        }
        match crate::config_paths::themes_dir() {
            Some(dir) => Some(dir.join(theme)),
            None => Some(theme.clone()),
        }
    }
}
