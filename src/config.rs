//! Configuration module for Quill

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::ComposerMode;
use crate::paths;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Composer behaviour
    #[serde(default)]
    pub composer: ComposerConfig,

    /// Autocomplete suggestions
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// Media attachments and blur previews
    #[serde(default)]
    pub media: MediaConfig,
}

/// Composer behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Mode a fresh composer starts in (must be menu-selectable)
    #[serde(default)]
    pub default_mode: ComposerMode,

    /// Whether "also post to home" starts switched on
    #[serde(default = "default_post_home")]
    pub post_home_by_default: bool,

    /// How long the suggestion list stays open after the input loses focus
    #[serde(default = "default_overlay_grace_ms")]
    pub overlay_grace_ms: u64,
}

/// Suggestion engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Maximum number of ranked candidates returned per query
    #[serde(default = "default_suggestion_limit")]
    pub limit: usize,

    /// Minimum normalized similarity (0.0 - 1.0) for a fuzzy emoji match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

/// Media settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Longer side of the downsampled image used for blur previews
    #[serde(default = "default_preview_max_dimension")]
    pub preview_max_dimension: u32,

    /// Horizontal blur preview components
    #[serde(default = "default_blur_components_x")]
    pub blur_components_x: u32,

    /// Vertical blur preview components
    #[serde(default = "default_blur_components_y")]
    pub blur_components_y: u32,

    /// Upload endpoint for the HTTP media store (None = uploads disabled)
    #[serde(default)]
    pub upload_endpoint: Option<String>,
}

fn default_post_home() -> bool {
    true
}

fn default_overlay_grace_ms() -> u64 {
    100
}

fn default_suggestion_limit() -> usize {
    8
}

fn default_fuzzy_threshold() -> f64 {
    0.6
}

fn default_preview_max_dimension() -> u32 {
    64
}

fn default_blur_components_x() -> u32 {
    4
}

fn default_blur_components_y() -> u32 {
    3
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_mode: ComposerMode::default(),
            post_home_by_default: default_post_home(),
            overlay_grace_ms: default_overlay_grace_ms(),
        }
    }
}

impl ComposerConfig {
    /// The blur grace period as a duration
    pub const fn overlay_grace(&self) -> Duration {
        Duration::from_millis(self.overlay_grace_ms)
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            limit: default_suggestion_limit(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            preview_max_dimension: default_preview_max_dimension(),
            blur_components_x: default_blur_components_x(),
            blur_components_y: default_blur_components_y(),
            upload_endpoint: None,
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.composer.overlay_grace(), Duration::from_millis(100));
        assert_eq!(config.media.preview_max_dimension, 64);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[composer]\ndefault_mode = \"markdown\"\n\n[suggestions]\nlimit = 3\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.composer.default_mode, ComposerMode::Markdown);
        assert!(config.composer.post_home_by_default);
        assert_eq!(config.suggestions.limit, 3);
        assert!((config.suggestions.fuzzy_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.media.blur_components_x, 4);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.media.upload_endpoint = Some("https://media.example/upload".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
