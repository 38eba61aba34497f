//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const MAX_RECENT_EXPORTS: usize = 10;

pub const MIN_PREVIEW_SCALE: f32 = 0.5;
pub const MAX_PREVIEW_SCALE: f32 = 2.0;
pub const PREVIEW_SCALE_STEP: f32 = 0.1;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Project store directory (platform data dir when unset)
    pub data_dir: Option<PathBuf>,
    /// Directory of the last export, offered by the next save dialog
    pub last_export_dir: Option<PathBuf>,
    /// Recently exported files, most recent first
    pub recent_exports: Vec<PathBuf>,
    /// Editor settings
    pub editor: EditorConfig,
    /// UI settings
    pub ui: UiConfig,
}

/// Editor-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Ask before deleting a project
    pub confirm_deletes: bool,
    /// Show width/height controls on media fields
    pub show_size_controls: bool,
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Theme (light/dark)
    pub theme: String,
    /// Sidebar width
    pub sidebar_width: f32,
    /// Preview zoom factor
    pub preview_scale: f32,
    /// Seconds a notification stays on screen
    pub notification_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            confirm_deletes: true,
            show_size_controls: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            sidebar_width: 320.0,
            preview_scale: 1.0,
            notification_secs: 5,
        }
    }
}

impl UiConfig {
    /// Step the preview zoom by `steps` increments, staying within bounds
    pub fn zoom_preview(&mut self, steps: i32) {
        let scaled = self.preview_scale + steps as f32 * PREVIEW_SCALE_STEP;
        // Round to one decimal so repeated steps don't drift.
        let rounded = (scaled * 10.0).round() / 10.0;
        self.preview_scale = rounded.clamp(MIN_PREVIEW_SCALE, MAX_PREVIEW_SCALE);
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "tempo", "TempoDocs")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Directory holding one JSON record per project
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("projects"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    /// Record a finished export
    pub fn add_recent_export(&mut self, path: PathBuf) {
        self.last_export_dir = path.parent().map(Path::to_path_buf);
        // Remove if already exists
        self.recent_exports.retain(|p| p != &path);
        // Add to front
        self.recent_exports.insert(0, path);
        self.recent_exports.truncate(MAX_RECENT_EXPORTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.editor.confirm_deletes);
        assert_eq!(config.ui.preview_scale, 1.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.data_dir = Some(dir.path().join("store"));
        config.ui.theme = "dark".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.ui.theme, "dark");
        assert_eq!(loaded.store_dir().unwrap(), dir.path().join("store"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ui":{"theme":"dark"}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.ui.theme, "dark");
        assert_eq!(config.ui.notification_secs, 5);
        assert!(config.editor.show_size_controls);
    }

    #[test]
    fn test_recent_exports() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_export(PathBuf::from(format!("/tmp/out/{i}.html")));
        }
        config.add_recent_export(PathBuf::from("/tmp/out/5.html"));

        assert_eq!(config.recent_exports.len(), MAX_RECENT_EXPORTS);
        assert_eq!(config.recent_exports[0], PathBuf::from("/tmp/out/5.html"));
        assert_eq!(config.last_export_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_preview_zoom_is_clamped() {
        let mut ui = UiConfig::default();
        ui.zoom_preview(3);
        assert!((ui.preview_scale - 1.3).abs() < f32::EPSILON);
        ui.zoom_preview(50);
        assert_eq!(ui.preview_scale, MAX_PREVIEW_SCALE);
        ui.zoom_preview(-50);
        assert_eq!(ui.preview_scale, MIN_PREVIEW_SCALE);
    }
}
