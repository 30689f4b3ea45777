//! Editor configuration.

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::layers::{
    LayerLimits, MAX_DIMENSION, MAX_FONT_SIZE, MAX_POSITION, MIN_DIMENSION, MIN_FONT_SIZE,
};
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;
use crate::viewport::{MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT, Viewport, ZOOM_STEP_PERCENT};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Tunables of the template editor. Every field has a default, so a config
/// file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub autosave_interval_secs: u64,
    pub history_depth: usize,
    pub min_zoom_percent: u32,
    pub max_zoom_percent: u32,
    pub zoom_step_percent: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub max_position: f64,
    pub min_dimension: f64,
    pub max_dimension: f64,
    pub min_font_size: f64,
    pub max_font_size: f64,
    pub export_scale: f64,
    pub notice_ttl_ms: u64,
    pub leave_delay_ms: u64,
    pub escape_cancels_gesture: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            history_depth: DEFAULT_HISTORY_DEPTH,
            min_zoom_percent: MIN_ZOOM_PERCENT,
            max_zoom_percent: MAX_ZOOM_PERCENT,
            zoom_step_percent: ZOOM_STEP_PERCENT,
            canvas_width: 820.0,
            canvas_height: 820.0,
            max_position: MAX_POSITION,
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,
            min_font_size: MIN_FONT_SIZE,
            max_font_size: MAX_FONT_SIZE,
            export_scale: 2.0,
            notice_ttl_ms: 3000,
            leave_delay_ms: 900,
            escape_cancels_gesture: false,
        }
    }
}

impl EditorConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `<config dir>/postkit/editor.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("postkit").join("editor.json"))
    }

    /// Load from the default path, falling back to defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn leave_delay(&self) -> Duration {
        Duration::from_millis(self.leave_delay_ms)
    }

    /// Unscaled canvas size in canvas units.
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    /// Position, size and font-size ranges for the canvas.
    pub fn layer_limits(&self) -> LayerLimits {
        LayerLimits {
            max_position: self.max_position,
            min_dimension: self.min_dimension,
            max_dimension: self.max_dimension,
            min_font_size: self.min_font_size,
            max_font_size: self.max_font_size,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::with_limits(
            self.min_zoom_percent,
            self.max_zoom_percent,
            self.zoom_step_percent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.autosave_interval(), Duration::from_secs(5));
        assert_eq!(config.history_depth, 60);
        assert_eq!(config.canvas_size(), Size::new(820.0, 820.0));
        assert!(!config.escape_cancels_gesture);
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{ "history_depth": 10, "escape_cancels_gesture": true }"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.history_depth, 10);
        assert!(config.escape_cancels_gesture);
        assert_eq!(config.export_scale, 2.0);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(EditorConfig::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(EditorConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_viewport_from_config() {
        let config = EditorConfig {
            min_zoom_percent: 50,
            max_zoom_percent: 150,
            ..Default::default()
        };
        let mut viewport = config.viewport();
        viewport.set_zoom(500);
        assert_eq!(viewport.zoom_percent, 150);
    }

    #[test]
    fn test_layer_limits_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{ "max_dimension": 3000, "max_font_size": 100 }"#).unwrap();

        let limits = EditorConfig::load(&path).unwrap().layer_limits();
        assert_eq!(limits.max_dimension, 3000.0);
        assert_eq!(limits.max_font_size, 100.0);
        assert_eq!(limits.min_dimension, MIN_DIMENSION);
        assert_eq!(limits.font_size(90.0), 90.0);
    }
}
