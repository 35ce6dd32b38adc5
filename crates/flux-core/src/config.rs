//! Runtime configuration for the interaction layer and local storage.

use crate::error::{FluxError, FluxResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pointer travel (per axis, in pixels) that turns a press into a drag.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 5.0;
/// Grid pitch used when build mode snaps widget positions.
pub const DEFAULT_GRID_PITCH: f64 = 20.0;
/// Smallest size a widget can be resized to.
pub const DEFAULT_MIN_WIDGET_SIZE: Size = Size::new(120.0, 80.0);

/// Interaction and storage settings.
///
/// Every field has a default, so a partial JSON file is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxConfig {
    pub drag_threshold: f64,
    pub grid_pitch: f64,
    /// Snap widget positions and sizes to `grid_pitch`.
    pub build_mode: bool,
    /// Coalesce pointer moves to animation-frame boundaries.
    pub frame_batching: bool,
    pub min_widget_size: Size,
    /// Directory for the native file backend. `None` uses the platform data dir.
    pub storage_dir: Option<PathBuf>,
}

impl Default for FluxConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            grid_pitch: DEFAULT_GRID_PITCH,
            build_mode: false,
            frame_batching: false,
            min_widget_size: DEFAULT_MIN_WIDGET_SIZE,
            storage_dir: None,
        }
    }
}

impl FluxConfig {
    /// Parse configuration from JSON and validate it.
    pub fn from_json(json: &str) -> FluxResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> FluxResult<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|e| {
            FluxError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Reject values the geometry code cannot work with.
    pub fn validate(&self) -> FluxResult<()> {
        if !(self.drag_threshold >= 0.0) {
            return Err(FluxError::Config(format!(
                "drag_threshold must be non-negative, got {}",
                self.drag_threshold
            )));
        }
        if !(self.grid_pitch > 0.0) {
            return Err(FluxError::Config(format!(
                "grid_pitch must be positive, got {}",
                self.grid_pitch
            )));
        }
        if self.min_widget_size.width <= 0.0 || self.min_widget_size.height <= 0.0 {
            return Err(FluxError::Config("min_widget_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Directory used by the native file backend.
    ///
    /// On Unix: `~/.local/share/flux/`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn storage_path(&self) -> FluxResult<PathBuf> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| FluxError::Config("Could not determine home directory".to_string()))?;
        Ok(base.join("flux"))
    }
}
