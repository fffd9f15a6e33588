use std::path::Path;

use sceneview_common::{Color, MIN_PICK_SIZE};
use sceneview_render::HIT_BUFFER_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::ViewportError;

/// Viewport configuration. Missing JSON fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Framebuffer clear color.
    pub clear_color: Color,
    /// Selection hit buffer size, in integers.
    pub hit_buffer_capacity: usize,
    /// Smallest pick region side, in pixels. Never below `MIN_PICK_SIZE`.
    pub min_pick_size: f32,
    /// Full-viewport backdrop drawn in the background pass.
    pub background_color: Option<Color>,
    /// Draw translate handles on selected nodes.
    pub manipulators: bool,
    /// Handle length in world units.
    pub manipulator_length: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::rgb(38, 38, 46),
            hit_buffer_capacity: HIT_BUFFER_CAPACITY,
            min_pick_size: MIN_PICK_SIZE,
            background_color: None,
            manipulators: true,
            manipulator_length: 1.0,
        }
    }
}

impl ViewportConfig {
    pub fn from_json(json: &str) -> Result<Self, ViewportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ViewportError> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), "viewport config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ViewportConfig::default();
        assert_eq!(config.hit_buffer_capacity, 4096);
        assert_eq!(config.min_pick_size, 10.0);
        assert!(config.background_color.is_none());
        assert!(config.manipulators);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ViewportConfig::from_json(r#"{ "hit_buffer_capacity": 64, "background_color": [1, 2, 3, 255] }"#).unwrap();
        assert_eq!(config.hit_buffer_capacity, 64);
        assert_eq!(config.background_color, Some(Color([1, 2, 3, 255])));
        assert_eq!(config.clear_color, ViewportConfig::default().clear_color);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewport.json");
        std::fs::write(&path, r#"{ "manipulators": false }"#).unwrap();
        let config = ViewportConfig::load(&path).unwrap();
        assert!(!config.manipulators);
    }

    #[test]
    fn missing_file_and_bad_json_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ViewportConfig::load(&dir.path().join("missing.json")),
            Err(ViewportError::Io(_))
        ));
        assert!(matches!(ViewportConfig::from_json("{"), Err(ViewportError::Config(_))));
    }
}
