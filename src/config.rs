use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Construction parameters of one camera.
///
/// `world_height` is the extent of the frame's vertical axis in world
/// units, `offset_angle` is in radians.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub id: i32,
    pub width: u32,
    pub height: u32,
    pub world_height: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default)]
    pub offset_angle: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            id: 0,
            width: 640,
            height: 480,
            world_height: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            offset_angle: 0.0,
        }
    }
}

impl CameraConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading camera config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("parsing {}", path.display()))
    }
}
