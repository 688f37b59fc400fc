//! Camera-pixel to world coordinate transform.
//!
//! World space is camera space rotated by `-offset_angle`, scaled by
//! `1 / resolution` and translated by the world offset.

use glam::DVec2;

use crate::{CalibrationError, CameraConfig};

/// Immutable calibration of one camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    width: u32,
    height: u32,
    /// Pixels per world unit.
    resolution: f64,
    offset: DVec2,
    offset_angle: f64,
    sin_a: f64,
    cos_a: f64,
}

impl Calibration {
    pub fn new(
        width: u32,
        height: u32,
        world_height: f64,
        offset: DVec2,
        offset_angle: f64,
    ) -> Result<Self, CalibrationError> {
        if width == 0 || height == 0 {
            return Err(CalibrationError::EmptyFrame { width, height });
        }
        if !(world_height.is_finite() && world_height > 0.0) {
            return Err(CalibrationError::WorldHeight(world_height));
        }
        if !(offset.is_finite() && offset_angle.is_finite()) {
            return Err(CalibrationError::Offset {
                x: offset.x,
                y: offset.y,
                angle: offset_angle,
            });
        }
        let (sin_a, cos_a) = offset_angle.sin_cos();
        Ok(Calibration {
            width,
            height,
            resolution: height as f64 / world_height,
            offset,
            offset_angle,
            sin_a,
            cos_a,
        })
    }

    pub fn from_config(config: &CameraConfig) -> Result<Self, CalibrationError> {
        Self::new(
            config.width,
            config.height,
            config.world_height,
            DVec2::new(config.offset_x, config.offset_y),
            config.offset_angle,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    pub fn offset_angle(&self) -> f64 {
        self.offset_angle
    }

    /// Maps a camera pixel position to world coordinates.
    pub fn to_world(&self, pixel: DVec2) -> DVec2 {
        let rotated = DVec2::new(
            pixel.x * self.cos_a + pixel.y * self.sin_a,
            -pixel.x * self.sin_a + pixel.y * self.cos_a,
        );
        rotated / self.resolution + self.offset
    }

    /// Inverse of [`Calibration::to_world`].
    pub fn to_camera(&self, world: DVec2) -> DVec2 {
        let scaled = (world - self.offset) * self.resolution;
        DVec2::new(
            scaled.x * self.cos_a - scaled.y * self.sin_a,
            scaled.x * self.sin_a + scaled.y * self.cos_a,
        )
    }

    pub fn heading_to_world(&self, heading: f64) -> f64 {
        heading - self.offset_angle
    }

    pub fn heading_to_camera(&self, heading: f64) -> f64 {
        heading + self.offset_angle
    }
}
