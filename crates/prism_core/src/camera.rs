//! Thin-lens camera parameters.

use prism_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Camera placement and lens settings.
///
/// The renderer derives its image-plane geometry from these once per render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees (top to bottom)
    pub vfov: f32,
    /// Lens diameter; 0 disables depth of field
    pub aperture: f32,
    /// Distance from the lens to the plane of perfect focus
    pub focus_dist: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            look_from: Vec3::new(0.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            vfov: 60.0,
            aperture: 0.1,
            focus_dist: 3.0,
        }
    }
}

impl CameraDesc {
    /// Pinhole camera looking from `look_from` to `look_at`, focused on the target.
    pub fn looking_at(look_from: Vec3, look_at: Vec3, vfov: f32) -> Self {
        Self {
            look_from,
            look_at,
            up: Vec3::Y,
            vfov,
            aperture: 0.0,
            focus_dist: (look_from - look_at).length(),
        }
    }

    /// Reject cameras whose image-plane basis cannot be derived.
    pub fn validate(&self) -> SceneResult<()> {
        let Some(w) = (self.look_from - self.look_at).try_normalize() else {
            return Err(SceneError::InvalidCamera(
                "look_from and look_at must be distinct finite points",
            ));
        };
        if !(self.up.cross(w).length_squared() > 1.0e-8) {
            return Err(SceneError::InvalidCamera(
                "up vector must not be parallel to the view direction",
            ));
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(SceneError::InvalidCamera(
                "vertical field of view must be between 0 and 180 degrees",
            ));
        }
        if !(self.focus_dist > 0.0 && self.focus_dist.is_finite()) {
            return Err(SceneError::InvalidCamera(
                "focus distance must be positive and finite",
            ));
        }
        if !(self.aperture >= 0.0 && self.aperture.is_finite()) {
            return Err(SceneError::InvalidCamera(
                "aperture must be non-negative and finite",
            ));
        }
        Ok(())
    }
}
