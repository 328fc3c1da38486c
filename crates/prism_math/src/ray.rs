use crate::Vec3;

/// A ray in 3D space with an origin and a unit-length direction.
///
/// Producers (camera, scatter functions) are responsible for normalizing
/// `direction`; intersection and the optics helpers assume it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        debug_assert!(
            (direction.length_squared() - 1.0).abs() < 0.01,
            "ray direction must be unit length, got {direction:?}"
        );
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}
