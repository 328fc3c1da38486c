//! Thin-lens camera for primary ray generation.

use prism_core::CameraDesc;
use prism_math::{Ray, Vec3};
use rand::RngCore;

use crate::rng::random_in_unit_disk;

/// Camera with image-plane geometry derived from a [`CameraDesc`].
///
/// Immutable after construction; shared read-only across workers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    origin: Vec3,
    lower_left_corner: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f32,
}

impl Camera {
    /// Derive the camera for an image of the given aspect ratio (width / height).
    pub fn new(desc: &CameraDesc, aspect: f32) -> Self {
        let lens_radius = desc.aperture / 2.0;
        let theta = desc.vfov.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = aspect * half_height;
        let focus = desc.focus_dist;

        let origin = desc.look_from;
        let w = (desc.look_from - desc.look_at).normalize();
        let u = desc.up.cross(w).normalize();
        let v = w.cross(u);

        let lower_left_corner =
            origin - half_width * focus * u - half_height * focus * v - focus * w;
        let horizontal = 2.0 * half_width * focus * u;
        let vertical = 2.0 * half_height * focus * v;

        Self {
            origin,
            lower_left_corner,
            horizontal,
            vertical,
            u,
            v,
            w,
            lens_radius,
        }
    }

    /// Ray through normalized image coordinates `s`, `t` in [0, 1].
    ///
    /// `(0, 0)` is the lower-left corner of the image plane. The origin is
    /// jittered across the lens; the direction is unit length.
    pub fn get_ray<R: RngCore + ?Sized>(&self, s: f32, t: f32, rng: &mut R) -> Ray {
        let rd = self.lens_radius * random_in_unit_disk(rng);
        let offset = self.u * rd.x + self.v * rd.y;
        let target = self.lower_left_corner + s * self.horizontal + t * self.vertical;
        Ray::new(
            self.origin + offset,
            (target - self.origin - offset).normalize(),
        )
    }

    /// Camera basis (u, v, w); `-w` is the viewing direction.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }
}
