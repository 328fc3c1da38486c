//! Reflection, refraction and Fresnel helpers.
//!
//! All functions expect unit-length `v` and `n`.

use crate::Vec3;

/// Mirror `v` about the surface normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Bend `v` through a surface with normal `n` using Snell's law.
///
/// `ratio` is the relative index of refraction (incident over transmitted).
/// `n` must face the incoming side, i.e. `dot(v, n) <= 0`.
/// Returns `None` on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, ratio: f32) -> Option<Vec3> {
    let dt = v.dot(n);
    let discriminant = 1.0 - ratio * ratio * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ratio * (v - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation of Fresnel reflectance.
#[inline]
pub fn schlick(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
