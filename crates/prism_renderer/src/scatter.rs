//! Per-material light scattering.

use prism_core::Material;
use prism_math::{reflect, refract, schlick, Color, Ray};
use rand::RngCore;

use crate::intersect::Hit;
use crate::rng::{gen_f32, random_in_unit_sphere, random_unit_vector};

/// Diagnostic color for paths that hit an unrecognized material.
pub const INVALID_MATERIAL_COLOR: Color = Color::new(1.0, 0.0, 1.0);

/// Outcome of scattering an incoming ray off a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scatter {
    /// The path continues along `ray`, its throughput scaled by `attenuation`.
    Bounce { attenuation: Color, ray: Ray },
    /// The surface swallowed the ray.
    Absorbed,
    /// The material is not one this renderer knows; the path stops and is
    /// flagged with `attenuation`.
    Invalid { attenuation: Color },
}

impl Scatter {
    /// Returns true if the path continues.
    pub fn is_bounce(&self) -> bool {
        matches!(self, Scatter::Bounce { .. })
    }
}

/// Scatter `ray_in` off the surface described by `hit`.
///
/// Emission is not handled here; the integrator adds it before calling.
pub fn scatter<R: RngCore + ?Sized>(
    material: &Material,
    ray_in: &Ray,
    hit: &Hit,
    rng: &mut R,
) -> Scatter {
    match *material {
        Material::Lambertian { albedo, .. } => {
            // A sample opposite the normal cancels it; scatter along the normal
            let direction = (hit.normal + random_unit_vector(rng))
                .try_normalize()
                .unwrap_or(hit.normal);
            Scatter::Bounce {
                attenuation: albedo,
                ray: Ray::new(hit.pos, direction),
            }
        }
        Material::Metal {
            albedo, roughness, ..
        } => {
            let reflected = reflect(ray_in.direction, hit.normal);
            let direction = (reflected + roughness * random_in_unit_sphere(rng))
                .try_normalize()
                .unwrap_or(reflected);
            // Rough reflections that dip below the surface are self-shadowed
            if direction.dot(hit.normal) > 0.0 {
                Scatter::Bounce {
                    attenuation: albedo,
                    ray: Ray::new(hit.pos, direction),
                }
            } else {
                Scatter::Absorbed
            }
        }
        Material::Dielectric { ior, .. } => {
            let direction = ray_in.direction;
            let d_dot_n = direction.dot(hit.normal);
            let (outward_normal, ratio, cosine) = if d_dot_n > 0.0 {
                // Leaving the sphere
                (-hit.normal, ior, ior * d_dot_n)
            } else {
                (hit.normal, 1.0 / ior, -d_dot_n)
            };

            let refracted = refract(direction, outward_normal, ratio);
            let reflect_prob = match refracted {
                Some(_) => schlick(cosine, ior),
                None => 1.0,
            };

            let draw = gen_f32(rng);
            let out = match refracted {
                Some(r) if draw >= reflect_prob => r,
                _ => reflect(direction, hit.normal),
            };
            Scatter::Bounce {
                attenuation: Color::ONE,
                ray: Ray::new(hit.pos, out.normalize()),
            }
        }
        Material::Invalid => Scatter::Invalid {
            attenuation: INVALID_MATERIAL_COLOR,
        },
    }
}
