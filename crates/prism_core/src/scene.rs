//! Scene model: spheres and their materials.
//!
//! A `Scene` is immutable once built and is shared read-only by every
//! in-flight ray, so it is `Sync` by construction.

use prism_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    inv_radius: f32,
}

impl Sphere {
    /// Create a new sphere. The radius must be positive and finite.
    pub fn new(center: Vec3, radius: f32) -> SceneResult<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SceneError::NonPositiveRadius { radius });
        }
        Ok(Self {
            center,
            radius,
            inv_radius: 1.0 / radius,
        })
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Outward unit normal at a point on the surface.
    ///
    /// Uses the cached inverse radius; the result is not re-normalized.
    #[inline]
    pub fn normal_at(&self, p: Vec3) -> Vec3 {
        (p - self.center) * self.inv_radius
    }
}

/// Surface scattering model of a sphere.
///
/// Every variant may emit light; emission is added before scattering is
/// attempted. Scene files tag materials with `"type"`, and a tag this
/// renderer does not know becomes [`Material::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    /// Diffuse reflector.
    Lambertian {
        albedo: Color,
        #[serde(default)]
        emissive: Color,
    },
    /// Specular reflector; `roughness` blurs the reflection (0 = mirror).
    Metal {
        albedo: Color,
        #[serde(default)]
        emissive: Color,
        #[serde(default)]
        roughness: f32,
    },
    /// Non-absorbing refractive material (glass, water).
    Dielectric {
        #[serde(default)]
        emissive: Color,
        ior: f32,
    },
    /// Unrecognized material type. Renders flagged and stops the path.
    #[serde(other)]
    Invalid,
}

impl Material {
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian {
            albedo,
            emissive: Color::ZERO,
        }
    }

    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Material::Metal {
            albedo,
            emissive: Color::ZERO,
            roughness,
        }
    }

    pub fn dielectric(ior: f32) -> Self {
        Material::Dielectric {
            emissive: Color::ZERO,
            ior,
        }
    }

    /// Same material with the given emission.
    pub fn with_emissive(self, color: Color) -> Self {
        match self {
            Material::Lambertian { albedo, .. } => Material::Lambertian {
                albedo,
                emissive: color,
            },
            Material::Metal {
                albedo, roughness, ..
            } => Material::Metal {
                albedo,
                emissive: color,
                roughness,
            },
            Material::Dielectric { ior, .. } => Material::Dielectric {
                emissive: color,
                ior,
            },
            Material::Invalid => Material::Invalid,
        }
    }

    /// Reflectance tint. Dielectrics do not absorb, so they report white.
    pub fn albedo(&self) -> Option<Color> {
        match self {
            Material::Lambertian { albedo, .. } | Material::Metal { albedo, .. } => Some(*albedo),
            Material::Dielectric { .. } => Some(Color::ONE),
            Material::Invalid => None,
        }
    }

    /// Light emitted by the surface.
    pub fn emissive(&self) -> Color {
        match self {
            Material::Lambertian { emissive, .. }
            | Material::Metal { emissive, .. }
            | Material::Dielectric { emissive, .. } => *emissive,
            Material::Invalid => Color::ZERO,
        }
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emissive().length_squared() > 0.0
    }

    fn validate(&self, index: usize) -> SceneResult<()> {
        match *self {
            Material::Metal { roughness, .. } if roughness < 0.0 => {
                Err(SceneError::NegativeRoughness { index, roughness })
            }
            Material::Dielectric { ior, .. } if !(ior > 0.0 && ior.is_finite()) => {
                Err(SceneError::InvalidRefractiveIndex { index, ior })
            }
            _ => Ok(()),
        }
    }
}

/// Immutable list of spheres with a parallel list of materials.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    spheres: Vec<Sphere>,
    materials: Vec<Material>,
}

impl Scene {
    /// Build a scene. `materials[i]` belongs to `spheres[i]`.
    pub fn new(spheres: Vec<Sphere>, materials: Vec<Material>) -> SceneResult<Self> {
        if spheres.len() != materials.len() {
            return Err(SceneError::MaterialCountMismatch {
                spheres: spheres.len(),
                materials: materials.len(),
            });
        }
        for (index, material) in materials.iter().enumerate() {
            material.validate(index)?;
        }

        let invalid = materials
            .iter()
            .filter(|m| matches!(m, Material::Invalid))
            .count();
        if invalid > 0 {
            log::warn!("Scene has {} spheres with an unrecognized material", invalid);
        }
        log::debug!(
            "Scene built: {} spheres, {} emissive",
            spheres.len(),
            materials.iter().filter(|m| m.is_emissive()).count()
        );

        Ok(Self { spheres, materials })
    }

    /// Spheres in index order.
    #[inline]
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Material of sphere `id`.
    #[inline]
    pub fn material(&self, id: usize) -> &Material {
        &self.materials[id]
    }

    /// Get the number of spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}
