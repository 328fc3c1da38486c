//! JSON scene descriptions.
//!
//! A scene file holds a camera, a sphere list, and a parallel material list:
//!
//! ```json
//! {
//!   "camera": { "look_from": [0, 2, 3], "look_at": [0, 0, 0], "vfov": 60 },
//!   "spheres": [ { "center": [0, -100.5, -1], "radius": 100 } ],
//!   "materials": [ { "type": "lambertian", "albedo": [0.8, 0.8, 0.8] } ]
//! }
//! ```

use std::path::Path;

use prism_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraDesc;
use crate::error::SceneResult;
use crate::scene::{Material, Scene, Sphere};

/// Sphere entry of a scene file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereDesc {
    pub center: Vec3,
    pub radius: f32,
}

/// Unvalidated scene as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub camera: CameraDesc,
    pub spheres: Vec<SphereDesc>,
    pub materials: Vec<Material>,
}

impl SceneDesc {
    /// Parse a scene description from JSON text.
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scene description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let desc = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} spheres from {}",
            desc.spheres.len(),
            path.display()
        );
        Ok(desc)
    }

    /// Validate into an immutable scene plus its camera.
    pub fn build(&self) -> SceneResult<(Scene, CameraDesc)> {
        self.camera.validate()?;
        let spheres = self
            .spheres
            .iter()
            .map(|s| Sphere::new(s.center, s.radius))
            .collect::<SceneResult<Vec<_>>>()?;
        let scene = Scene::new(spheres, self.materials.clone())?;
        Ok((scene, self.camera))
    }

    fn push(&mut self, center: Vec3, radius: f32, material: Material) {
        self.spheres.push(SphereDesc { center, radius });
        self.materials.push(material);
    }
}

/// The built-in test scene: a large ground sphere, two rows of lambert and
/// metal spheres, a glass sphere, and a small warm light.
pub fn demo_scene() -> SceneDesc {
    let mut desc = SceneDesc {
        camera: CameraDesc::default(),
        ..Default::default()
    };

    desc.push(Vec3::new(0.0, -100.5, -1.0), 100.0, Material::lambertian(Color::new(0.8, 0.8, 0.8)));
    desc.push(Vec3::new(2.0, 0.0, -1.0), 0.5, Material::lambertian(Color::new(0.8, 0.4, 0.4)));
    desc.push(Vec3::new(0.0, 0.0, -1.0), 0.5, Material::lambertian(Color::new(0.4, 0.8, 0.4)));
    desc.push(Vec3::new(-2.0, 0.0, -1.0), 0.5, Material::metal(Color::new(0.4, 0.4, 0.8), 0.0));
    desc.push(Vec3::new(2.0, 0.0, 1.0), 0.5, Material::metal(Color::new(0.4, 0.8, 0.4), 0.0));
    desc.push(Vec3::new(0.0, 0.0, 1.0), 0.5, Material::metal(Color::new(0.4, 0.8, 0.4), 0.2));
    desc.push(Vec3::new(-2.0, 0.0, 1.0), 0.5, Material::metal(Color::new(0.4, 0.8, 0.4), 0.6));
    desc.push(Vec3::new(0.5, 1.0, 0.5), 0.5, Material::dielectric(1.5));
    desc.push(
        Vec3::new(-1.5, 1.5, 0.0),
        0.3,
        Material::lambertian(Color::new(0.8, 0.6, 0.2)).with_emissive(Color::new(30.0, 25.0, 15.0)),
    );

    desc
}
