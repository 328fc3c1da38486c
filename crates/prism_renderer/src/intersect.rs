//! Ray-sphere intersection.

use prism_core::{Scene, Sphere};
use prism_math::{Interval, Ray, Vec3};
use rayon::prelude::*;

use crate::integrator::PathRay;

/// Near clip: keeps bounced rays from re-hitting the surface they left.
pub const T_MIN: f32 = 0.001;
/// Far clip.
pub const T_MAX: f32 = 1.0e7;

/// Record of a ray-sphere intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Point of intersection
    pub pos: Vec3,
    /// Outward surface normal (not flipped toward the ray)
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Index of the sphere in the scene
    pub id: usize,
}

/// Nearest root of the ray-sphere quadratic strictly inside `ray_t`.
///
/// Expects a unit-length ray direction. Only a positive discriminant counts
/// as a hit, so a ray exactly tangent to the sphere misses.
#[inline]
pub fn hit_sphere(ray: &Ray, sphere: &Sphere, ray_t: Interval) -> Option<f32> {
    let oc = ray.origin - sphere.center();
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - sphere.radius() * sphere.radius();
    let discriminant = b * b - c;
    if discriminant <= 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();
    [-b - sqrtd, -b + sqrtd]
        .into_iter()
        .find(|&t| ray_t.surrounds(t))
}

/// Closest hit over every sphere in the scene.
///
/// Spheres are tested in index order and the upper bound shrinks after each
/// accepted hit, so the first of two equal distances wins.
pub fn hit_world(ray: &Ray, scene: &Scene, ray_t: Interval) -> Option<Hit> {
    let mut closest_so_far = ray_t.max;
    let mut hit_id = None;

    for (id, sphere) in scene.spheres().iter().enumerate() {
        if let Some(t) = hit_sphere(ray, sphere, ray_t.with_max(closest_so_far)) {
            closest_so_far = t;
            hit_id = Some(id);
        }
    }

    hit_id.map(|id| {
        let pos = ray.at(closest_so_far);
        Hit {
            pos,
            normal: scene.spheres()[id].normal_at(pos),
            t: closest_so_far,
            id,
        }
    })
}

/// Intersect every active path against the scene.
///
/// Done paths are skipped and their hit slot is left as it was.
pub fn intersect_paths(paths: &[PathRay], hits: &mut [Option<Hit>], scene: &Scene, ray_t: Interval) {
    debug_assert_eq!(paths.len(), hits.len());
    paths
        .par_iter()
        .zip(hits.par_iter_mut())
        .filter(|(path, _)| path.is_active())
        .for_each(|(path, hit)| *hit = hit_world(path.ray(), scene, ray_t));
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::Material;
    use prism_math::Color;

    const EPSILON: f32 = 1e-5;

    fn default_interval() -> Interval {
        Interval::new(T_MIN, T_MAX)
    }

    fn scene_of(spheres: &[(Vec3, f32)]) -> Scene {
        Scene::new(
            spheres
                .iter()
                .map(|&(c, r)| Sphere::new(c, r).unwrap())
                .collect(),
            vec![Material::lambertian(Color::ONE); spheres.len()],
        )
        .unwrap()
    }

    #[test]
    fn test_head_on_hit_distance_and_normal() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.5).unwrap();
        let scene = Scene::new(vec![sphere], vec![Material::dielectric(1.5)]).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hit = hit_world(&ray, &scene, default_interval()).expect("should hit");
        assert!((hit.t - (5.0 - 1.5)).abs() < EPSILON);
        assert!((hit.pos - Vec3::new(0.0, 0.0, -3.5)).length() < EPSILON);
        assert!((hit.normal + ray.direction).length() < EPSILON, "normal {:?}", hit.normal);
        assert_eq!(hit.id, 0);
    }

    #[test]
    fn test_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(hit_sphere(&ray, &sphere, default_interval()).is_none());
    }

    #[test]
    fn test_tangent_ray_is_rejected() {
        // Closest approach equals the radius: discriminant is exactly zero
        let sphere = Sphere::new(Vec3::ZERO, 1.0).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 1.0, -5.0), Vec3::Z);
        assert!(hit_sphere(&ray, &sphere, default_interval()).is_none());
    }

    #[test]
    fn test_grazing_ray_inside_silhouette_hits() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0).unwrap();
        let ray = Ray::new(Vec3::new(0.0, 0.99, -5.0), Vec3::Z);
        let t = hit_sphere(&ray, &sphere, default_interval()).expect("should graze");
        let expected = 5.0 - (1.0 - 0.99_f32 * 0.99).sqrt();
        assert!((t - expected).abs() < 1e-4);
    }

    #[test]
    fn test_inside_sphere_uses_far_root() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = hit_sphere(&ray, &sphere, default_interval()).unwrap();
        assert!((t - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_interval_is_exclusive() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        // Near root at t = 2, far root at t = 4
        assert!(hit_sphere(&ray, &sphere, Interval::new(T_MIN, 2.0)).is_none());
        let t = hit_sphere(&ray, &sphere, Interval::new(2.0, T_MAX)).unwrap();
        assert!((t - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_closest_sphere_wins() {
        let scene = scene_of(&[
            (Vec3::new(0.0, 0.0, -10.0), 1.0),
            (Vec3::new(0.0, 0.0, -4.0), 1.0),
            (Vec3::new(0.0, 0.0, -7.0), 1.0),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = hit_world(&ray, &scene, default_interval()).unwrap();
        assert_eq!(hit.id, 1);
        assert!((hit.t - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_coincident_spheres_first_wins() {
        let scene = scene_of(&[
            (Vec3::new(0.0, 0.0, -4.0), 1.0),
            (Vec3::new(0.0, 0.0, -4.0), 1.0),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(hit_world(&ray, &scene, default_interval()).unwrap().id, 0);
    }

    #[test]
    fn test_intersect_paths_skips_done() {
        let scene = scene_of(&[(Vec3::new(0.0, 0.0, -4.0), 1.0)]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let mut done = PathRay::spawn(ray);
        done.terminate();
        let paths = vec![PathRay::spawn(ray), done];

        let stale = Hit {
            pos: Vec3::ONE,
            normal: Vec3::Y,
            t: 42.0,
            id: 7,
        };
        let mut hits = vec![None, Some(stale)];

        intersect_paths(&paths, &mut hits, &scene, default_interval());
        assert_eq!(hits[0].map(|h| h.id), Some(0));
        assert_eq!(hits[1], Some(stale));
    }
}
