//! Prism Renderer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer for scenes of spheres. Each frame traces every
//! path through a depth-limited bounce loop and blends the per-pixel mean
//! into a persistent backbuffer, so the image refines over frames.
//!
//! Random numbers are seeded from the logical path index, frame and bounce
//! depth, which makes every frame bit-reproducible regardless of how rayon
//! splits the work.

mod accumulator;
mod camera;
mod integrator;
mod intersect;
mod renderer;
mod rng;
mod scatter;

pub use accumulator::{accumulate, lerp_factor, Backbuffer};
pub use camera::Camera;
pub use integrator::{sky_color, trace_paths, PathArena, PathRay, PathState, Sample, TraceStats};
pub use intersect::{hit_sphere, hit_world, intersect_paths, Hit, T_MAX, T_MIN};
pub use renderer::{render, FrameStats, RenderConfig, RenderError, RenderStats, Renderer};
pub use rng::{
    camera_seed, gen_f32, random_in_unit_disk, random_in_unit_sphere, random_unit_vector,
    scatter_seed, wang_hash, PathRng,
};
pub use scatter::{scatter, Scatter, INVALID_MATERIAL_COLOR};

/// Re-export scene and math types used in the public API
pub use prism_core::{CameraDesc, Material, Scene, Sphere};
pub use prism_math::{Color, Interval, Ray, Vec3};
