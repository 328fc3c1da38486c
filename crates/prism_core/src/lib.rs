//! Prism Core - Scene model for the Prism path tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Sphere`, `Material`, `Scene`
//! - **Camera description**: `CameraDesc`, the thin-lens parameters a
//!   renderer derives its camera from
//! - **Scene files**: JSON scene descriptions and the built-in demo scene
//!
//! # Example
//!
//! ```ignore
//! use prism_core::SceneDesc;
//!
//! let (scene, camera) = SceneDesc::load("spheres.json")?.build()?;
//! println!("Loaded {} spheres", scene.len());
//! ```

pub mod camera;
pub mod desc;
pub mod error;
pub mod scene;

// Re-export commonly used types
pub use camera::CameraDesc;
pub use desc::{demo_scene, SceneDesc, SphereDesc};
pub use error::{SceneError, SceneResult};
pub use scene::{Material, Scene, Sphere};
