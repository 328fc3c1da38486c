//! Render entry point: primary rays, path tracing, accumulation per frame.

use std::time::Instant;

use prism_core::{CameraDesc, Scene, SceneError};
use prism_math::{Interval, Ray};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accumulator::{accumulate, Backbuffer};
use crate::camera::Camera;
use crate::integrator::{trace_paths, PathArena};
use crate::intersect::{T_MAX, T_MIN};
use crate::rng::PathRng;

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Paths traced per pixel per frame
    pub samples_per_pixel: u32,
    /// Maximum bounce depth; each path gets `max_depth + 1` bounce levels
    pub max_depth: u32,
    /// Number of frames to render
    pub frame_count: u32,
    /// Blend frames into a running mean instead of overwriting
    pub progressive: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            samples_per_pixel: 4,
            max_depth: 10,
            frame_count: 16,
            progressive: true,
        }
    }
}

impl RenderConfig {
    /// Check that the configuration describes a renderable image.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples per pixel must be at least 1".into(),
            ));
        }
        if self.frame_count == 0 {
            return Err(RenderError::InvalidConfig(
                "frame count must be at least 1".into(),
            ));
        }
        // Path indices seed the RNG as u32
        let num_rays = self.width as u64 * self.height as u64 * self.samples_per_pixel as u64;
        if num_rays > u32::MAX as u64 {
            return Err(RenderError::InvalidConfig(format!(
                "{num_rays} paths per frame exceeds the supported maximum"
            )));
        }
        Ok(())
    }

    /// Paths traced per frame.
    pub fn num_rays(&self) -> usize {
        self.width as usize * self.height as usize * self.samples_per_pixel as usize
    }

    /// Image aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Errors that stop a render before any frame is traced.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidCamera(#[from] SceneError),

    #[error("Backbuffer is {actual_width}x{actual_height}, render expects {width}x{height}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Work done for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u32,
    /// (path, bounce) pairs processed
    pub rays: u64,
    /// Paths stopped by an unrecognized material
    pub invalid_paths: u64,
}

/// Cumulative work over a whole render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u32,
    pub rays: u64,
    pub invalid_paths: u64,
}

impl RenderStats {
    /// Fold a finished frame into the totals.
    pub fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.rays += frame.rays;
        self.invalid_paths += frame.invalid_paths;
    }
}

/// Progressive path tracer bound to one scene for the duration of a render.
///
/// Owns the camera and the per-path buffers; the scene is borrowed
/// immutably, so it cannot change while frames are in flight.
pub struct Renderer<'a> {
    scene: &'a Scene,
    camera: Camera,
    config: RenderConfig,
    arena: PathArena,
    ray_t: Interval,
}

impl<'a> Renderer<'a> {
    /// Validate the configuration and camera, then allocate per-path buffers.
    pub fn new(scene: &'a Scene, camera: &CameraDesc, config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        camera.validate()?;
        log::debug!(
            "Allocating {} paths for {}x{} @ {} spp",
            config.num_rays(),
            config.width,
            config.height,
            config.samples_per_pixel
        );

        Ok(Self {
            scene,
            camera: Camera::new(camera, config.aspect()),
            config,
            arena: PathArena::new(config.num_rays()),
            ray_t: Interval::new(T_MIN, T_MAX),
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Backbuffer sized for this render.
    pub fn new_backbuffer(&self) -> Backbuffer {
        Backbuffer::new(self.config.width, self.config.height)
    }

    /// Primary ray of path `index` in `frame`.
    ///
    /// Paths are laid out pixel by pixel in row-major order, with
    /// `samples_per_pixel` consecutive paths per pixel. Row 0 is the bottom
    /// of the image.
    pub fn primary_ray(&self, index: usize, frame: u32) -> Ray {
        primary_ray(&self.camera, &self.config, index, frame)
    }

    /// Trace one frame and fold it into `backbuffer`.
    pub fn render_frame(&mut self, frame: u32, backbuffer: &mut Backbuffer) -> Result<FrameStats, RenderError> {
        self.check_backbuffer(backbuffer)?;
        let start = Instant::now();

        let camera = self.camera;
        let config = self.config;
        self.arena
            .spawn_all(|index| primary_ray(&camera, &config, index, frame));

        let trace = trace_paths(&mut self.arena, self.scene, frame, config.max_depth, self.ray_t);

        accumulate(
            backbuffer,
            self.arena.samples(),
            config.samples_per_pixel,
            frame,
            config.progressive,
        );

        if trace.invalid_paths > 0 {
            log::warn!(
                "Frame {}: {} paths hit an unrecognized material",
                frame,
                trace.invalid_paths
            );
        }
        log::debug!("Frame {} traced {} rays in {:?}", frame, trace.rays, start.elapsed());

        Ok(FrameStats {
            frame,
            rays: trace.rays,
            invalid_paths: trace.invalid_paths,
        })
    }

    /// Render every configured frame, in order, into `backbuffer`.
    pub fn render(&mut self, backbuffer: &mut Backbuffer) -> Result<RenderStats, RenderError> {
        log::info!(
            "Rendering {}x{} @ {} spp, depth {}, {} frames",
            self.config.width,
            self.config.height,
            self.config.samples_per_pixel,
            self.config.max_depth,
            self.config.frame_count
        );

        let mut stats = RenderStats::default();
        for frame in 0..self.config.frame_count {
            let frame_stats = self.render_frame(frame, backbuffer)?;
            stats.record(&frame_stats);
        }
        Ok(stats)
    }

    fn check_backbuffer(&self, backbuffer: &Backbuffer) -> Result<(), RenderError> {
        if backbuffer.width() != self.config.width || backbuffer.height() != self.config.height {
            return Err(RenderError::BufferSizeMismatch {
                width: self.config.width,
                height: self.config.height,
                actual_width: backbuffer.width(),
                actual_height: backbuffer.height(),
            });
        }
        Ok(())
    }
}

fn primary_ray(camera: &Camera, config: &RenderConfig, index: usize, frame: u32) -> Ray {
    let pixel = index / config.samples_per_pixel as usize;
    let x = (pixel % config.width as usize) as f32;
    let y = (pixel / config.width as usize) as f32;

    let mut rng = PathRng::for_camera(index as u32, frame, config.max_depth);
    let s = (x + rng.next_f32()) / config.width as f32;
    let t = (y + rng.next_f32()) / config.height as f32;
    camera.get_ray(s, t, &mut rng)
}

/// Render a scene from scratch into a new backbuffer.
pub fn render(
    scene: &Scene,
    camera: &CameraDesc,
    config: RenderConfig,
) -> Result<(Backbuffer, RenderStats), RenderError> {
    let mut renderer = Renderer::new(scene, camera, config)?;
    let mut backbuffer = renderer.new_backbuffer();
    let stats = renderer.render(&mut backbuffer)?;
    Ok((backbuffer, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::sky_color;
    use crate::intersect::hit_world;
    use prism_core::{demo_scene, Material, Sphere};
    use prism_math::{Color, Vec3};

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 24,
            height: 16,
            samples_per_pixel: 2,
            max_depth: 4,
            frame_count: 2,
            progressive: true,
        }
    }

    fn bits(buffer: &Backbuffer) -> Vec<u32> {
        buffer.as_slice().iter().map(|f| f.to_bits()).collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(RenderConfig::default().validate().is_ok());

        for config in [
            RenderConfig { width: 0, ..Default::default() },
            RenderConfig { height: 0, ..Default::default() },
            RenderConfig { samples_per_pixel: 0, ..Default::default() },
            RenderConfig { frame_count: 0, ..Default::default() },
            RenderConfig { width: 100_000, height: 100_000, ..Default::default() },
        ] {
            assert!(
                matches!(config.validate(), Err(RenderError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_config_from_json() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "width": 320, "progressive": false }"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, RenderConfig::default().height);
        assert!(!config.progressive);
    }

    #[test]
    fn test_degenerate_camera_rejected() {
        let scene = Scene::default();
        let config = RenderConfig {
            width: 4,
            height: 4,
            ..small_config()
        };

        let top_down = CameraDesc {
            look_from: Vec3::new(0.0, 5.0, 0.0),
            look_at: Vec3::ZERO,
            ..CameraDesc::default()
        };
        let on_target = CameraDesc {
            look_at: CameraDesc::default().look_from,
            ..CameraDesc::default()
        };

        for camera in [top_down, on_target] {
            assert!(matches!(
                render(&scene, &camera, config),
                Err(RenderError::InvalidCamera(_))
            ));
        }
    }

    #[test]
    fn test_backbuffer_size_mismatch() {
        let scene = Scene::default();
        let mut renderer = Renderer::new(&scene, &CameraDesc::default(), small_config()).unwrap();
        let mut wrong = Backbuffer::new(8, 8);
        assert!(matches!(
            renderer.render_frame(0, &mut wrong),
            Err(RenderError::BufferSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_primary_rays_are_unit_length() {
        let scene = Scene::default();
        let config = small_config();
        let renderer = Renderer::new(&scene, &CameraDesc::default(), config).unwrap();
        for index in 0..config.num_rays() {
            let ray = renderer.primary_ray(index, 1);
            assert!((ray.direction.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_scene_counts_one_ray_per_path() {
        let scene = Scene::default();
        let config = small_config();
        let (buffer, stats) = render(&scene, &CameraDesc::default(), config).unwrap();

        assert_eq!(stats.frames, config.frame_count);
        assert_eq!(
            stats.rays,
            config.num_rays() as u64 * config.frame_count as u64
        );
        assert_eq!(stats.invalid_paths, 0);
        assert!(buffer.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_emissive_sphere_end_to_end() {
        let emission = Color::new(2.0, 1.5, 1.0);
        let scene = Scene::new(
            vec![Sphere::new(Vec3::ZERO, 1.0).unwrap()],
            vec![Material::lambertian(Color::splat(0.5)).with_emissive(emission)],
        )
        .unwrap();
        let camera = CameraDesc::looking_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 60.0);
        let config = RenderConfig {
            width: 32,
            height: 24,
            samples_per_pixel: 1,
            max_depth: 0,
            frame_count: 1,
            progressive: true,
        };

        let mut renderer = Renderer::new(&scene, &camera, config).unwrap();
        let mut buffer = renderer.new_backbuffer();
        let stats = renderer.render(&mut buffer).unwrap();
        assert_eq!(stats.rays, config.num_rays() as u64);

        let ray_t = Interval::new(T_MIN, T_MAX);
        let mut covered = 0;
        for y in 0..config.height {
            for x in 0..config.width {
                let index = (y * config.width + x) as usize;
                let ray = renderer.primary_ray(index, 0);
                let expected = match hit_world(&ray, &scene, ray_t) {
                    Some(_) => {
                        covered += 1;
                        emission
                    }
                    None => sky_color(ray.direction),
                };
                assert_eq!(buffer.pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }

        assert!(covered > 0 && covered < config.num_rays());
        assert_eq!(buffer.pixel(16, 12), emission);
        assert_ne!(buffer.pixel(0, 0), emission);
    }

    #[test]
    fn test_render_is_repeatable() {
        let (scene, camera) = demo_scene().build().unwrap();
        let (a, stats_a) = render(&scene, &camera, small_config()).unwrap();
        let (b, stats_b) = render(&scene, &camera, small_config()).unwrap();
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn test_render_independent_of_thread_count() {
        let (scene, camera) = demo_scene().build().unwrap();

        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| render(&scene, &camera, small_config()).unwrap())
        };

        let (single, single_stats) = run(1);
        let (multi, multi_stats) = run(4);
        assert_eq!(bits(&single), bits(&multi));
        assert_eq!(single_stats, multi_stats);
    }

    #[test]
    fn test_demo_scene_sees_light() {
        let (scene, camera) = demo_scene().build().unwrap();
        let (buffer, stats) = render(&scene, &camera, small_config()).unwrap();

        assert!(stats.rays >= small_config().num_rays() as u64 * 2);
        assert!(buffer.as_slice().iter().all(|v| v.is_finite() && *v >= 0.0));
        // The light is far brighter than the dim sky
        assert!(buffer
            .pixels()
            .iter()
            .any(|p| p[0] > 1.0 || p[1] > 1.0 || p[2] > 1.0));
    }

    #[test]
    fn test_frames_differ_but_stay_in_range() {
        let (scene, camera) = demo_scene().build().unwrap();
        let config = RenderConfig {
            frame_count: 1,
            ..small_config()
        };
        let mut renderer = Renderer::new(&scene, &camera, config).unwrap();

        let mut first = renderer.new_backbuffer();
        renderer.render_frame(0, &mut first).unwrap();
        let mut second = renderer.new_backbuffer();
        renderer.render_frame(1, &mut second).unwrap();

        // Different frames draw different random numbers
        assert_ne!(bits(&first), bits(&second));
        for buffer in [&first, &second] {
            assert!(buffer.as_slice().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }
}
