//! Depth-limited path integration over a batch of in-flight rays.
//!
//! Every bounce level runs in two passes over the whole batch: intersect all
//! active paths, then shade/scatter all active paths. Both passes are
//! parallel over paths; a path only touches its own slot in the arena.

use std::ops::{Add, AddAssign};

use prism_core::Scene;
use prism_math::{Color, Interval, Ray, Vec3};
use rayon::prelude::*;

use crate::intersect::{intersect_paths, Hit};
use crate::rng::PathRng;
use crate::scatter::{scatter, Scatter};

/// Sky color at the zenith; the horizon is white.
const SKY_ZENITH: Color = Color::new(0.5, 0.7, 1.0);
/// Overall sky brightness.
const SKY_INTENSITY: f32 = 0.3;

/// Lifecycle of a path. `Active -> Done` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Active,
    Done,
}

/// A ray in flight together with its lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRay {
    ray: Ray,
    state: PathState,
}

impl PathRay {
    /// Start a new active path.
    #[inline]
    pub fn spawn(ray: Ray) -> Self {
        Self {
            ray,
            state: PathState::Active,
        }
    }

    #[inline]
    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    #[inline]
    pub fn state(&self) -> PathState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == PathState::Active
    }

    /// Mark the path finished. A done path stays done.
    #[inline]
    pub fn terminate(&mut self) {
        self.state = PathState::Done;
    }

    /// Replace the ray of an active path with its scattered continuation.
    #[inline]
    fn continue_along(&mut self, ray: Ray) {
        debug_assert!(self.is_active(), "cannot continue a finished path");
        self.ray = ray;
    }
}

impl Default for PathRay {
    fn default() -> Self {
        Self {
            ray: Ray::default(),
            state: PathState::Done,
        }
    }
}

/// Running radiance estimate and throughput of one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub color: Color,
    pub attenuation: Color,
}

impl Sample {
    /// No radiance gathered yet, full throughput.
    pub const fn new() -> Self {
        Self {
            color: Color::ZERO,
            attenuation: Color::ONE,
        }
    }
}

impl Default for Sample {
    fn default() -> Self {
        Self::new()
    }
}

/// Work counters for a batch of paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// (path, bounce) pairs processed
    pub rays: u64,
    /// Paths stopped by an unrecognized material
    pub invalid_paths: u64,
}

impl Add for TraceStats {
    type Output = TraceStats;

    fn add(self, other: TraceStats) -> TraceStats {
        TraceStats {
            rays: self.rays + other.rays,
            invalid_paths: self.invalid_paths + other.invalid_paths,
        }
    }
}

impl AddAssign for TraceStats {
    fn add_assign(&mut self, other: TraceStats) {
        *self = *self + other;
    }
}

/// Per-path buffers, allocated once per render and reused every frame.
///
/// Slot `i` of each buffer belongs to path `i`; the slot index is also the
/// logical index the path's random numbers are seeded from.
#[derive(Debug, Clone)]
pub struct PathArena {
    paths: Vec<PathRay>,
    hits: Vec<Option<Hit>>,
    samples: Vec<Sample>,
}

impl PathArena {
    /// Allocate room for `num_rays` paths, all initially done.
    pub fn new(num_rays: usize) -> Self {
        Self {
            paths: vec![PathRay::default(); num_rays],
            hits: vec![None; num_rays],
            samples: vec![Sample::new(); num_rays],
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Start path `index` along `ray` with a fresh sample.
    pub fn spawn(&mut self, index: usize, ray: Ray) {
        self.paths[index] = PathRay::spawn(ray);
        self.hits[index] = None;
        self.samples[index] = Sample::new();
    }

    /// Respawn every path in parallel, `primary(i)` giving the ray of path `i`.
    pub fn spawn_all<F>(&mut self, primary: F)
    where
        F: Fn(usize) -> Ray + Sync,
    {
        self.paths
            .par_iter_mut()
            .zip(self.hits.par_iter_mut())
            .zip(self.samples.par_iter_mut())
            .enumerate()
            .for_each(|(index, ((path, hit), sample))| {
                *path = PathRay::spawn(primary(index));
                *hit = None;
                *sample = Sample::new();
            });
    }

    pub fn paths(&self) -> &[PathRay] {
        &self.paths
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Background radiance for a ray that escapes the scene.
///
/// White at the horizon blending to blue at the zenith by `direction.y`,
/// scaled down to a dim fill light.
#[inline]
pub fn sky_color(direction: Vec3) -> Color {
    let t = 0.5 * (direction.y + 1.0);
    ((1.0 - t) * Color::ONE + t * SKY_ZENITH) * SKY_INTENSITY
}

/// What every path at one bounce level shares.
#[derive(Clone, Copy)]
struct Bounce<'a> {
    scene: &'a Scene,
    frame: u32,
    depth: u32,
    max_depth: u32,
}

/// Trace every active path in `arena` for up to `max_depth + 1` bounce levels.
///
/// Paths must have been spawned for this frame. On return every path is
/// done and its sample holds the path's radiance estimate.
pub fn trace_paths(
    arena: &mut PathArena,
    scene: &Scene,
    frame: u32,
    max_depth: u32,
    ray_t: Interval,
) -> TraceStats {
    let mut stats = TraceStats::default();

    for depth in 0..=max_depth {
        intersect_paths(&arena.paths, &mut arena.hits, scene, ray_t);

        let bounce = Bounce {
            scene,
            frame,
            depth,
            max_depth,
        };
        let level = shade_paths(arena, bounce);
        stats += level;

        // Nothing left in flight; later levels would skip every path anyway
        if level.rays == 0 {
            break;
        }
    }

    debug_assert!(arena.paths.iter().all(|p| !p.is_active()));
    stats
}

fn shade_paths(arena: &mut PathArena, bounce: Bounce) -> TraceStats {
    let PathArena {
        paths,
        hits,
        samples,
    } = arena;

    paths
        .par_iter_mut()
        .zip(hits.par_iter())
        .zip(samples.par_iter_mut())
        .enumerate()
        .filter(|(_, ((path, _), _))| path.is_active())
        .map(|(index, ((path, hit), sample))| {
            shade_path(index as u32, path, hit.as_ref(), sample, bounce)
        })
        .reduce(TraceStats::default, |a, b| a + b)
}

/// Gather emission or sky light for one path, then scatter or finish it.
fn shade_path(
    index: u32,
    path: &mut PathRay,
    hit: Option<&Hit>,
    sample: &mut Sample,
    bounce: Bounce,
) -> TraceStats {
    let mut stats = TraceStats {
        rays: 1,
        invalid_paths: 0,
    };

    let Some(hit) = hit else {
        sample.color += sample.attenuation * sky_color(path.ray().direction);
        path.terminate();
        return stats;
    };

    let material = bounce.scene.material(hit.id);
    sample.color += material.emissive() * sample.attenuation;

    if bounce.depth < bounce.max_depth {
        let mut rng = PathRng::for_scatter(index, bounce.frame, bounce.depth, bounce.max_depth);
        match scatter(material, path.ray(), hit, &mut rng) {
            Scatter::Bounce { attenuation, ray } => {
                sample.attenuation *= attenuation;
                path.continue_along(ray);
                return stats;
            }
            Scatter::Absorbed => {}
            Scatter::Invalid { .. } => stats.invalid_paths = 1,
        }
    }

    path.terminate();
    stats
}
