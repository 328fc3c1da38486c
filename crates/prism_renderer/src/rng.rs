//! Deterministic, hash-seeded random numbers.
//!
//! Every random decision in a frame draws from a [`PathRng`] seeded from the
//! logical ray index, the frame number and the bounce depth. Nothing depends
//! on wall-clock time or on which worker thread runs the ray, so a frame is
//! bit-reproducible however the work is split up.

use prism_math::Vec3;
use rand::{Error, RngCore, SeedableRng};
use std::f32::consts::PI;

/// Odd multipliers mixing frame and depth into the per-ray hash.
const FRAME_DEPTH_MUL: u32 = 101_141_101;
const SEED_MUL: u32 = 336_343_633;

/// Thomas Wang's 32-bit integer hash.
#[inline]
pub fn wang_hash(seed: u32) -> u32 {
    let mut seed = (seed ^ 61) ^ (seed >> 16);
    seed = seed.wrapping_mul(9);
    seed ^= seed >> 4;
    seed = seed.wrapping_mul(0x27d4_eb2d);
    seed ^ (seed >> 15)
}

/// Seed for the scatter decision of ray `index` at bounce `depth`.
#[inline]
pub fn scatter_seed(index: u32, frame: u32, depth: u32, max_depth: u32) -> u32 {
    let step = frame.wrapping_mul(max_depth).wrapping_add(depth);
    wang_hash(index)
        .wrapping_add(step.wrapping_mul(FRAME_DEPTH_MUL))
        .wrapping_mul(SEED_MUL)
}

/// Seed for the primary (camera) sample of ray `index`.
#[inline]
pub fn camera_seed(index: u32, frame: u32, max_depth: u32) -> u32 {
    scatter_seed(index, frame, 0, max_depth) | 1
}

/// Linear congruential stream over a 32-bit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRng {
    state: u32,
}

impl PathRng {
    /// Create a generator from a raw seed.
    #[inline]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn for_camera(index: u32, frame: u32, max_depth: u32) -> Self {
        Self::new(camera_seed(index, frame, max_depth))
    }

    #[inline]
    pub fn for_scatter(index: u32, frame: u32, depth: u32, max_depth: u32) -> Self {
        Self::new(scatter_seed(index, frame, depth, max_depth))
    }

    #[inline]
    fn step(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform float in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        gen_f32(self)
    }
}

impl RngCore for PathRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.step() as u64;
        let hi = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for PathRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Uniform float in [0, 1) built from the top 23 bits of the next draw.
#[inline]
pub fn gen_f32<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    f32::from_bits(0x3F80_0000 | (rng.next_u32() >> 9)) - 1.0
}

/// Uniform point inside the unit disk in the XY plane.
pub fn random_in_unit_disk<R: RngCore + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform point inside the unit ball.
pub fn random_in_unit_sphere<R: RngCore + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng), gen_f32(rng), gen_f32(rng)) * 2.0 - Vec3::ONE;
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform direction on the unit sphere.
pub fn random_unit_vector<R: RngCore + ?Sized>(rng: &mut R) -> Vec3 {
    let z = gen_f32(rng) * 2.0 - 1.0;
    let a = gen_f32(rng) * 2.0 * PI;
    let r = (1.0 - z * z).sqrt();
    Vec3::new(r * a.cos(), r * a.sin(), z)
}
