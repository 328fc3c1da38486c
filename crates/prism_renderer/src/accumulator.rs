//! Progressive frame accumulation into the persistent backbuffer.

use prism_math::Color;
use rayon::prelude::*;

use crate::integrator::Sample;

/// Floating-point render target, four floats per pixel.
///
/// Channels 0-2 hold linear RGB; channel 3 is reserved for the presenter
/// and never written by the renderer. Rows are stored bottom-up: row 0 is
/// the bottom of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Backbuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Backbuffer {
    /// Create a new backbuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the RGB color at (x, y), y counted from the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = self.pixels[(y * self.width + x) as usize];
        Color::new(r, g, b)
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Flat row-major view: `[r, g, b, reserved, r, g, b, reserved, ...]`.
    pub fn as_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Raw native-endian bytes of [`Backbuffer::as_slice`].
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Weight of everything accumulated before `frame`.
///
/// Frame N contributes 1 / (N + 1) of the result when progressive, or
/// replaces it entirely otherwise.
#[inline]
pub fn lerp_factor(frame: u32, progressive: bool) -> f32 {
    if progressive {
        frame as f32 / (frame as f32 + 1.0)
    } else {
        0.0
    }
}

/// Fold one frame's samples into the backbuffer.
///
/// `samples` holds `samples_per_pixel` consecutive samples per pixel, pixels
/// in the backbuffer's row-major order.
pub fn accumulate(
    backbuffer: &mut Backbuffer,
    samples: &[Sample],
    samples_per_pixel: u32,
    frame: u32,
    progressive: bool,
) {
    let spp = samples_per_pixel as usize;
    debug_assert_eq!(samples.len(), backbuffer.pixels.len() * spp);

    let lerp = lerp_factor(frame, progressive);
    let inv_spp = 1.0 / samples_per_pixel as f32;

    backbuffer
        .pixels
        .par_iter_mut()
        .zip(samples.par_chunks(spp))
        .for_each(|(pixel, pixel_samples)| {
            let mean = pixel_samples
                .iter()
                .fold(Color::ZERO, |acc, s| acc + s.color)
                * inv_spp;

            let color = if lerp > 0.0 {
                let prev = Color::new(pixel[0], pixel[1], pixel[2]);
                prev * lerp + mean * (1.0 - lerp)
            } else {
                mean
            };

            pixel[0] = color.x;
            pixel[1] = color.y;
            pixel[2] = color.z;
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn samples_of(colors: &[Color]) -> Vec<Sample> {
        colors
            .iter()
            .map(|&color| Sample {
                color,
                attenuation: Color::ONE,
            })
            .collect()
    }

    #[test]
    fn test_first_frame_overwrites() {
        let mut buffer = Backbuffer::new(1, 1);
        accumulate(&mut buffer, &samples_of(&[Color::ONE]), 1, 0, true);
        accumulate(&mut buffer, &samples_of(&[Color::splat(0.25)]), 1, 0, true);
        assert_eq!(buffer.pixel(0, 0), Color::splat(0.25));
    }

    #[test]
    fn test_samples_are_averaged_per_pixel() {
        let mut buffer = Backbuffer::new(2, 1);
        let samples = samples_of(&[
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 1.0, 0.0),
            Color::splat(2.0),
            Color::splat(4.0),
        ]);

        accumulate(&mut buffer, &samples, 2, 0, true);

        assert_eq!(buffer.pixel(0, 0), Color::new(0.5, 0.5, 0.0));
        assert_eq!(buffer.pixel(1, 0), Color::splat(3.0));
    }

    #[test]
    fn test_progressive_weights() {
        let mut buffer = Backbuffer::new(1, 1);
        let frames = [1.0, 2.0, 6.0, 3.0];

        for (frame, value) in frames.iter().enumerate() {
            accumulate(
                &mut buffer,
                &samples_of(&[Color::splat(*value)]),
                1,
                frame as u32,
                true,
            );
        }

        // Equal weight for every frame: running mean
        let mean = frames.iter().sum::<f32>() / frames.len() as f32;
        assert!((buffer.pixel(0, 0) - Color::splat(mean)).length() < 1e-5);
    }

    #[test]
    fn test_second_frame_is_half_weighted() {
        let mut buffer = Backbuffer::new(1, 1);
        accumulate(&mut buffer, &samples_of(&[Color::ONE]), 1, 0, true);
        accumulate(&mut buffer, &samples_of(&[Color::ZERO]), 1, 1, true);
        assert!((buffer.pixel(0, 0) - Color::splat(0.5)).length() < EPSILON);
    }

    #[test]
    fn test_non_progressive_overwrites() {
        let mut buffer = Backbuffer::new(1, 1);
        accumulate(&mut buffer, &samples_of(&[Color::ONE]), 1, 0, false);
        accumulate(&mut buffer, &samples_of(&[Color::splat(0.2)]), 1, 7, false);
        assert_eq!(buffer.pixel(0, 0), Color::splat(0.2));
    }

    #[test]
    fn test_lerp_factor() {
        assert_eq!(lerp_factor(0, true), 0.0);
        assert_eq!(lerp_factor(1, true), 0.5);
        assert_eq!(lerp_factor(3, true), 0.75);
        assert_eq!(lerp_factor(3, false), 0.0);
    }

    #[test]
    fn test_reserved_channel_untouched() {
        let mut buffer = Backbuffer::new(1, 1);
        buffer.pixels[0][3] = 1.0;
        accumulate(&mut buffer, &samples_of(&[Color::new(0.1, 0.2, 0.3)]), 1, 0, false);
        assert_eq!(buffer.as_slice(), &[0.1, 0.2, 0.3, 1.0]);
        assert_eq!(buffer.as_bytes().len(), 16);
    }
}
