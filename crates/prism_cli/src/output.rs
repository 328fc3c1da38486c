//! Image output for finished or in-progress renders.
//!
//! The backbuffer holds linear radiance with row 0 at the bottom. PNG output
//! gamma-encodes (gamma 2), clamps to [0, 1] and flips to top-down rows.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use prism_math::Color;
use prism_renderer::Backbuffer;

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}

/// Top-down 8-bit image of the backbuffer.
pub fn to_image(backbuffer: &Backbuffer) -> RgbaImage {
    let (width, height) = (backbuffer.width(), backbuffer.height());
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba(color_to_rgba(backbuffer.pixel(x, height - 1 - y)))
    })
}

/// Save the backbuffer as a PNG.
pub fn save_png(backbuffer: &Backbuffer, path: &Path) -> Result<()> {
    to_image(backbuffer)
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Dump the raw float backbuffer.
pub fn save_raw(backbuffer: &Backbuffer, path: &Path) -> Result<()> {
    std::fs::write(path, backbuffer.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!(
        "Wrote {}x{} raw backbuffer to {}",
        backbuffer.width(),
        backbuffer.height(),
        path.display()
    );
    Ok(())
}
