//! Fixed-stride pixel sampling over raw RGBA memory.

use image::RgbaImage;
use palette::Srgb;

use crate::color::Pixel;

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Pixels with alpha at or below this are treated as transparent and skipped.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Number of pixels between two samples for an image of `pixel_count` pixels.
///
/// A zero `target` samples every pixel.
pub fn step_for(pixel_count: usize, target: usize) -> usize {
    pixel_count.checked_div(target).unwrap_or(1).max(1)
}

/// Walks a row-major RGBA buffer with a fixed stride and returns the opaque
/// RGB samples, in buffer order.
///
/// Sampling is deterministic: the same buffer and target always produce the
/// same samples. A trailing partial pixel is ignored.
pub fn sample(pixels: &[u8], width: u32, height: u32, target: usize) -> Vec<Pixel> {
    let step = step_for(width as usize * height as usize, target);
    let samples: Vec<Pixel> = pixels
        .chunks_exact(CHANNELS)
        .step_by(step)
        .filter(|px| px[3] > ALPHA_THRESHOLD)
        .map(|px| Srgb::new(px[0], px[1], px[2]))
        .collect();

    tracing::debug!(
        "sampled {} opaque pixels from {width}x{height} (step {step}, target {target})",
        samples.len()
    );
    samples
}

/// Samples an already decoded image.
pub fn sample_image(image: &RgbaImage, target: usize) -> Vec<Pixel> {
    sample(image.as_raw(), image.width(), image.height(), target)
}
