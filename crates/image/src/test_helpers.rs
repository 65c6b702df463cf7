//! Shared fixtures for unit tests.
//!
//! Images are generated in memory so tests need no files on disk.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Deterministic 32-bit hash of a pixel position.
///
/// The multiply steps make it non-linear, so channels taken from different
/// bytes of one hash are independent of each other.
pub fn pixel_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut v = x.wrapping_mul(0x9E37_79B9)
        ^ y.wrapping_mul(0x85EB_CA6B).rotate_left(16)
        ^ seed.wrapping_mul(0xC2B2_AE35);
    v ^= v >> 16;
    v = v.wrapping_mul(0x7FEB_352D);
    v ^= v >> 15;
    v = v.wrapping_mul(0x846C_A68B);
    v ^= v >> 16;
    v
}

fn noise_pixel(x: u32, y: u32) -> [u8; 3] {
    let [r, g, b, _] = pixel_hash(x, y, 1).to_be_bytes();
    [r, g, b]
}

/// RGB image full of high-entropy noise with (almost) one colour per pixel.
pub fn noise_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| Rgb(noise_pixel(x, y))))
}

/// Number of distinct RGBA colours in an image.
pub fn distinct_colors(img: &DynamicImage) -> usize {
    img.to_rgba8()
        .pixels()
        .map(|p| p.0)
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// RGBA image whose left half is fully transparent and right half is
/// opaque noise.
pub fn half_transparent(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            let [r, g, b] = noise_pixel(x, y);
            Rgba([r, g, b, 255])
        }
    }))
}

/// Encode with the `image` crate's stock encoder.
pub fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}
