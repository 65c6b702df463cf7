//! Alpha flattening before JPEG encoding.
//!
//! JPEG has no alpha channel. Transparent regions are composited onto an
//! opaque background so they come out as that colour rather than black.

use image::{DynamicImage, Rgb, RgbImage};

/// Background used for transparent regions: opaque white.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Composite an image over a solid background and drop its alpha channel.
///
/// Opaque images are converted directly.
pub fn flatten_alpha(img: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !has_alpha_channel(img) {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let Rgb([bg_r, bg_g, bg_b]) = background;

    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        Rgb([
            blend(r, bg_r, alpha),
            blend(g, bg_g, alpha),
            blend(b, bg_b, alpha),
        ])
    })
}

fn blend(fg: u8, bg: u8, alpha: f32) -> u8 {
    (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8
}

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}
