//! Resize-and-reencode stage.
//!
//! Every decodable upload is normalized to a maximum-quality JPEG, scaled down
//! to the configured bounding box when it exceeds it. Lossy compression is
//! left entirely to the optimizer.

use crate::alpha::{flatten_alpha, WHITE};
use crate::{detect_format, ImageError, ImageFormat, ResizeConfig, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ColorType;

/// Formats the resizer can decode.
///
/// Must match the decoders enabled on the `image` dependency. Uploads in any
/// other format skip shrinking entirely.
pub const DECODABLE_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

/// Quality used for the intermediate JPEG.
pub const INTERMEDIATE_JPEG_QUALITY: u8 = 100;

/// Whether [`resize`] can decode this format.
pub fn can_decode(format: ImageFormat) -> bool {
    DECODABLE_FORMATS.contains(&format)
}

/// Compute output dimensions for the bounding box.
///
/// Landscape images wider than `max` are scaled to that width; otherwise
/// images taller than `max` are scaled to that height. The other edge keeps
/// the aspect ratio and never drops below one pixel.
///
/// # Example
/// ```
/// use notepix_image::fit_within;
///
/// assert_eq!(fit_within(5000, 2000, 1280), (1280, 512));
/// assert_eq!(fit_within(2000, 5000, 1280), (512, 1280));
/// assert_eq!(fit_within(800, 600, 1280), (800, 600));
/// ```
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width > height && width > max {
        (max, scale_edge(height, max, width))
    } else if height > max {
        (scale_edge(width, max, height), max)
    } else {
        (width, height)
    }
}

fn scale_edge(edge: u32, target: u32, reference: u32) -> u32 {
    let scaled = (edge as f64 * target as f64 / reference as f64).round() as u32;
    scaled.max(1)
}

/// Decode, scale to fit `config`, flatten onto white and encode as JPEG.
///
/// The output is always a JPEG, even when no scaling was needed.
pub fn resize(data: &[u8], config: &ResizeConfig) -> Result<Vec<u8>> {
    let format = detect_format(data)?;
    if !can_decode(format) {
        return Err(ImageError::Undecodable(format));
    }

    let img = image::load_from_memory(data).map_err(ImageError::Decode)?;
    let (width, height) = (img.width(), img.height());
    let (new_width, new_height) = fit_within(width, height, config.max_dimension);

    let img = if (new_width, new_height) != (width, height) {
        tracing::debug!(width, height, new_width, new_height, "Scaling image down");
        img.resize_exact(new_width, new_height, FilterType::Lanczos3)
    } else {
        img
    };

    encode_jpeg(&img, INTERMEDIATE_JPEG_QUALITY)
}

/// Flatten and encode a decoded image as JPEG.
pub(crate) fn encode_jpeg(img: &image::DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = flatten_alpha(img, WHITE);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(ImageError::Encode)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_metadata;
    use crate::test_helpers::encode;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    #[test]
    fn test_fit_within_landscape() {
        assert_eq!(fit_within(5000, 2000, 1280), (1280, 512));
    }

    #[test]
    fn test_fit_within_portrait_and_square() {
        assert_eq!(fit_within(1000, 3000, 1200), (400, 1200));
        assert_eq!(fit_within(2400, 2400, 1200), (1200, 1200));
    }

    #[test]
    fn test_fit_within_small_image_untouched() {
        assert_eq!(fit_within(640, 480, 1200), (640, 480));
        assert_eq!(fit_within(1200, 1200, 1200), (1200, 1200));
    }

    #[test]
    fn test_fit_within_never_zero() {
        assert_eq!(fit_within(10_000, 1, 100), (100, 1));
        assert_eq!(fit_within(1, 10_000, 100), (1, 100));
    }

    #[test]
    fn test_decodable_formats() {
        assert!(can_decode(ImageFormat::Jpeg));
        assert!(can_decode(ImageFormat::Png));
        assert!(can_decode(ImageFormat::Gif));
        assert!(!can_decode(ImageFormat::WebP));
        assert!(!can_decode(ImageFormat::Svg));
    }

    #[test]
    fn test_resize_scales_and_outputs_jpeg() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(300, 100, image::Rgb([40, 90, 200])));
        let png = encode(&img, ImageOutputFormat::Png);

        let out = resize(&png, &ResizeConfig { max_dimension: 150 }).unwrap();

        let meta = extract_metadata(&out).unwrap();
        assert_eq!(meta.format, ImageFormat::Jpeg);
        assert_eq!((meta.width, meta.height), (150, 50));
    }

    #[test]
    fn test_resize_flattens_transparency_to_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])));
        let png = encode(&img, ImageOutputFormat::Png);

        let out = resize(&png, &ResizeConfig::default()).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();

        for pixel in decoded.pixels() {
            assert!(pixel.0.iter().all(|&c| c >= 250), "expected white, got {:?}", pixel);
        }
    }

    #[test]
    fn test_resize_rejects_undecodable_format() {
        let webp = b"RIFF\x10\x00\x00\x00WEBPVP8 \x04\x00\x00\x00\x00\x00\x00\x00";
        assert!(matches!(
            resize(webp, &ResizeConfig::default()),
            Err(ImageError::Undecodable(ImageFormat::WebP))
        ));
    }

    #[test]
    fn test_resize_corrupt_data_is_decode_error() {
        let mut truncated = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        truncated.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            resize(&truncated, &ResizeConfig::default()),
            Err(ImageError::Decode(_))
        ));
    }
}
