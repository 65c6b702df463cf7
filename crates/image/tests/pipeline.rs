//! End-to-end tests for the image processor.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use notepix_image::{
    detect_format, extract_metadata, resize, ImageFormat, ImageProcessor, NativeOptimizer, OptimizeConfig,
    ResizeConfig, ShrinkOutcome, ToolchainOptimizer,
};
use notepix_image::optimize::ToolchainPrograms;
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::Arc;

fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut v = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B) ^ seed.wrapping_mul(0xC2B2_AE35);
    v ^= v << 13;
    v ^= v >> 17;
    v ^= v << 5;
    (v & 0xFF) as u8
}

fn noise_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([noise(x, y, seed), noise(x, y, seed.wrapping_add(1)), noise(x, y, seed.wrapping_add(2))])
    }))
}

fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn processor(max_dimension: u32) -> ImageProcessor {
    ImageProcessor::new(
        Arc::new(NativeOptimizer),
        ResizeConfig::new(max_dimension).unwrap(),
        OptimizeConfig::default(),
    )
}

#[test]
fn test_wide_png_is_scaled_to_bounding_box() {
    let png = encode(&noise_image(5000, 2000, 7), ImageOutputFormat::Png);
    let original_len = png.len();

    let processed = processor(1280).process(png, "panorama.png", true).unwrap();

    assert_eq!(processed.shrink, Some(ShrinkOutcome::Optimized));
    assert_eq!(processed.format, ImageFormat::Jpeg);
    assert!(processed.data.len() < original_len);

    let meta = extract_metadata(&processed.data).unwrap();
    assert_eq!((meta.width, meta.height), (1280, 512));
}

#[test]
fn test_wide_jpeg_is_scaled_to_bounding_box() {
    let jpeg = encode(&noise_image(5000, 2000, 5), ImageOutputFormat::Jpeg(95));
    let original_len = jpeg.len();

    let processed = processor(1280).process(jpeg, "panorama.jpg", true).unwrap();

    assert_eq!(processed.shrink, Some(ShrinkOutcome::Optimized));
    assert_eq!(processed.format, ImageFormat::Jpeg);
    assert_eq!(processed.mime_type(), "image/jpeg");
    assert!(processed.data.len() < original_len);

    let meta = extract_metadata(&processed.data).unwrap();
    assert_eq!((meta.width, meta.height), (1280, 512));
}

#[test]
fn test_transparent_png_becomes_jpeg_on_white() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(400, 300, |x, y| {
        if x < 200 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([noise(x, y, 1), noise(x, y, 2), noise(x, y, 3), 255])
        }
    }));
    let png = encode(&img, ImageOutputFormat::Png);

    let processed = ImageProcessor::default().process(png, "sticker.png", true).unwrap();

    assert_eq!(processed.format, ImageFormat::Jpeg);
    assert_eq!(processed.mime_type(), "image/jpeg");

    let decoded = image::load_from_memory(&processed.data).unwrap().to_rgb8();
    let corner = decoded.get_pixel(10, 10);
    assert!(corner.0.iter().all(|&c| c >= 245), "expected white, got {:?}", corner);
}

#[test]
fn test_webp_is_stored_verbatim() {
    let webp = b"RIFF\x24\x00\x00\x00WEBPVP8X\x0a\x00\x00\x00\x00\x00\x00\x00\x3f\x00\x00\x1f\x00\x00".to_vec();

    let processed = ImageProcessor::default().process(webp.clone(), "photo.webp", true).unwrap();

    assert_eq!(processed.data, webp);
    assert_eq!(processed.format, ImageFormat::WebP);
    assert_eq!(processed.shrink, None);
}

#[test]
fn test_svg_is_stored_verbatim() {
    let svg = br#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#
        .to_vec();

    let processed = ImageProcessor::default().process(svg.clone(), "diagram.svg", true).unwrap();

    assert_eq!(processed.data, svg);
    assert_eq!(processed.format, ImageFormat::Svg);
    assert_eq!(processed.mime_type(), "image/svg+xml");
}

#[test]
fn test_second_pass_never_grows() {
    let png = encode(&noise_image(600, 400, 3), ImageOutputFormat::Png);
    let processor = ImageProcessor::default();

    let first = processor.process(png, "a.png", true).unwrap();
    let second = processor.process(first.data.clone(), "a.jpg", true).unwrap();

    assert!(second.data.len() <= first.data.len());
    assert_eq!(second.format, ImageFormat::Jpeg);
}

#[test]
fn test_missing_toolchain_degrades_to_resized_jpeg() {
    let programs = ToolchainPrograms {
        cjpeg: "notepix-missing-cjpeg".to_string(),
        pngquant: "notepix-missing-pngquant".to_string(),
        gifsicle: "notepix-missing-gifsicle".to_string(),
    };
    let processor = ImageProcessor::new(
        Arc::new(ToolchainOptimizer::with_programs(programs)),
        ResizeConfig::new(256).unwrap(),
        OptimizeConfig::default(),
    );
    let png = encode(&noise_image(512, 384, 11), ImageOutputFormat::Png);
    let expected = resize(&png, &ResizeConfig::new(256).unwrap()).unwrap();

    let processed = processor.process(png, "scan.png", true).unwrap();

    assert_eq!(processed.shrink, Some(ShrinkOutcome::Resized));
    assert_eq!(processed.data, expected);
    assert_eq!(processed.format, ImageFormat::Jpeg);
}

#[cfg(unix)]
#[test]
fn test_silent_optimizer_degrades_to_resized_jpeg() {
    // `true` exits successfully without writing anything.
    let programs = ToolchainPrograms {
        cjpeg: "true".to_string(),
        ..ToolchainPrograms::default()
    };
    let processor = ImageProcessor::new(
        Arc::new(ToolchainOptimizer::with_programs(programs)),
        ResizeConfig::new(200).unwrap(),
        OptimizeConfig::default(),
    );
    let png = encode(&noise_image(400, 300, 13), ImageOutputFormat::Png);
    let expected = resize(&png, &ResizeConfig::new(200).unwrap()).unwrap();

    let processed = processor.process(png, "x.png", true).unwrap();

    assert_eq!(processed.shrink, Some(ShrinkOutcome::Resized));
    assert_eq!(processed.data, expected);
    assert_eq!(processed.format, ImageFormat::Jpeg);
}

#[test]
fn test_garbage_is_rejected() {
    let result = ImageProcessor::default().process(vec![0u8; 64], "blob.bin", true);
    assert!(result.is_err());
}

fn output_format() -> impl Strategy<Value = ImageOutputFormat> {
    prop_oneof![
        Just(ImageOutputFormat::Png),
        Just(ImageOutputFormat::Gif),
        (30u8..=100).prop_map(ImageOutputFormat::Jpeg),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_output_never_larger_than_upload(
        width in 1u32..96,
        height in 1u32..96,
        seed in any::<u32>(),
        format in output_format(),
        max_dimension in 8u32..128,
    ) {
        let upload = encode(&noise_image(width, height, seed), format);
        let processed = processor(max_dimension).process(upload.clone(), "prop", true).unwrap();

        prop_assert!(processed.data.len() <= upload.len());
        if processed.shrink == Some(ShrinkOutcome::Original) {
            prop_assert_eq!(&processed.data, &upload);
        }
    }

    #[test]
    fn prop_reported_format_matches_bytes(
        width in 1u32..64,
        height in 1u32..64,
        seed in any::<u32>(),
        format in output_format(),
        shrink in any::<bool>(),
    ) {
        let upload = encode(&noise_image(width, height, seed), format);
        let processed = ImageProcessor::default().process(upload, "prop", shrink).unwrap();

        prop_assert_eq!(processed.format, detect_format(&processed.data).unwrap());
    }
}
